//! Configuration types for the remote background-removal call

use crate::error::{BgRemovalError, Result};
use reqwest::header::{HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default remove.bg endpoint
pub const DEFAULT_ENDPOINT: &str = "https://api.remove.bg/v1.0/removebg";

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "BGREMOVE_API_KEY";

/// Environment variable overriding the endpoint
pub const ENDPOINT_ENV: &str = "BGREMOVE_ENDPOINT";

/// Environment variable overriding the download directory
pub const DOWNLOAD_DIR_ENV: &str = "BGREMOVE_DOWNLOAD_DIR";

/// Configuration for the widget and its remote service
///
/// The API key is only ever supplied at runtime. Leaving it unset makes the
/// client omit the key header, which is how the widget talks to a proxy that
/// holds the credential server-side.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Endpoint receiving the multipart POST
    pub endpoint: String,
    /// Static API credential
    pub api_key: Option<String>,
    /// Header carrying the API key
    pub api_key_header: String,
    /// Multipart field carrying the image
    pub form_field: String,
    /// File name attached to the uploaded part
    pub upload_file_name: String,
    /// MIME type attached to the uploaded part
    pub upload_mime_type: String,
    /// Request timeout in seconds (None = transport default)
    pub timeout_secs: Option<u64>,
    /// Directory receiving downloaded results
    pub download_dir: PathBuf,
    /// Fixed file name for downloaded results
    pub download_file_name: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: None,
            api_key_header: "X-Api-Key".to_string(),
            form_field: "image_file".to_string(),
            upload_file_name: "image.png".to_string(),
            upload_mime_type: "image/png".to_string(),
            timeout_secs: None,
            download_dir: default_download_dir(),
            download_file_name: "removed-background.png".to_string(),
        }
    }
}

// Keeps the key out of logs.
impl std::fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_key_header", &self.api_key_header)
            .field("form_field", &self.form_field)
            .field("upload_file_name", &self.upload_file_name)
            .field("upload_mime_type", &self.upload_mime_type)
            .field("timeout_secs", &self.timeout_secs)
            .field("download_dir", &self.download_dir)
            .field("download_file_name", &self.download_file_name)
            .finish()
    }
}

fn default_download_dir() -> PathBuf {
    dirs::download_dir().unwrap_or_else(|| PathBuf::from("."))
}

impl RemoteConfig {
    /// Create a new configuration builder
    #[must_use]
    pub fn builder() -> RemoteConfigBuilder {
        RemoteConfigBuilder::default()
    }

    /// Build a configuration from the process environment
    ///
    /// Reads `BGREMOVE_API_KEY`, `BGREMOVE_ENDPOINT` and
    /// `BGREMOVE_DOWNLOAD_DIR`; unset variables keep their defaults.
    ///
    /// # Errors
    /// - The resulting configuration fails validation
    pub fn from_env() -> Result<Self> {
        let mut builder = Self::builder();
        if let Some(key) = non_empty_env(API_KEY_ENV) {
            builder = builder.api_key(key);
        }
        if let Some(endpoint) = non_empty_env(ENDPOINT_ENV) {
            builder = builder.endpoint(endpoint);
        }
        if let Some(dir) = non_empty_env(DOWNLOAD_DIR_ENV) {
            builder = builder.download_dir(dir);
        }
        builder.build()
    }

    /// Load a configuration from a JSON file
    ///
    /// Missing fields take their defaults.
    ///
    /// # Errors
    /// - The file cannot be read
    /// - The file is not valid JSON for this structure
    /// - The resulting configuration fails validation
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| BgRemovalError::file_io_error("read config file", path, &e))?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            BgRemovalError::invalid_config(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Request timeout, if one is configured
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Full path a downloaded result is written to
    #[must_use]
    pub fn download_path(&self) -> PathBuf {
        self.download_dir.join(&self.download_file_name)
    }

    /// Validate configuration parameters
    ///
    /// # Errors
    /// - Endpoint is not an http(s) URL
    /// - Any header, field, or file name is empty
    /// - Timeout is zero
    pub fn validate(&self) -> Result<()> {
        let endpoint = self.endpoint.trim();
        if !(endpoint.starts_with("https://") || endpoint.starts_with("http://")) {
            return Err(BgRemovalError::config_value_error(
                "endpoint",
                &self.endpoint,
                "an http:// or https:// URL",
            ));
        }

        let required = [
            ("API key header", &self.api_key_header),
            ("form field", &self.form_field),
            ("upload file name", &self.upload_file_name),
            ("upload MIME type", &self.upload_mime_type),
            ("download file name", &self.download_file_name),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(BgRemovalError::invalid_config(format!(
                    "{} must not be empty",
                    name
                )));
            }
        }

        if Path::new(&self.download_file_name).components().count() != 1 {
            return Err(BgRemovalError::config_value_error(
                "download file name",
                &self.download_file_name,
                "a bare file name without directories",
            ));
        }

        if self.timeout_secs == Some(0) {
            return Err(BgRemovalError::config_value_error(
                "timeout",
                0,
                "at least 1 second",
            ));
        }

        if matches!(&self.api_key, Some(key) if key.trim().is_empty()) {
            return Err(BgRemovalError::invalid_config(
                "API key is set but empty; unset it to use a credential-injecting proxy",
            ));
        }

        // Checked here so a bad value fails at startup instead of on every call.
        if reqwest::multipart::Part::bytes(Vec::new())
            .mime_str(&self.upload_mime_type)
            .is_err()
        {
            return Err(BgRemovalError::config_value_error(
                "upload MIME type",
                &self.upload_mime_type,
                "a type/subtype MIME string",
            ));
        }
        if HeaderName::from_bytes(self.api_key_header.as_bytes()).is_err() {
            return Err(BgRemovalError::config_value_error(
                "API key header",
                &self.api_key_header,
                "a valid HTTP header name",
            ));
        }
        if let Some(key) = &self.api_key {
            if HeaderValue::from_str(key).is_err() {
                return Err(BgRemovalError::invalid_config(
                    "API key contains characters not allowed in an HTTP header",
                ));
            }
        }

        Ok(())
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Builder for `RemoteConfig`
#[derive(Debug, Default)]
pub struct RemoteConfigBuilder {
    config: RemoteConfig,
}

impl RemoteConfigBuilder {
    /// Set the endpoint URL
    #[must_use]
    pub fn endpoint<S: Into<String>>(mut self, endpoint: S) -> Self {
        self.config.endpoint = endpoint.into();
        self
    }

    /// Set the API key
    #[must_use]
    pub fn api_key<S: Into<String>>(mut self, key: S) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    /// Remove any API key (proxy mode)
    #[must_use]
    pub fn without_api_key(mut self) -> Self {
        self.config.api_key = None;
        self
    }

    /// Set the header carrying the API key
    #[must_use]
    pub fn api_key_header<S: Into<String>>(mut self, header: S) -> Self {
        self.config.api_key_header = header.into();
        self
    }

    /// Set the multipart field name
    #[must_use]
    pub fn form_field<S: Into<String>>(mut self, field: S) -> Self {
        self.config.form_field = field.into();
        self
    }

    /// Set the request timeout in seconds
    #[must_use]
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = Some(secs);
        self
    }

    /// Set the download directory
    #[must_use]
    pub fn download_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.config.download_dir = dir.into();
        self
    }

    /// Set the download file name
    #[must_use]
    pub fn download_file_name<S: Into<String>>(mut self, name: S) -> Self {
        self.config.download_file_name = name.into();
        self
    }

    /// Build the configuration
    ///
    /// # Errors
    /// - Configuration validation failures
    pub fn build(self) -> Result<RemoteConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
