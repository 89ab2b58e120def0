//! HTTP client for remove.bg compatible endpoints

use crate::{
    config::RemoteConfig,
    error::{BgRemovalError, RemoteServiceError, Result},
    remote::BackgroundRemover,
    types::{ProcessedImage, UploadPayload},
};
use async_trait::async_trait;
use reqwest::{
    header::CONTENT_TYPE,
    multipart::{Form, Part},
    Client,
};
use tracing::{debug, instrument, warn};

/// Client posting images to a background-removal endpoint
///
/// The request is a multipart form with a single binary field; the API key,
/// when configured, travels in its own header. Without a key the client
/// expects the endpoint to be a proxy that adds the credential itself.
#[derive(Debug)]
pub struct RemoveBgClient {
    client: Client,
    config: RemoteConfig,
}

impl RemoveBgClient {
    /// Create a new client
    ///
    /// # Errors
    /// - Configuration validation failures
    /// - Failed to create HTTP client
    pub fn new(config: RemoteConfig) -> Result<Self> {
        config.validate()?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| {
            BgRemovalError::internal(format!("Failed to create HTTP client: {}", e))
        })?;

        if config.api_key.is_none() {
            warn!(
                endpoint = %config.endpoint,
                "No API key configured; requests rely on the endpoint injecting credentials"
            );
        }

        Ok(Self { client, config })
    }

    /// Configuration this client was built with
    #[must_use]
    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    fn build_form(&self, payload: UploadPayload) -> Result<Form> {
        let part = Part::bytes(payload.bytes.to_vec())
            .file_name(payload.file_name)
            .mime_str(&payload.mime_type)
            .map_err(|e| {
                BgRemovalError::invalid_config(format!(
                    "Invalid upload MIME type '{}': {}",
                    payload.mime_type, e
                ))
            })?;
        Ok(Form::new().part(self.config.form_field.clone(), part))
    }
}

#[async_trait]
impl BackgroundRemover for RemoveBgClient {
    #[instrument(skip_all, fields(bytes = payload.bytes.len()))]
    async fn remove_background(&self, payload: UploadPayload) -> Result<ProcessedImage> {
        debug!(endpoint = %self.config.endpoint, "Submitting image for background removal");
        let form = self.build_form(payload)?;

        let mut request = self.client.post(&self.config.endpoint).multipart(form);
        if let Some(key) = &self.config.api_key {
            request = request.header(self.config.api_key_header.as_str(), key.as_str());
        }

        let response = request.send().await.map_err(|e| {
            warn!(error = %e, "Request to background-removal service failed");
            BgRemovalError::remote_transport(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Background-removal service rejected the request");
            return Err(BgRemovalError::remote_status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let body = response
            .bytes()
            .await
            .map_err(|e| RemoteServiceError::Body(e.to_string()))?;
        debug!(bytes = body.len(), content_type = ?content_type, "Received processed image");

        Ok(ProcessedImage::new(body.to_vec(), content_type))
    }

    fn name(&self) -> &str {
        "remove.bg"
    }
}
