//! Configuration conversion utilities for CLI arguments

use crate::cli::main_impl::Cli;
use crate::config::RemoteConfig;
use anyhow::{Context, Result};

/// Convert CLI arguments to a `RemoteConfig`
pub(crate) struct CliConfigBuilder;

impl CliConfigBuilder {
    /// Build the configuration: config file (or defaults), then flags/environment
    pub(crate) fn from_cli(cli: &Cli) -> Result<RemoteConfig> {
        let mut config = match &cli.config {
            Some(path) => RemoteConfig::from_json_file(path)
                .with_context(|| format!("Failed to load config file {}", path.display()))?,
            None => RemoteConfig::default(),
        };

        if let Some(endpoint) = &cli.endpoint {
            config.endpoint.clone_from(endpoint);
        }
        if let Some(key) = &cli.api_key {
            config.api_key = Some(key.clone());
        }
        if let Some(dir) = &cli.output_dir {
            config.download_dir.clone_from(dir);
        }
        if let Some(name) = &cli.output_name {
            config.download_file_name.clone_from(name);
        }
        if let Some(timeout) = cli.timeout {
            config.timeout_secs = Some(timeout);
        }

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}
