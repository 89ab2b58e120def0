//! Remote Background Removal CLI Tool
//!
//! Drives one widget session from the command line.

use super::config::CliConfigBuilder;
use crate::{
    config::RemoteConfig,
    controller::{ProcessingOutcome, WidgetController},
    remote::RemoveBgClient,
    services::{create_cli_progress_reporter, ConsoleNotifier},
    tracing_config::{init_cli_tracing, spans, TracingFormat},
};
use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use std::path::{Path, PathBuf};
use tracing::Instrument;

/// Remove image backgrounds through a remote background-removal API
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "bgremove-remote")]
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// Input image file
    #[arg(value_name = "INPUT", required_unless_present = "show_config")]
    pub input: Option<PathBuf>,

    /// Directory receiving the result [default: user download directory]
    #[arg(short, long, value_name = "DIR", env = "BGREMOVE_DOWNLOAD_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Background-removal endpoint (a credential-injecting proxy works too)
    #[arg(long, value_name = "URL", env = "BGREMOVE_ENDPOINT")]
    pub endpoint: Option<String>,

    /// API key sent in the key header
    #[arg(long, value_name = "KEY", env = "BGREMOVE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// JSON configuration file; flags and environment override its values
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Request timeout in seconds [default: none]
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// File name of the saved result
    #[arg(long, value_name = "NAME")]
    pub output_name: Option<String>,

    /// Enable verbose logging (-v: DEBUG, -vv: TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Show a spinner instead of progress log lines
    #[arg(long)]
    pub progress: bool,

    /// Plain log output without colors
    #[arg(long)]
    pub compact_logs: bool,

    /// Emit logs as JSON lines
    #[cfg(feature = "tracing-json")]
    #[arg(long, conflicts_with = "compact_logs")]
    pub json_logs: bool,

    /// Print the effective configuration (API key redacted) and exit
    #[arg(long)]
    pub show_config: bool,
}

impl Cli {
    /// Log format selected by the flags
    #[must_use]
    pub fn tracing_format(&self) -> TracingFormat {
        #[cfg(feature = "tracing-json")]
        {
            if self.json_logs {
                return TracingFormat::Json;
            }
        }
        if self.compact_logs {
            TracingFormat::Compact
        } else {
            TracingFormat::Console
        }
    }
}

pub async fn main() -> Result<()> {
    let cli = Cli::parse();

    let session_id = init_cli_tracing(cli.verbose, cli.tracing_format())
        .context("Failed to initialize tracing")?;

    let config = CliConfigBuilder::from_cli(&cli).context("Failed to build configuration")?;

    if cli.show_config {
        return show_config(&config);
    }

    let input = cli
        .input
        .clone()
        .context("An input image is required")?;

    let span = spans::session(&session_id, &config.endpoint);
    run_session(&cli, &input, config).instrument(span).await
}

async fn run_session(cli: &Cli, input: &Path, config: RemoteConfig) -> Result<()> {
    info!("Starting background removal for {}", input.display());

    let client = RemoveBgClient::new(config.clone()).context("Failed to create API client")?;
    let controller = WidgetController::new(client, config)
        .with_notifier(ConsoleNotifier)
        .with_progress_reporter(create_cli_progress_reporter(cli.progress, cli.verbose > 0));

    controller
        .select_path(input)
        .instrument(spans::file_processing(input))
        .await
        .context("Failed to read input image")?;

    if let Some(source) = controller.source() {
        match source.preview() {
            Ok(preview) => info!("Input: {}x{} {}", preview.width(), preview.height(), source.mime_type()),
            Err(e) => warn!("Preview unavailable for {}: {}", input.display(), e),
        }
    }

    match controller.trigger_processing().await {
        ProcessingOutcome::Completed => {},
        ProcessingOutcome::Failed => {
            let reason = controller
                .failure_reason()
                .unwrap_or_else(|| "unknown error".to_string());
            anyhow::bail!("Background removal failed: {}", reason);
        },
        other => anyhow::bail!("Background removal did not run: {:?}", other),
    }

    if let Some(processed) = controller.processed() {
        match processed.preview() {
            Ok(preview) => info!("Result: {}x{}", preview.width(), preview.height()),
            Err(e) => warn!("Result preview unavailable: {}", e),
        }
    }

    let saved = controller
        .download_result()
        .context("Failed to save result")?
        .context("No processed image to save")?;
    println!("{}", saved.display());
    Ok(())
}

fn show_config(config: &RemoteConfig) -> Result<()> {
    let mut shown = config.clone();
    if shown.api_key.is_some() {
        shown.api_key = Some("<redacted>".to_string());
    }
    println!(
        "{}",
        serde_json::to_string_pretty(&shown).context("Failed to render configuration")?
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_flags() {
        let cli = Cli::try_parse_from([
            "bgremove-remote",
            "photo.jpg",
            "--endpoint",
            "http://localhost:9000/removebg",
            "--timeout",
            "20",
            "-vv",
            "--progress",
        ])
        .unwrap();
        assert_eq!(cli.input, Some(PathBuf::from("photo.jpg")));
        assert_eq!(cli.endpoint.as_deref(), Some("http://localhost:9000/removebg"));
        assert_eq!(cli.timeout, Some(20));
        assert_eq!(cli.verbose, 2);
        assert!(cli.progress);
    }

    #[test]
    fn test_log_format_flags() {
        let cli = Cli::try_parse_from(["bgremove-remote", "a.png"]).unwrap();
        assert_eq!(cli.tracing_format(), TracingFormat::Console);

        let cli = Cli::try_parse_from(["bgremove-remote", "a.png", "--compact-logs"]).unwrap();
        assert_eq!(cli.tracing_format(), TracingFormat::Compact);
    }

    #[cfg(feature = "tracing-json")]
    #[test]
    fn test_json_logs_flag() {
        let cli = Cli::try_parse_from(["bgremove-remote", "a.png", "--json-logs"]).unwrap();
        assert_eq!(cli.tracing_format(), TracingFormat::Json);

        assert!(Cli::try_parse_from([
            "bgremove-remote",
            "a.png",
            "--json-logs",
            "--compact-logs"
        ])
        .is_err());
    }

    #[test]
    fn test_show_config_needs_no_input() {
        let cli = Cli::try_parse_from(["bgremove-remote", "--show-config"]).unwrap();
        assert!(cli.input.is_none());
        assert!(cli.show_config);
    }
}
