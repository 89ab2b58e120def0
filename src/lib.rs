#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]

//! # Remote Background Removal Widget
//!
//! The controller behind a "remove background" widget: the user selects an
//! image, the widget sends it to a remove.bg compatible REST API, and the
//! returned cut-out can be previewed and downloaded.
//!
//! ## Features
//!
//! - **Explicit state machine**: `WidgetState` carries exactly the data valid in
//!   each stage (`Empty`, `Ready`, `Processing`, `Done`, `Failed`)
//! - **Single outstanding call**: triggering while a call is in flight is a no-op
//! - **Pluggable service**: anything implementing [`BackgroundRemover`]; the
//!   default [`RemoveBgClient`] posts multipart forms with `reqwest`
//! - **No embedded credentials**: the API key comes from configuration or the
//!   environment, or is omitted entirely when the endpoint is a proxy that
//!   holds it server-side
//! - **CLI Integration**: optional command-line frontend (enable with `cli` feature)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bgremove_remote::{
//!     ImageIOService, ProcessingOutcome, RemoteConfig, RemoveBgClient, WidgetController,
//! };
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = RemoteConfig::from_env()?;
//! let client = RemoveBgClient::new(config.clone())?;
//! let widget = WidgetController::new(client, config);
//!
//! widget.select_file(ImageIOService::load_source("portrait.jpg")?);
//! if widget.trigger_processing().await == ProcessingOutcome::Completed {
//!     let saved = widget.download_result()?;
//!     println!("saved to {:?}", saved);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Sharing the controller
//!
//! Every action takes `&self`, so a UI can keep handling input while a call is
//! outstanding:
//!
//! ```rust,no_run
//! use bgremove_remote::{MockRemover, RemoteConfig, SourceImage, WidgetController};
//! use std::sync::Arc;
//!
//! # async fn example() {
//! let widget = Arc::new(WidgetController::new(
//!     MockRemover::succeeding(vec![1, 2, 3]),
//!     RemoteConfig::default(),
//! ));
//! widget.select_file(SourceImage::new(vec![0u8; 8], "photo.png"));
//!
//! let worker = Arc::clone(&widget);
//! let pending = tokio::spawn(async move { worker.trigger_processing().await });
//! println!("{:?}", widget.view());
//! pending.await.unwrap();
//! # }
//! ```

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod controller;
pub mod error;
pub mod remote;
pub mod services;
pub mod state;
#[cfg(feature = "cli")]
pub mod tracing_config;
pub mod types;

// Public API exports
pub use config::{RemoteConfig, RemoteConfigBuilder, DEFAULT_ENDPOINT};
pub use controller::{ProcessingOutcome, SkipReason, WidgetController};
pub use error::{BgRemovalError, RemoteServiceError, Result};
pub use remote::{BackgroundRemover, MockRemover, MockResponse, RemoveBgClient};
pub use services::{
    ConsoleNotifier, ConsoleProgressReporter, ImageIOService, NoOpNotifier, NoOpProgressReporter,
    Notification, NotificationLevel, Notifier, ProcessingStage, ProgressReporter,
    RecordingNotifier,
};
pub use state::{ProcessingStatus, WidgetState, WidgetView};
pub use types::{is_accepted_image, ProcessedImage, SourceImage, UploadPayload, ACCEPTED_MIME};

#[cfg(feature = "cli")]
pub use tracing_config::{init_cli_tracing, TracingConfig, TracingFormat};

/// Remove the background of an image file in one call
///
/// Runs a whole widget session (select, trigger, download) with `config` and
/// returns the path of the saved result.
///
/// # Errors
/// - The input cannot be read
/// - The remote call fails
/// - The result cannot be saved
pub async fn remove_background_from_file<P: AsRef<std::path::Path>>(
    path: P,
    config: RemoteConfig,
) -> Result<std::path::PathBuf> {
    let client = RemoveBgClient::new(config.clone())?;
    let widget = WidgetController::new(client, config);
    widget.select_path(path).await?;

    match widget.trigger_processing().await {
        ProcessingOutcome::Completed => widget
            .download_result()?
            .ok_or_else(|| BgRemovalError::internal("Completed run left no result")),
        ProcessingOutcome::Failed => Err(match widget.remote_error() {
            Some(remote) => BgRemovalError::RemoteService(remote),
            None => BgRemovalError::processing(
                widget
                    .failure_reason()
                    .unwrap_or_else(|| "background removal failed".to_string()),
            ),
        }),
        other => Err(BgRemovalError::internal(format!(
            "Unexpected processing outcome: {:?}",
            other
        ))),
    }
}
