//! Widget controller
//!
//! `WidgetController` owns the widget state and runs the
//! select → submit → receive → display/download workflow against any
//! [`BackgroundRemover`]. It is used by every frontend (the CLI, GUIs, web
//! handlers) so they share the same state transitions.
//!
//! All actions take `&self`. State sits behind a mutex that is never held
//! across the remote call, so the controller can be shared through an `Arc`
//! between the task awaiting a call and the task handling user input.

use crate::{
    config::RemoteConfig,
    error::{BgRemovalError, RemoteServiceError, Result},
    remote::BackgroundRemover,
    services::{
        ImageIOService, NoOpNotifier, NoOpProgressReporter, Notification, Notifier,
        ProcessingStage, ProcessingTimings, ProgressReporter, ProgressTracker,
        PROCESSING_FAILED_MESSAGE,
    },
    state::{ProcessingStatus, WidgetState, WidgetView},
    types::{ProcessedImage, SourceImage},
};
use instant::Instant;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, info, instrument, warn};

/// Why a trigger did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No source image selected
    NoSource,
    /// A remote call is already outstanding
    AlreadyProcessing,
}

/// What a call to [`WidgetController::trigger_processing`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingOutcome {
    /// No remote call was issued
    Skipped(SkipReason),
    /// The result was stored; status is Done
    Completed,
    /// The call failed and the user was notified; status is Failed
    Failed,
    /// A new file was selected while the call was outstanding; its result was dropped
    Superseded,
}

#[derive(Debug, Default)]
struct Inner {
    state: WidgetState,
    /// Bumped on every selection so late results can be recognised
    selection: u64,
    call_outstanding: bool,
}

fn lock_inner(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    // State is replaced wholesale under the lock, so a poisoned guard still
    // holds a consistent value.
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Marks a remote call as outstanding for as long as it lives
///
/// Dropping it before [`OutstandingCall::finish`] means the awaiting future
/// was cancelled: the flag is cleared and a still-current `Processing` state
/// falls back to `Ready`, so the widget can be triggered again.
struct OutstandingCall<'a> {
    inner: &'a Mutex<Inner>,
    selection: u64,
    armed: bool,
}

impl<'a> OutstandingCall<'a> {
    fn start(inner: &'a Mutex<Inner>, guard: &mut Inner) -> Self {
        guard.call_outstanding = true;
        Self {
            inner,
            selection: guard.selection,
            armed: true,
        }
    }

    /// The call resolved; hand back the locked state with the flag cleared
    fn finish(mut self) -> MutexGuard<'a, Inner> {
        self.armed = false;
        let mut guard = lock_inner(self.inner);
        guard.call_outstanding = false;
        guard
    }
}

impl Drop for OutstandingCall<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut guard = lock_inner(self.inner);
        guard.call_outstanding = false;
        if guard.selection == self.selection {
            guard.state = match std::mem::take(&mut guard.state) {
                WidgetState::Processing { source } => WidgetState::Ready { source },
                other => other,
            };
        }
        warn!("Remote call abandoned before it resolved");
    }
}

/// Controller for the background-removal widget
pub struct WidgetController<R> {
    remover: R,
    config: RemoteConfig,
    notifier: Box<dyn Notifier>,
    progress: Box<dyn ProgressReporter>,
    inner: Mutex<Inner>,
}

impl<R: BackgroundRemover> WidgetController<R> {
    /// Create a controller with silent notifications and progress
    #[must_use]
    pub fn new(remover: R, config: RemoteConfig) -> Self {
        Self {
            remover,
            config,
            notifier: Box::new(NoOpNotifier),
            progress: Box::new(NoOpProgressReporter),
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Route user-visible notifications to `notifier`
    #[must_use]
    pub fn with_notifier<N: Notifier + 'static>(mut self, notifier: N) -> Self {
        self.notifier = Box::new(notifier);
        self
    }

    /// Route progress updates to `reporter`
    #[must_use]
    pub fn with_progress_reporter(mut self, reporter: Box<dyn ProgressReporter>) -> Self {
        self.progress = reporter;
        self
    }

    #[must_use]
    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    #[must_use]
    pub fn remover(&self) -> &R {
        &self.remover
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        lock_inner(&self.inner)
    }

    /// Select a new source image
    ///
    /// Replaces any previous source and clears any result or failure,
    /// whatever the current status.
    #[instrument(skip_all, fields(file = %source.file_name(), bytes = source.len()))]
    pub fn select_file(&self, source: SourceImage) {
        let mut inner = self.lock();
        inner.selection = inner.selection.wrapping_add(1);
        if inner.call_outstanding {
            debug!("Selection replaces the image of an outstanding call");
        }
        inner.state = WidgetState::Ready { source };
        info!("Image selected");
    }

    /// Read a file from disk and select it
    ///
    /// On error the current state is left untouched.
    ///
    /// # Errors
    /// - The file does not exist or cannot be read
    pub async fn select_path<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let mut tracker = ProgressTracker::new(self.progress.as_ref());
        tracker.report_stage_with_description(
            ProcessingStage::ImageLoading,
            format!("Loading {}", path.display()),
        );
        let source = ImageIOService::load_source_async(path).await.map_err(|e| {
            tracker.report_error(&e.to_string());
            e
        })?;
        self.select_file(source);
        Ok(())
    }

    /// Drop the source and any result
    pub fn reset(&self) {
        let mut inner = self.lock();
        inner.selection = inner.selection.wrapping_add(1);
        inner.state = WidgetState::Empty;
        debug!("Widget reset");
    }

    /// Submit the selected image to the remote service and wait for it
    ///
    /// Does nothing without a source or while another call is outstanding.
    /// Failures never escape: they set the Failed status and raise exactly one
    /// user notification, keeping the source for a retry.
    #[instrument(skip_all, fields(remover = self.remover.name()))]
    pub async fn trigger_processing(&self) -> ProcessingOutcome {
        let (source, call) = {
            let mut inner = self.lock();
            if inner.call_outstanding {
                debug!("Trigger ignored: a call is already outstanding");
                return ProcessingOutcome::Skipped(SkipReason::AlreadyProcessing);
            }
            let Some(source) = inner.state.source().cloned() else {
                debug!("Trigger ignored: no image selected");
                return ProcessingOutcome::Skipped(SkipReason::NoSource);
            };
            inner.state = WidgetState::Processing {
                source: source.clone(),
            };
            (source, OutstandingCall::start(&self.inner, &mut inner))
        };
        let selection = call.selection;

        let mut tracker = ProgressTracker::new(self.progress.as_ref());
        tracker.report_stage(ProcessingStage::PayloadPreparation);
        let payload = source.to_payload(&self.config.upload_file_name, &self.config.upload_mime_type);
        let payload_ms = tracker.elapsed_ms();

        tracker.report_stage_with_description(
            ProcessingStage::RemoteProcessing,
            format!("Removing background ({} bytes)", payload.bytes.len()),
        );
        let remote_start = Instant::now();
        let result = self.remover.remove_background(payload).await;
        let remote_ms = remote_start.elapsed().as_millis() as u64;

        let mut inner = call.finish();
        if inner.selection != selection {
            info!("Discarding result for a replaced image");
            return ProcessingOutcome::Superseded;
        }

        match result {
            Ok(processed) => {
                tracker.report_stage(ProcessingStage::ResultStorage);
                info!(bytes = processed.len(), remote_ms, "Background removed");
                inner.state = WidgetState::Done { source, processed };
                drop(inner);

                tracker.report_completion(ProcessingTimings {
                    payload_ms,
                    remote_ms,
                    total_ms: tracker.elapsed_ms(),
                });
                ProcessingOutcome::Completed
            },
            Err(e) => {
                error!(error = %e, remote_ms, "Error processing image");
                let remote = match &e {
                    BgRemovalError::RemoteService(remote) => Some(remote.clone()),
                    _ => None,
                };
                inner.state = WidgetState::Failed {
                    source,
                    reason: e.to_string(),
                    remote,
                };
                drop(inner);

                tracker.report_error(&e.to_string());
                self.notifier
                    .notify(Notification::error(PROCESSING_FAILED_MESSAGE));
                ProcessingOutcome::Failed
            },
        }
    }

    /// Save the processed image under the configured fixed file name
    ///
    /// Returns `Ok(None)` without touching the file system when there is no
    /// result.
    ///
    /// # Errors
    /// - The download directory or file cannot be written
    pub fn download_result(&self) -> Result<Option<PathBuf>> {
        let Some(processed) = self.processed() else {
            debug!("Download ignored: no processed image");
            return Ok(None);
        };

        let mut tracker = ProgressTracker::new(self.progress.as_ref());
        tracker.report_stage(ProcessingStage::FileSaving);
        let path = ImageIOService::save_result(
            &processed,
            &self.config.download_dir,
            &self.config.download_file_name,
        )
        .map_err(|e| {
            tracker.report_error(&e.to_string());
            e
        })?;
        tracker.report_stage(ProcessingStage::Completed);

        info!(path = %path.display(), "Result downloaded");
        Ok(Some(path))
    }

    #[must_use]
    pub fn status(&self) -> ProcessingStatus {
        self.lock().state.status()
    }

    /// Snapshot of the full state
    #[must_use]
    pub fn state(&self) -> WidgetState {
        self.lock().state.clone()
    }

    #[must_use]
    pub fn source(&self) -> Option<SourceImage> {
        self.lock().state.source().cloned()
    }

    #[must_use]
    pub fn processed(&self) -> Option<ProcessedImage> {
        self.lock().state.processed().cloned()
    }

    /// Diagnostic reason of the last failure, cleared by the next selection
    #[must_use]
    pub fn failure_reason(&self) -> Option<String> {
        self.lock().state.failure_reason().map(str::to_string)
    }

    /// Typed remote failure behind the Failed status, if the remote service caused it
    #[must_use]
    pub fn remote_error(&self) -> Option<RemoteServiceError> {
        self.lock().state.remote_error().cloned()
    }

    /// Whether a remote call is outstanding
    #[must_use]
    pub fn is_call_outstanding(&self) -> bool {
        self.lock().call_outstanding
    }

    /// What a frontend should render right now
    #[must_use]
    pub fn view(&self) -> WidgetView {
        let inner = self.lock();
        WidgetView::from_state(&inner.state, inner.call_outstanding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::{MockRemover, MockResponse};
    use crate::services::{ProgressUpdate, RecordingNotifier};
    use std::sync::Arc;

    fn config() -> RemoteConfig {
        RemoteConfig::builder()
            .endpoint("http://localhost/removebg")
            .download_dir(std::env::temp_dir().join("bgremove-remote-unit"))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_payload_uses_configured_upload_labels() {
        let mock = MockRemover::succeeding(vec![5]);
        let controller = WidgetController::new(mock.clone(), config());
        controller.select_file(SourceImage::new(vec![1, 2], "holiday.jpg"));

        assert_eq!(
            controller.trigger_processing().await,
            ProcessingOutcome::Completed
        );
        let calls = mock.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].file_name, "image.png");
        assert_eq!(calls[0].mime_type, "image/png");
        assert_eq!(&*calls[0].bytes, &[1, 2]);
    }

    #[tokio::test]
    async fn test_failure_reason_kept_for_diagnostics() {
        let notifier = RecordingNotifier::new();
        let controller = WidgetController::new(
            MockRemover::new(MockResponse::Transport("connection refused".into())),
            config(),
        )
        .with_notifier(notifier.clone());
        controller.select_file(SourceImage::new(vec![1], "a.png"));

        assert_eq!(controller.trigger_processing().await, ProcessingOutcome::Failed);
        assert!(controller
            .failure_reason()
            .unwrap()
            .contains("connection refused"));
        assert_eq!(
            notifier.notifications()[0].message,
            PROCESSING_FAILED_MESSAGE
        );
    }

    #[derive(Default, Clone)]
    struct StageLog {
        stages: Arc<Mutex<Vec<ProcessingStage>>>,
        errors: Arc<Mutex<Vec<ProcessingStage>>>,
    }

    impl ProgressReporter for StageLog {
        fn report_progress(&self, update: ProgressUpdate) {
            self.stages.lock().unwrap().push(update.stage);
        }

        fn report_completion(&self, _timings: ProcessingTimings) {}

        fn report_error(&self, stage: ProcessingStage, _error: &str) {
            self.errors.lock().unwrap().push(stage);
        }
    }

    #[tokio::test]
    async fn test_select_path_reports_loading() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.png");
        std::fs::write(&path, [1, 2, 3]).unwrap();

        let log = StageLog::default();
        let controller = WidgetController::new(MockRemover::succeeding(vec![1]), config())
            .with_progress_reporter(Box::new(log.clone()));

        controller.select_path(&path).await.unwrap();
        assert_eq!(controller.source().unwrap().file_name(), "photo.png");
        assert_eq!(*log.stages.lock().unwrap(), vec![ProcessingStage::ImageLoading]);

        assert!(controller.select_path(dir.path().join("missing.png")).await.is_err());
        assert_eq!(*log.errors.lock().unwrap(), vec![ProcessingStage::ImageLoading]);
        assert_eq!(controller.source().unwrap().file_name(), "photo.png");
    }

    #[tokio::test]
    async fn test_remote_failure_kept_typed() {
        let controller = WidgetController::new(MockRemover::failing(429), config());
        controller.select_file(SourceImage::new(vec![1], "a.png"));
        controller.trigger_processing().await;
        assert_eq!(
            controller.remote_error(),
            Some(RemoteServiceError::Status { status: 429 })
        );

        controller.select_file(SourceImage::new(vec![2], "b.png"));
        assert!(controller.remote_error().is_none());
    }

    #[tokio::test]
    async fn test_reset_clears_everything() {
        let controller = WidgetController::new(MockRemover::succeeding(vec![1]), config());
        controller.select_file(SourceImage::new(vec![1], "a.png"));
        controller.trigger_processing().await;
        assert!(controller.processed().is_some());

        controller.reset();
        assert_eq!(controller.state(), WidgetState::Empty);
        assert_eq!(
            controller.trigger_processing().await,
            ProcessingOutcome::Skipped(SkipReason::NoSource)
        );
    }
}
