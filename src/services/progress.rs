//! Progress reporting service
//!
//! This module separates progress reporting concerns from the widget workflow,
//! allowing different frontends to implement their own progress handling.

use instant::Instant;

/// Progress stages of one select → process → download cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStage {
    /// Reading the selected file into memory
    ImageLoading,
    /// Deriving the upload payload from the source image
    PayloadPreparation,
    /// Waiting for the remote service
    RemoteProcessing,
    /// Storing the returned image
    ResultStorage,
    /// Writing the result to disk
    FileSaving,
    /// Processing completed
    Completed,
}

impl ProcessingStage {
    /// Get a human-readable description of the processing stage
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            ProcessingStage::ImageLoading => "Loading input image",
            ProcessingStage::PayloadPreparation => "Preparing upload",
            ProcessingStage::RemoteProcessing => "Removing background",
            ProcessingStage::ResultStorage => "Storing result",
            ProcessingStage::FileSaving => "Saving result",
            ProcessingStage::Completed => "Processing completed",
        }
    }

    /// Get the typical progress percentage for this stage
    #[must_use]
    pub fn progress_percentage(&self) -> u8 {
        match self {
            ProcessingStage::ImageLoading => 5,
            ProcessingStage::PayloadPreparation => 10,
            ProcessingStage::RemoteProcessing => 20,
            ProcessingStage::ResultStorage => 90,
            ProcessingStage::FileSaving => 95,
            ProcessingStage::Completed => 100,
        }
    }
}

/// Progress update containing stage and timing information
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    /// Current processing stage
    pub stage: ProcessingStage,
    /// Progress percentage (0-100)
    pub progress: u8,
    /// Human-readable stage description
    pub description: String,
    /// Elapsed time since processing started (milliseconds)
    pub elapsed_ms: u64,
}

impl ProgressUpdate {
    /// Create a new progress update
    #[must_use]
    pub fn new(stage: ProcessingStage, start_time: Instant) -> Self {
        Self {
            progress: stage.progress_percentage(),
            description: stage.description().to_string(),
            elapsed_ms: start_time.elapsed().as_millis() as u64,
            stage,
        }
    }

    /// Create a progress update with custom description
    #[must_use]
    pub fn with_description(
        stage: ProcessingStage,
        description: String,
        start_time: Instant,
    ) -> Self {
        Self {
            progress: stage.progress_percentage(),
            elapsed_ms: start_time.elapsed().as_millis() as u64,
            stage,
            description,
        }
    }
}

/// Timing breakdown of one processing run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessingTimings {
    /// Time spent deriving the upload payload
    pub payload_ms: u64,
    /// Time spent waiting for the remote service
    pub remote_ms: u64,
    /// Total time of the run
    pub total_ms: u64,
}

/// Trait for reporting progress during a processing run
pub trait ProgressReporter: Send + Sync {
    /// Report a progress update
    fn report_progress(&self, update: ProgressUpdate);

    /// Report processing completion with final timings
    fn report_completion(&self, timings: ProcessingTimings);

    /// Report an error during processing
    fn report_error(&self, stage: ProcessingStage, error: &str);
}

/// No-op progress reporter that discards all progress updates
pub struct NoOpProgressReporter;

impl ProgressReporter for NoOpProgressReporter {
    fn report_progress(&self, _update: ProgressUpdate) {}

    fn report_completion(&self, _timings: ProcessingTimings) {}

    fn report_error(&self, _stage: ProcessingStage, _error: &str) {}
}

/// Console progress reporter that logs progress through `log`
pub struct ConsoleProgressReporter {
    verbose: bool,
}

impl ConsoleProgressReporter {
    /// Create a new console progress reporter
    ///
    /// # Arguments
    /// * `verbose` - Whether to show timing details
    #[must_use]
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl ProgressReporter for ConsoleProgressReporter {
    fn report_progress(&self, update: ProgressUpdate) {
        if self.verbose {
            log::info!(
                "[{}%] {} ({}ms elapsed)",
                update.progress,
                update.description,
                update.elapsed_ms
            );
        } else {
            log::info!("[{}%] {}", update.progress, update.description);
        }
    }

    fn report_completion(&self, timings: ProcessingTimings) {
        log::info!("✅ Background removal completed in {}ms", timings.total_ms);

        if self.verbose {
            log::info!("  📊 Detailed timings:");
            log::info!("    • Upload preparation: {}ms", timings.payload_ms);
            log::info!("    • Remote service: {}ms", timings.remote_ms);
        }
    }

    fn report_error(&self, stage: ProcessingStage, error: &str) {
        log::error!("❌ Error during {}: {}", stage.description(), error);
    }
}

/// Per-run progress tracker
///
/// Borrows the reporter for the duration of one run and stamps every update
/// with the time elapsed since the run started.
pub struct ProgressTracker<'a> {
    reporter: &'a dyn ProgressReporter,
    start_time: Instant,
    current_stage: Option<ProcessingStage>,
}

impl<'a> ProgressTracker<'a> {
    /// Start tracking a run
    #[must_use]
    pub fn new(reporter: &'a dyn ProgressReporter) -> Self {
        Self {
            reporter,
            start_time: Instant::now(),
            current_stage: None,
        }
    }

    /// Report progress for a specific stage
    pub fn report_stage(&mut self, stage: ProcessingStage) {
        self.current_stage = Some(stage);
        self.reporter
            .report_progress(ProgressUpdate::new(stage, self.start_time));
    }

    /// Report progress with custom description
    pub fn report_stage_with_description(&mut self, stage: ProcessingStage, description: String) {
        self.current_stage = Some(stage);
        self.reporter.report_progress(ProgressUpdate::with_description(
            stage,
            description,
            self.start_time,
        ));
    }

    /// Report completion with final timings
    pub fn report_completion(&self, timings: ProcessingTimings) {
        self.reporter.report_completion(timings);
    }

    /// Report an error at the current stage
    pub fn report_error(&self, error: &str) {
        let stage = self.current_stage.unwrap_or(ProcessingStage::RemoteProcessing);
        self.reporter.report_error(stage, error);
    }

    /// Milliseconds since the run started
    #[must_use]
    pub fn elapsed_ms(&self) -> u64 {
        self.start_time.elapsed().as_millis() as u64
    }
}

/// Create the progress reporter used by the CLI
///
/// With `spinner` set the CLI shows an `indicatif` spinner instead of log lines.
#[cfg(feature = "cli")]
#[must_use]
pub fn create_cli_progress_reporter(spinner: bool, verbose: bool) -> Box<dyn ProgressReporter> {
    if spinner {
        Box::new(SpinnerProgressReporter::new())
    } else {
        Box::new(ConsoleProgressReporter::new(verbose))
    }
}

/// Spinner-based progress reporter for interactive terminals
#[cfg(feature = "cli")]
pub struct SpinnerProgressReporter {
    bar: indicatif::ProgressBar,
}

#[cfg(feature = "cli")]
impl SpinnerProgressReporter {
    #[must_use]
    pub fn new() -> Self {
        let bar = indicatif::ProgressBar::new_spinner();
        if let Ok(style) = indicatif::ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
        {
            bar.set_style(style);
        }
        bar.enable_steady_tick(std::time::Duration::from_millis(100));
        Self { bar }
    }
}

#[cfg(feature = "cli")]
impl Default for SpinnerProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "cli")]
impl ProgressReporter for SpinnerProgressReporter {
    fn report_progress(&self, update: ProgressUpdate) {
        self.bar
            .set_message(format!("[{}%] {}", update.progress, update.description));
    }

    fn report_completion(&self, timings: ProcessingTimings) {
        self.bar
            .finish_with_message(format!("✅ Background removed in {}ms", timings.total_ms));
    }

    fn report_error(&self, stage: ProcessingStage, error: &str) {
        self.bar.abandon_with_message(format!(
            "❌ Error during {}: {}",
            stage.description(),
            error
        ));
    }
}
