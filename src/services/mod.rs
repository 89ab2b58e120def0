//! Services separating side effects from the widget workflow

pub mod io;
pub mod notify;
pub mod progress;

pub use io::ImageIOService;
pub use notify::{
    ConsoleNotifier, NoOpNotifier, Notification, NotificationLevel, Notifier, RecordingNotifier,
    PROCESSING_FAILED_MESSAGE,
};
#[cfg(feature = "cli")]
pub use progress::{create_cli_progress_reporter, SpinnerProgressReporter};
pub use progress::{
    ConsoleProgressReporter, NoOpProgressReporter, ProcessingStage, ProcessingTimings,
    ProgressReporter, ProgressTracker, ProgressUpdate,
};
