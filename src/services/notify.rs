//! User-visible notifications
//!
//! The controller raises a notification when processing fails; frontends decide
//! how to show it (dialog, toast, stderr line).

use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};

/// Generic message shown when the remote call fails
pub const PROCESSING_FAILED_MESSAGE: &str =
    "Error processing image. Please make sure you have internet connection.";

/// Severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Error,
}

/// A message meant for the user
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub raised_at: DateTime<Utc>,
}

impl Notification {
    /// Create an error notification stamped with the current time
    pub fn error<S: Into<String>>(message: S) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
            raised_at: Utc::now(),
        }
    }

    /// Create an informational notification stamped with the current time
    pub fn info<S: Into<String>>(message: S) -> Self {
        Self {
            level: NotificationLevel::Info,
            message: message.into(),
            raised_at: Utc::now(),
        }
    }
}

/// Sink for user-visible notifications
pub trait Notifier: Send + Sync {
    /// Show a notification to the user
    fn notify(&self, notification: Notification);
}

/// Discards every notification
pub struct NoOpNotifier;

impl Notifier for NoOpNotifier {
    fn notify(&self, _notification: Notification) {}
}

/// Prints notifications to stderr
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Error => eprintln!("❌ {}", notification.message),
            NotificationLevel::Info => eprintln!("ℹ️  {}", notification.message),
        }
    }
}

/// Collects notifications in memory
///
/// Clones share the same list, so a test can keep one handle and give the
/// other to the controller.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    received: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifications received so far
    #[must_use]
    pub fn notifications(&self) -> Vec<Notification> {
        self.received
            .lock()
            .map(|list| list.clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.received.lock().map(|list| list.len()).unwrap_or(0)
    }

    pub fn clear(&self) {
        if let Ok(mut list) = self.received.lock() {
            list.clear();
        }
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        if let Ok(mut list) = self.received.lock() {
            list.push(notification);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_notifier_shares_state() {
        let notifier = RecordingNotifier::new();
        let handle = notifier.clone();

        notifier.notify(Notification::error(PROCESSING_FAILED_MESSAGE));
        notifier.notify(Notification::info("Saved"));

        assert_eq!(handle.count(), 2);
        let received = handle.notifications();
        assert_eq!(received[0].level, NotificationLevel::Error);
        assert_eq!(received[0].message, PROCESSING_FAILED_MESSAGE);

        handle.clear();
        assert_eq!(notifier.count(), 0);
    }

    #[test]
    fn test_notification_timestamp() {
        let before = Utc::now();
        let notification = Notification::error("boom");
        assert!(notification.raised_at >= before);
    }
}
