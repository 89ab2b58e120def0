//! Widget state machine
//!
//! ```text
//! Empty ──select──▶ Ready ──trigger──▶ Processing ──ok──▶ Done
//!                     ▲                     │
//!                     │                     └──err──▶ Failed
//!                     └────────select (from any state)
//! Done / Failed ──trigger──▶ Processing (retry with the same source)
//! Processing ──call cancelled──▶ Ready
//! ```

use crate::{
    error::RemoteServiceError,
    types::{ProcessedImage, SourceImage},
};

/// Label of the primary action while idle
pub const ACTION_LABEL_IDLE: &str = "Remove Background";

/// Label of the primary action while a call is outstanding
pub const ACTION_LABEL_PROCESSING: &str = "Processing...";

/// Coarse stage of the workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStatus {
    Idle,
    Processing,
    Done,
    Failed,
}

impl std::fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Processing => write!(f, "processing"),
            Self::Done => write!(f, "done"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Full widget state
///
/// Each variant carries exactly the data valid in that stage, so a result
/// without a source, or processing without a source, cannot be expressed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WidgetState {
    /// Nothing selected yet
    #[default]
    Empty,
    /// Source selected, nothing submitted
    Ready { source: SourceImage },
    /// Source submitted, waiting for the remote service
    Processing { source: SourceImage },
    /// Remote service returned a result
    Done {
        source: SourceImage,
        processed: ProcessedImage,
    },
    /// Remote service call failed; the source is kept for a retry
    Failed {
        source: SourceImage,
        reason: String,
        /// Set when the remote service itself caused the failure
        remote: Option<RemoteServiceError>,
    },
}

impl WidgetState {
    #[must_use]
    pub fn status(&self) -> ProcessingStatus {
        match self {
            Self::Empty | Self::Ready { .. } => ProcessingStatus::Idle,
            Self::Processing { .. } => ProcessingStatus::Processing,
            Self::Done { .. } => ProcessingStatus::Done,
            Self::Failed { .. } => ProcessingStatus::Failed,
        }
    }

    #[must_use]
    pub fn source(&self) -> Option<&SourceImage> {
        match self {
            Self::Empty => None,
            Self::Ready { source }
            | Self::Processing { source }
            | Self::Done { source, .. }
            | Self::Failed { source, .. } => Some(source),
        }
    }

    #[must_use]
    pub fn processed(&self) -> Option<&ProcessedImage> {
        match self {
            Self::Done { processed, .. } => Some(processed),
            _ => None,
        }
    }

    /// Diagnostic reason of the last failure
    #[must_use]
    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            Self::Failed { reason, .. } => Some(reason),
            _ => None,
        }
    }

    #[must_use]
    pub fn remote_error(&self) -> Option<&RemoteServiceError> {
        match self {
            Self::Failed { remote, .. } => remote.as_ref(),
            _ => None,
        }
    }
}

/// Snapshot of what a frontend should render
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetView {
    pub status: ProcessingStatus,
    /// Label of the primary action button
    pub action_label: &'static str,
    /// Whether the primary action can be triggered
    pub action_enabled: bool,
    /// Whether a source preview exists
    pub has_preview: bool,
    /// Whether the download action is shown
    pub download_visible: bool,
}

impl WidgetView {
    /// Derive the view from a state and whether a call is outstanding
    #[must_use]
    pub fn from_state(state: &WidgetState, call_outstanding: bool) -> Self {
        Self {
            status: state.status(),
            action_label: if call_outstanding {
                ACTION_LABEL_PROCESSING
            } else {
                ACTION_LABEL_IDLE
            },
            action_enabled: state.source().is_some() && !call_outstanding,
            has_preview: state.source().is_some(),
            download_visible: state.processed().is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> SourceImage {
        SourceImage::new(vec![1, 2, 3], "photo.png")
    }

    #[test]
    fn test_status_per_variant() {
        assert_eq!(WidgetState::Empty.status(), ProcessingStatus::Idle);
        assert_eq!(
            WidgetState::Ready { source: source() }.status(),
            ProcessingStatus::Idle
        );
        assert_eq!(
            WidgetState::Processing { source: source() }.status(),
            ProcessingStatus::Processing
        );
        let done = WidgetState::Done {
            source: source(),
            processed: ProcessedImage::new(vec![9], None),
        };
        assert_eq!(done.status(), ProcessingStatus::Done);
        assert!(done.processed().is_some());
    }

    #[test]
    fn test_failed_keeps_source() {
        let failed = WidgetState::Failed {
            source: source(),
            reason: "HTTP 403".to_string(),
            remote: Some(RemoteServiceError::Status { status: 403 }),
        };
        assert_eq!(failed.status(), ProcessingStatus::Failed);
        assert!(failed.source().is_some());
        assert!(failed.processed().is_none());
        assert_eq!(failed.failure_reason(), Some("HTTP 403"));
        assert_eq!(failed.remote_error().and_then(RemoteServiceError::status), Some(403));
    }

    #[test]
    fn test_view_labels_and_gating() {
        let empty = WidgetView::from_state(&WidgetState::Empty, false);
        assert!(!empty.action_enabled);
        assert!(!empty.has_preview);
        assert_eq!(empty.action_label, ACTION_LABEL_IDLE);

        let processing =
            WidgetView::from_state(&WidgetState::Processing { source: source() }, true);
        assert!(!processing.action_enabled);
        assert_eq!(processing.action_label, ACTION_LABEL_PROCESSING);
        assert!(!processing.download_visible);

        let done = WidgetView::from_state(
            &WidgetState::Done {
                source: source(),
                processed: ProcessedImage::new(vec![1], None),
            },
            false,
        );
        assert!(done.action_enabled);
        assert!(done.download_visible);
    }
}
