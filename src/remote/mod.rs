//! Remote background-removal services
//!
//! This module provides the seam between the widget controller and the
//! service that actually removes backgrounds:
//! - `RemoveBgClient` posts to a remove.bg compatible HTTP endpoint
//! - `MockRemover` answers from a script, for tests and offline demos

pub mod mock;
pub mod removebg;

use crate::{
    error::Result,
    types::{ProcessedImage, UploadPayload},
};
use async_trait::async_trait;
use std::sync::Arc;

pub use self::mock::{MockRemover, MockResponse};
pub use self::removebg::RemoveBgClient;

/// A service that removes the background of an uploaded image
///
/// One call is one best-effort attempt: implementations must not retry.
/// Every failure is reported as `BgRemovalError::RemoteService`.
#[async_trait]
pub trait BackgroundRemover: Send + Sync {
    /// Submit the payload and wait for the processed image
    async fn remove_background(&self, payload: UploadPayload) -> Result<ProcessedImage>;

    /// Short name used in logs
    fn name(&self) -> &str {
        "remote"
    }
}

#[async_trait]
impl<T: BackgroundRemover + ?Sized> BackgroundRemover for Arc<T> {
    async fn remove_background(&self, payload: UploadPayload) -> Result<ProcessedImage> {
        (**self).remove_background(payload).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[async_trait]
impl<T: BackgroundRemover + ?Sized> BackgroundRemover for Box<T> {
    async fn remove_background(&self, payload: UploadPayload) -> Result<ProcessedImage> {
        (**self).remove_background(payload).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
