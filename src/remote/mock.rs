//! Scripted background remover for tests and offline use
//!
//! `MockRemover` answers each call with the next scripted `MockResponse`
//! (falling back to a default once the script runs out), records every payload
//! it receives, and can hold calls open until the test releases them.

use crate::{
    error::{BgRemovalError, Result},
    remote::BackgroundRemover,
    types::{ProcessedImage, UploadPayload},
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::{Notify, Semaphore};

/// Scripted answer for one call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockResponse {
    /// HTTP 2xx with the given body
    Success(Vec<u8>),
    /// Non-success HTTP status
    Status(u16),
    /// Request never completed
    Transport(String),
}

impl MockResponse {
    fn into_result(self) -> Result<ProcessedImage> {
        match self {
            Self::Success(body) => Ok(ProcessedImage::new(body, Some("image/png".to_string()))),
            Self::Status(status) => Err(BgRemovalError::remote_status(status)),
            Self::Transport(reason) => Err(BgRemovalError::remote_transport(reason)),
        }
    }
}

/// Mock remote service
///
/// Clones share their script, call history, and gate.
#[derive(Debug, Clone)]
pub struct MockRemover {
    script: Arc<Mutex<VecDeque<MockResponse>>>,
    fallback: Arc<Mutex<MockResponse>>,
    call_history: Arc<Mutex<Vec<UploadPayload>>>,
    called: Arc<Notify>,
    gate: Option<Arc<Semaphore>>,
}

impl MockRemover {
    /// Mock that answers every call with `response`
    #[must_use]
    pub fn new(response: MockResponse) -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::new())),
            fallback: Arc::new(Mutex::new(response)),
            call_history: Arc::new(Mutex::new(Vec::new())),
            called: Arc::new(Notify::new()),
            gate: None,
        }
    }

    /// Mock that succeeds with `body`
    #[must_use]
    pub fn succeeding(body: Vec<u8>) -> Self {
        Self::new(MockResponse::Success(body))
    }

    /// Mock that fails with HTTP `status`
    #[must_use]
    pub fn failing(status: u16) -> Self {
        Self::new(MockResponse::Status(status))
    }

    /// Hold every call open until [`MockRemover::release`] is called
    #[must_use]
    pub fn gated(mut self) -> Self {
        self.gate = Some(Arc::new(Semaphore::new(0)));
        self
    }

    /// Queue responses consumed before the fallback
    pub fn push_responses<I: IntoIterator<Item = MockResponse>>(&self, responses: I) {
        if let Ok(mut script) = self.script.lock() {
            script.extend(responses);
        }
    }

    /// Replace the fallback response
    pub fn set_response(&self, response: MockResponse) {
        if let Ok(mut fallback) = self.fallback.lock() {
            *fallback = response;
        }
    }

    /// Let `calls` held calls complete
    pub fn release(&self, calls: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(calls);
        }
    }

    /// Number of calls received so far
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.call_history.lock().map(|calls| calls.len()).unwrap_or(0)
    }

    /// Payloads received so far
    #[must_use]
    pub fn calls(&self) -> Vec<UploadPayload> {
        self.call_history
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    /// Wait until at least `count` calls have arrived
    pub async fn wait_for_calls(&self, count: usize) {
        while self.call_count() < count {
            self.called.notified().await;
        }
    }

    fn next_response(&self) -> Result<MockResponse> {
        let scripted = self
            .script
            .lock()
            .map_err(|_| BgRemovalError::internal("mock script lock poisoned"))?
            .pop_front();
        match scripted {
            Some(response) => Ok(response),
            None => self
                .fallback
                .lock()
                .map(|fallback| fallback.clone())
                .map_err(|_| BgRemovalError::internal("mock fallback lock poisoned")),
        }
    }
}

#[async_trait]
impl BackgroundRemover for MockRemover {
    async fn remove_background(&self, payload: UploadPayload) -> Result<ProcessedImage> {
        self.call_history
            .lock()
            .map_err(|_| BgRemovalError::internal("mock call history lock poisoned"))?
            .push(payload);
        self.called.notify_one();

        if let Some(gate) = &self.gate {
            gate.acquire()
                .await
                .map_err(|_| BgRemovalError::internal("mock gate closed"))?
                .forget();
        }

        self.next_response()?.into_result()
    }

    fn name(&self) -> &str {
        "mock"
    }
}
