//! Mock backend for testing without a live provider.
//!
//! [`MockBackend`] plays back a script of [`MockReply`]s in order, so callers
//! can exercise the retry controller and orchestrators deterministically:
//! a couple of 503s followed by a good payload, a 401, a dropped connection.
//!
//! # Example
//!
//! ```
//! use revenue_engine::backend::{MockBackend, MockReply};
//!
//! let mock = MockBackend::new(vec![
//!     MockReply::status(503, "unavailable"),
//!     MockReply::text(r#"{"leads": []}"#),
//! ]);
//! assert_eq!(mock.calls(), 0);
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use super::{Backend, LlmRequest, LlmResponse};
use crate::error::{ProviderError, Result};

/// One scripted outcome.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Succeed with this text and optional metadata.
    Text {
        text: String,
        metadata: Option<Value>,
    },
    /// Fail with an HTTP status and body.
    Status { status: u16, body: String },
    /// Fail before any response, like a dropped connection.
    Network(String),
}

impl MockReply {
    pub fn text(text: impl Into<String>) -> Self {
        MockReply::Text {
            text: text.into(),
            metadata: None,
        }
    }

    pub fn text_with_metadata(text: impl Into<String>, metadata: Value) -> Self {
        MockReply::Text {
            text: text.into(),
            metadata: Some(metadata),
        }
    }

    pub fn status(status: u16, body: impl Into<String>) -> Self {
        MockReply::Status {
            status,
            body: body.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        MockReply::Network(message.into())
    }

    fn into_result(self) -> Result<LlmResponse> {
        match self {
            MockReply::Text { text, metadata } => Ok(LlmResponse {
                text,
                status: 200,
                metadata,
            }),
            MockReply::Status { status, body } => Err(ProviderError::HttpError {
                status,
                body,
                retry_after: None,
            }),
            MockReply::Network(message) => Err(ProviderError::Other(message)),
        }
    }
}

/// A test backend that plays back scripted replies in order.
///
/// Once the script is exhausted the last reply repeats. Every request is
/// recorded so tests can assert on prompts and call counts.
#[derive(Debug)]
pub struct MockBackend {
    replies: Vec<MockReply>,
    index: AtomicUsize,
    configured: bool,
    requests: Mutex<Vec<LlmRequest>>,
}

impl MockBackend {
    /// Create a mock backend with the given script.
    ///
    /// An empty script behaves like a single network failure.
    pub fn new(replies: Vec<MockReply>) -> Self {
        Self {
            replies,
            index: AtomicUsize::new(0),
            configured: true,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock that always returns the same text.
    pub fn fixed(response: impl Into<String>) -> Self {
        Self::new(vec![MockReply::text(response)])
    }

    /// Report missing credentials from [`Backend::is_configured`].
    pub fn unconfigured(mut self) -> Self {
        self.configured = false;
        self
    }

    /// Number of `complete` calls so far.
    pub fn calls(&self) -> usize {
        self.index.load(Ordering::Relaxed)
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    fn next_reply(&self) -> MockReply {
        let idx = self.index.fetch_add(1, Ordering::Relaxed);
        match self.replies.get(idx).or_else(|| self.replies.last()) {
            Some(reply) => reply.clone(),
            None => MockReply::network("mock script is empty"),
        }
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn complete(
        &self,
        _client: &Client,
        _base_url: &str,
        request: &LlmRequest,
    ) -> Result<LlmResponse> {
        if let Ok(mut seen) = self.requests.lock() {
            seen.push(request.clone());
        }
        self.next_reply().into_result()
    }

    fn name(&self) -> &'static str {
        "mock"
    }

    fn is_configured(&self) -> bool {
        self.configured
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> LlmRequest {
        LlmRequest::new("test", "test")
    }

    #[tokio::test]
    async fn test_mock_fixed_response() {
        let mock = MockBackend::fixed("Hello!");
        let resp = mock
            .complete(&Client::new(), "http://unused", &request())
            .await
            .unwrap();
        assert_eq!(resp.text, "Hello!");
        assert_eq!(resp.status, 200);
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_mock_plays_script_then_repeats_last() {
        let mock = MockBackend::new(vec![
            MockReply::status(503, "unavailable"),
            MockReply::text("ok"),
        ]);
        let client = Client::new();
        let r1 = mock.complete(&client, "http://unused", &request()).await;
        let r2 = mock.complete(&client, "http://unused", &request()).await;
        let r3 = mock.complete(&client, "http://unused", &request()).await;

        assert_eq!(r1.unwrap_err().status(), Some(503));
        assert_eq!(r2.unwrap().text, "ok");
        assert_eq!(r3.unwrap().text, "ok");
        assert_eq!(mock.calls(), 3);
    }

    #[tokio::test]
    async fn test_mock_records_requests() {
        let mock = MockBackend::fixed("x");
        let req = LlmRequest::new("m", "find leads").with_system("sys");
        mock.complete(&Client::new(), "http://unused", &req)
            .await
            .unwrap();
        let seen = mock.requests();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].prompt, "find leads");
    }

    #[tokio::test]
    async fn test_empty_script_is_network_failure() {
        let mock = MockBackend::new(Vec::new());
        let err = mock
            .complete(&Client::new(), "http://unused", &request())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Other(_)));
    }

    #[test]
    fn test_unconfigured() {
        assert!(MockBackend::fixed("x").is_configured());
        assert!(!MockBackend::fixed("x").unconfigured().is_configured());
    }
}
