//! Backend trait and normalized request/response types.
//!
//! The [`Backend`] trait abstracts over text-generation providers,
//! translating between normalized [`LlmRequest`]/[`LlmResponse`] types and
//! provider-specific HTTP APIs. A backend issues exactly one request per
//! call and reports any failure as a [`ProviderError`]; retry and
//! classification happen a layer up in [`RetryController`](crate::retry::RetryController).
//!
//! ## Architecture
//!
//! ```text
//! Engine ──► LlmRequest ──► Backend::complete() ──► LlmResponse
//!                                   │
//!                      ┌────────────┼────────────┐
//!                OpenAiBackend  GeminiBackend  MockBackend
//!          /v1/chat/completions  :generateContent  (scripted)
//! ```

#[cfg(feature = "gemini")]
pub mod gemini;
pub mod mock;
pub mod openai;

#[cfg(feature = "gemini")]
pub use gemini::GeminiBackend;
pub use mock::{MockBackend, MockReply};
pub use openai::OpenAiBackend;

use crate::error::{ProviderError, Result};
use crate::records::GroundingSource;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

/// Per-request generation options, forwarded to the provider as-is.
#[derive(Debug, Clone, Default)]
pub struct GenerationOptions {
    /// Sampling temperature. Provider default when `None`.
    pub temperature: Option<f64>,

    /// Ask the provider for a JSON-shaped response where it supports that.
    pub json_response: bool,

    /// Provider tool declarations (e.g. `{"googleSearch": {}}`).
    /// Backends that have no tool support ignore them.
    pub tools: Vec<Value>,
}

impl GenerationOptions {
    pub fn with_temperature(mut self, temp: f64) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn with_json_response(mut self, enabled: bool) -> Self {
        self.json_response = enabled;
        self
    }

    pub fn with_tool(mut self, tool: Value) -> Self {
        self.tools.push(tool);
        self
    }
}

/// A normalized generation request -- provider-agnostic.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    /// Model identifier (e.g. `"llama3-8b-8192"`, `"gemini-1.5-pro"`).
    pub model: String,

    /// Optional system instruction.
    pub system_prompt: Option<String>,

    /// The user prompt text.
    pub prompt: String,

    /// Generation options.
    pub options: GenerationOptions,
}

impl LlmRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system_prompt: None,
            prompt: prompt.into(),
            options: GenerationOptions::default(),
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system_prompt = Some(system.into());
        self
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    /// System prompt, treating an empty string as absent.
    pub(crate) fn system(&self) -> Option<&str> {
        self.system_prompt.as_deref().filter(|s| !s.is_empty())
    }
}

/// A normalized generation response.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    /// The generated text.
    pub text: String,

    /// HTTP status code (for diagnostics/logging).
    pub status: u16,

    /// Provider-specific metadata (token usage, grounding, model info).
    /// Passed through untouched.
    pub metadata: Option<Value>,
}

/// Abstraction over text-generation providers.
///
/// Implementors translate between the normalized [`LlmRequest`]/[`LlmResponse`]
/// and the provider's HTTP API. One call, one request: no retries here.
///
/// # Object Safety
///
/// This trait is object-safe and designed to be used as `Arc<dyn Backend>`.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Execute a single generation call.
    async fn complete(
        &self,
        client: &Client,
        base_url: &str,
        request: &LlmRequest,
    ) -> Result<LlmResponse>;

    /// Human-readable name for logging and diagnostics.
    fn name(&self) -> &'static str;

    /// Whether credentials are in place. Callers check this before any call
    /// and report `not_configured` without touching the network.
    fn is_configured(&self) -> bool {
        true
    }
}

/// Collect web citations from response metadata.
///
/// Reads `groundingChunks[].web.{title, uri}` (the Gemini grounding shape)
/// and drops entries without a uri. Returns an empty list for any other
/// shape.
pub fn grounding_sources(metadata: Option<&Value>) -> Vec<GroundingSource> {
    let Some(chunks) = metadata
        .and_then(|m| m.get("groundingChunks"))
        .and_then(|c| c.as_array())
    else {
        return Vec::new();
    };

    chunks
        .iter()
        .filter_map(|chunk| chunk.get("web"))
        .filter_map(|web| {
            let uri = web.get("uri").and_then(|v| v.as_str()).unwrap_or("");
            if uri.is_empty() {
                return None;
            }
            let title = web.get("title").and_then(|v| v.as_str()).unwrap_or("");
            Some(GroundingSource {
                title: title.to_string(),
                uri: uri.to_string(),
            })
        })
        .collect()
}

/// Key prefix for Debug output, e.g. `gsk_12***`.
pub(crate) fn mask_key(key: &str) -> String {
    match key.char_indices().nth(6) {
        Some((idx, _)) => format!("{}***", &key[..idx]),
        None => "***".to_string(),
    }
}

/// Parse a `Retry-After` header value as seconds.
pub(crate) fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

/// Turn a non-success HTTP response into a [`ProviderError::HttpError`].
pub(crate) async fn http_error(resp: reqwest::Response) -> ProviderError {
    let status = resp.status().as_u16();
    let retry_after = resp
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(parse_retry_after);
    let body = resp.text().await.unwrap_or_default();
    ProviderError::HttpError {
        status,
        body,
        retry_after,
    }
}
