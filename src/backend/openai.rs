//! Backend for OpenAI-compatible chat APIs.
//!
//! [`OpenAiBackend`] covers Groq (the default provider), OpenAI itself, and
//! any server exposing `/v1/chat/completions`. JSON mode is requested through
//! `response_format: {"type": "json_object"}`; tool declarations are not
//! forwarded.

use super::{http_error, Backend, LlmRequest, LlmResponse};
use crate::error::{ProviderError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

/// Backend for any OpenAI-compatible API.
///
/// # Example
///
/// ```
/// use revenue_engine::backend::{Backend, OpenAiBackend};
///
/// let backend = OpenAiBackend::new();
/// assert!(!backend.is_configured());
/// let with_key = OpenAiBackend::new().with_api_key("gsk_live_0123456789");
/// assert!(with_key.is_configured());
/// ```
#[derive(Clone, Default)]
pub struct OpenAiBackend {
    /// Sent as `Authorization: Bearer {key}`.
    pub(crate) api_key: Option<String>,
}

impl std::fmt::Debug for OpenAiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiBackend")
            .field("api_key", &self.api_key.as_deref().map(super::mask_key))
            .finish()
    }
}

impl OpenAiBackend {
    /// Create a backend without credentials.
    pub fn new() -> Self {
        Self { api_key: None }
    }

    /// Set the API key for authentication. Empty keys are ignored.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.api_key = (!key.trim().is_empty()).then_some(key);
        self
    }

    /// Build the messages array.
    fn build_messages(request: &LlmRequest) -> Vec<Value> {
        let mut messages = Vec::with_capacity(2);
        if let Some(sys) = request.system() {
            messages.push(json!({"role": "system", "content": sys}));
        }
        messages.push(json!({"role": "user", "content": request.prompt}));
        messages
    }

    /// Build the request body for `/v1/chat/completions`.
    fn build_body(request: &LlmRequest) -> Value {
        let mut body = json!({
            "model": request.model,
            "messages": Self::build_messages(request),
            "stream": false,
        });

        if let Some(temp) = request.options.temperature {
            body["temperature"] = json!(temp);
        }
        if request.options.json_response {
            body["response_format"] = json!({"type": "json_object"});
        }

        body
    }

    fn build_http_request(
        &self,
        client: &Client,
        url: &str,
        body: &Value,
    ) -> reqwest::RequestBuilder {
        let mut req = client.post(url).json(body);
        if let Some(ref key) = self.api_key {
            req = req.bearer_auth(key);
        }
        req
    }

    /// Keep usage, model, and id from the envelope.
    fn extract_metadata(json_resp: &Value) -> Option<Value> {
        let mut meta = serde_json::Map::new();
        for key in ["usage", "model", "id"] {
            if let Some(v) = json_resp.get(key) {
                meta.insert(key.into(), v.clone());
            }
        }
        (!meta.is_empty()).then_some(Value::Object(meta))
    }
}

#[async_trait]
impl Backend for OpenAiBackend {
    async fn complete(
        &self,
        client: &Client,
        base_url: &str,
        request: &LlmRequest,
    ) -> Result<LlmResponse> {
        if self.api_key.is_none() {
            return Err(ProviderError::NotConfigured(
                "no API key configured for the OpenAI-compatible provider".into(),
            ));
        }

        let url = format!("{}/v1/chat/completions", base_url.trim_end_matches('/'));
        let body = Self::build_body(request);

        let resp = self.build_http_request(client, &url, &body).send().await?;
        let status = resp.status().as_u16();

        if !resp.status().is_success() {
            return Err(http_error(resp).await);
        }

        let raw = resp.text().await?;
        let json_resp: Value = serde_json::from_str(&raw)?;

        let text = json_resp
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();

        Ok(LlmResponse {
            text,
            status,
            metadata: Self::extract_metadata(&json_resp),
        })
    }

    fn name(&self) -> &'static str {
        "openai"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::GenerationOptions;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_request() -> LlmRequest {
        LlmRequest::new("llama3-8b-8192", "Find plumbers in Austin")
    }

    #[test]
    fn test_chat_payload() {
        let request = test_request()
            .with_system("You are a lead researcher.")
            .with_options(GenerationOptions::default().with_temperature(0.7));

        let body = OpenAiBackend::build_body(&request);

        assert_eq!(body["model"], "llama3-8b-8192");
        assert_eq!(body["temperature"], 0.7);
        assert_eq!(body["stream"], false);

        let messages = body["messages"].as_array().expect("messages");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[1]["role"], "user");
        assert_eq!(messages[1]["content"], "Find plumbers in Austin");

        assert!(body.get("response_format").is_none());
    }

    #[test]
    fn test_json_mode() {
        let request = test_request()
            .with_options(GenerationOptions::default().with_json_response(true));
        let body = OpenAiBackend::build_body(&request);
        assert_eq!(body["response_format"]["type"], "json_object");
    }

    #[test]
    fn test_tools_not_forwarded() {
        let request = test_request().with_options(
            GenerationOptions::default().with_tool(json!({"googleSearch": {}})),
        );
        let body = OpenAiBackend::build_body(&request);
        assert!(body.get("tools").is_none());
    }

    #[test]
    fn test_empty_key_is_not_configured() {
        assert!(!OpenAiBackend::new().with_api_key("  ").is_configured());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let backend = OpenAiBackend::new().with_api_key("gsk_1234567890abcdef");
        let debug_output = format!("{:?}", backend);
        assert!(!debug_output.contains("1234567890abcdef"));
        assert!(debug_output.contains("gsk_12"));
        assert!(debug_output.contains("***"));
    }

    #[tokio::test]
    async fn test_complete_against_server() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer gsk_test_key_123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "chatcmpl-1",
                "model": "llama3-8b-8192",
                "choices": [{"message": {"role": "assistant", "content": "{\"leads\":[]}"}}],
                "usage": {"total_tokens": 42}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let backend = OpenAiBackend::new().with_api_key("gsk_test_key_123");
        let resp = backend
            .complete(&Client::new(), &server.uri(), &test_request())
            .await
            .expect("completion should succeed");

        assert_eq!(resp.text, "{\"leads\":[]}");
        assert_eq!(resp.status, 200);
        let meta = resp.metadata.expect("metadata");
        assert_eq!(meta["usage"]["total_tokens"], 42);
    }

    #[tokio::test]
    async fn test_error_status_carries_body_and_retry_after() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(429)
                    .insert_header("retry-after", "7")
                    .set_body_string("Rate limit reached for model"),
            )
            .mount(&server)
            .await;

        let backend = OpenAiBackend::new().with_api_key("gsk_test_key_123");
        let err = backend
            .complete(&Client::new(), &server.uri(), &test_request())
            .await
            .expect_err("429 should fail");

        match err {
            ProviderError::HttpError {
                status,
                body,
                retry_after,
            } => {
                assert_eq!(status, 429);
                assert!(body.contains("Rate limit"));
                assert_eq!(retry_after, Some(std::time::Duration::from_secs(7)));
            }
            other => panic!("expected HttpError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_key_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = OpenAiBackend::new()
            .complete(&Client::new(), &server.uri(), &test_request())
            .await
            .expect_err("no key");
        assert!(matches!(err, ProviderError::NotConfigured(_)));
    }

    #[tokio::test]
    async fn test_non_json_envelope_is_json_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
            .mount(&server)
            .await;

        let err = OpenAiBackend::new()
            .with_api_key("gsk_test_0123456789")
            .complete(&Client::new(), &server.uri(), &test_request())
            .await
            .expect_err("html is not an envelope");
        assert!(matches!(err, ProviderError::Json(_)));
        assert_eq!(err.status(), None);
    }
}
