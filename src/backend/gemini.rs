//! Backend for the Google Gemini `generateContent` API.
//!
//! Endpoint: `/v1beta/models/{model}:generateContent`, keyed by the
//! `x-goog-api-key` header.
//!
//! Unlike the OpenAI-compatible backend, Gemini accepts tool declarations
//! (`{"googleSearch": {}}` enables search grounding). When grounding is on,
//! the candidate's `groundingMetadata` is surfaced as response metadata so
//! [`grounding_sources`](super::grounding_sources) can read citations.

use super::{http_error, Backend, LlmRequest, LlmResponse};
use crate::error::{ProviderError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

/// Header carrying the API key. Keeps the key out of the URL.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Backend for Gemini models.
#[derive(Clone, Default)]
pub struct GeminiBackend {
    pub(crate) api_key: Option<String>,
}

impl std::fmt::Debug for GeminiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiBackend")
            .field("api_key", &self.api_key.as_deref().map(super::mask_key))
            .finish()
    }
}

impl GeminiBackend {
    pub fn new() -> Self {
        Self { api_key: None }
    }

    /// Set the API key. Empty keys are ignored.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.api_key = (!key.trim().is_empty()).then_some(key);
        self
    }

    fn build_body(request: &LlmRequest) -> Value {
        let mut body = json!({
            "contents": [{"role": "user", "parts": [{"text": request.prompt}]}],
        });

        if let Some(sys) = request.system() {
            body["systemInstruction"] = json!({"parts": [{"text": sys}]});
        }

        let mut config = serde_json::Map::new();
        if let Some(temp) = request.options.temperature {
            config.insert("temperature".into(), json!(temp));
        }
        // Gemini rejects a JSON mime type combined with tool use.
        if request.options.json_response && request.options.tools.is_empty() {
            config.insert("responseMimeType".into(), json!("application/json"));
        }
        if !config.is_empty() {
            body["generationConfig"] = Value::Object(config);
        }

        if !request.options.tools.is_empty() {
            body["tools"] = Value::Array(request.options.tools.clone());
        }

        body
    }

    /// Concatenate the text parts of the first candidate.
    fn extract_text(json_resp: &Value) -> String {
        json_resp
            .pointer("/candidates/0/content/parts")
            .and_then(|p| p.as_array())
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
                    .collect::<String>()
            })
            .unwrap_or_default()
    }

    /// Grounding metadata fields flattened at the top, plus usage.
    fn extract_metadata(json_resp: &Value) -> Option<Value> {
        let mut meta = serde_json::Map::new();
        if let Some(Value::Object(grounding)) = json_resp.pointer("/candidates/0/groundingMetadata")
        {
            meta.extend(grounding.clone());
        }
        for key in ["usageMetadata", "modelVersion"] {
            if let Some(v) = json_resp.get(key) {
                meta.insert(key.into(), v.clone());
            }
        }
        (!meta.is_empty()).then_some(Value::Object(meta))
    }
}

#[async_trait]
impl Backend for GeminiBackend {
    async fn complete(
        &self,
        client: &Client,
        base_url: &str,
        request: &LlmRequest,
    ) -> Result<LlmResponse> {
        let Some(key) = self.api_key.as_deref() else {
            return Err(ProviderError::NotConfigured(
                "no API key configured for Gemini".into(),
            ));
        };

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            base_url.trim_end_matches('/'),
            request.model
        );
        let body = Self::build_body(request);

        let resp = client
            .post(&url)
            .header(API_KEY_HEADER, key)
            .json(&body)
            .send()
            .await?;
        let status = resp.status().as_u16();

        if !resp.status().is_success() {
            return Err(http_error(resp).await);
        }

        let raw = resp.text().await?;
        let json_resp: Value = serde_json::from_str(&raw)?;

        Ok(LlmResponse {
            text: Self::extract_text(&json_resp),
            status,
            metadata: Self::extract_metadata(&json_resp),
        })
    }

    fn name(&self) -> &'static str {
        "gemini"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}
