//! Runtime context shared by every orchestrator call.
//!
//! [`EngineCtx`] carries the HTTP client, the provider backend and endpoint,
//! the model settings, the retry controller (with its status register), and
//! the optional persistence collaborator. Build it once and share it.

#[cfg(feature = "gemini")]
use crate::backend::GeminiBackend;
use crate::backend::{Backend, OpenAiBackend};
use crate::classify::ErrorClassifier;
use crate::config::{EngineConfig, ProviderKind};
use crate::error::ConfigError;
use crate::retry::{RetryController, RetryPolicy};
use crate::status::ProviderStatusRegister;
use crate::store::OutreachStore;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// Shared context for orchestrator calls.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use revenue_engine::backend::MockBackend;
/// use revenue_engine::context::EngineCtx;
///
/// let ctx = EngineCtx::builder("http://localhost:8080/v1")
///     .backend(Arc::new(MockBackend::fixed("{}")))
///     .model("test-model")
///     .build()
///     .unwrap();
/// assert_eq!(ctx.base_url, "http://localhost:8080");
/// ```
pub struct EngineCtx {
    /// HTTP client (cheap to clone, `Arc` inside).
    pub client: Client,
    /// Provider base URL without any API path.
    pub base_url: String,
    pub backend: Arc<dyn Backend>,
    pub model: String,
    pub temperature: f64,
    pub retry: RetryController,
    /// Persistence collaborator. Records are dropped when `None`.
    pub store: Option<Arc<dyn OutreachStore>>,
}

impl EngineCtx {
    pub fn builder(base_url: impl Into<String>) -> EngineCtxBuilder {
        EngineCtxBuilder {
            client: None,
            base_url: base_url.into(),
            backend: None,
            model: None,
            temperature: 0.7,
            policy: RetryPolicy::default(),
            classifier: ErrorClassifier::default(),
            register: None,
            store: None,
            timeout: None,
        }
    }

    /// Build a context for the provider named in `config`.
    ///
    /// Uses the process-wide status register.
    pub fn from_config(config: &EngineConfig) -> Result<Self, ConfigError> {
        let key = config.api_key.clone().unwrap_or_default();
        let backend: Arc<dyn Backend> = match config.provider {
            ProviderKind::OpenAi => Arc::new(OpenAiBackend::new().with_api_key(key)),
            #[cfg(feature = "gemini")]
            ProviderKind::Gemini => Arc::new(GeminiBackend::new().with_api_key(key)),
            #[cfg(not(feature = "gemini"))]
            ProviderKind::Gemini => {
                return Err(ConfigError::UnsupportedProvider(config.provider.to_string()))
            }
        };

        EngineCtx::builder(config.base_url())
            .backend(backend)
            .model(config.model())
            .temperature(config.temperature)
            .policy(RetryPolicy::new(config.max_attempts, config.base_delay))
            .timeout(config.timeout)
            .build()
    }
}

impl std::fmt::Debug for EngineCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineCtx")
            .field("base_url", &self.base_url)
            .field("backend", &self.backend.name())
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("retry", &self.retry)
            .field("has_store", &self.store.is_some())
            .finish()
    }
}

/// Builder for [`EngineCtx`].
pub struct EngineCtxBuilder {
    client: Option<Client>,
    base_url: String,
    backend: Option<Arc<dyn Backend>>,
    model: Option<String>,
    temperature: f64,
    policy: RetryPolicy,
    classifier: ErrorClassifier,
    register: Option<Arc<ProviderStatusRegister>>,
    store: Option<Arc<dyn OutreachStore>>,
    timeout: Option<Duration>,
}

impl EngineCtxBuilder {
    /// Set the HTTP client. If not set, one is built with the configured timeout.
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Set the backend. Default: an [`OpenAiBackend`] without a key.
    pub fn backend(mut self, backend: Arc<dyn Backend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn classifier(mut self, classifier: ErrorClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Use a private status register. Default: [`ProviderStatusRegister::global`].
    pub fn register(mut self, register: Arc<ProviderStatusRegister>) -> Self {
        self.register = Some(register);
        self
    }

    /// Set the persistence collaborator. Also receives the action log.
    pub fn store(mut self, store: Arc<dyn OutreachStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the request timeout. Default: 60 seconds.
    ///
    /// Ignored when a custom `Client` is supplied.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<EngineCtx, ConfigError> {
        let client = match self.client {
            Some(client) => client,
            None => Client::builder()
                .timeout(self.timeout.unwrap_or(Duration::from_secs(60)))
                .build()
                .map_err(|e| ConfigError::HttpClient(e.to_string()))?,
        };

        let register = self.register.unwrap_or_else(ProviderStatusRegister::global);
        let mut retry =
            RetryController::new(self.policy, register).with_classifier(self.classifier);
        if let Some(ref store) = self.store {
            retry = retry.with_log(Arc::clone(store));
        }

        Ok(EngineCtx {
            client,
            base_url: normalize_base_url(&self.base_url),
            backend: self
                .backend
                .unwrap_or_else(|| Arc::new(OpenAiBackend::new())),
            model: self
                .model
                .unwrap_or_else(|| ProviderKind::OpenAi.default_model().to_string()),
            temperature: self.temperature,
            retry,
            store: self.store,
        })
    }
}

/// Strip known provider path suffixes from a base URL so backends can
/// append their own paths.
/// e.g. "https://api.groq.com/openai/v1" -> "https://api.groq.com/openai"
fn normalize_base_url(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    // Longest first.
    for suffix in ["/v1/chat/completions", "/v1/chat", "/v1beta", "/v1"] {
        if let Some(stripped) = trimmed.strip_suffix(suffix) {
            return stripped.to_string();
        }
    }
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::ProviderStatus;
    use crate::store::MemoryStore;

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(normalize_base_url("https://api.groq.com/openai/v1/"), "https://api.groq.com/openai");
        assert_eq!(
            normalize_base_url("https://api.groq.com/openai/v1/chat/completions"),
            "https://api.groq.com/openai"
        );
        assert_eq!(
            normalize_base_url("https://generativelanguage.googleapis.com/v1beta"),
            "https://generativelanguage.googleapis.com"
        );
        assert_eq!(normalize_base_url("http://localhost:8080"), "http://localhost:8080");
    }

    #[test]
    fn test_builder_defaults() {
        let ctx = EngineCtx::builder("http://localhost").build().unwrap();
        assert_eq!(ctx.backend.name(), "openai");
        assert!(!ctx.backend.is_configured());
        assert_eq!(ctx.model, "llama3-8b-8192");
        assert_eq!(ctx.retry.policy(), &RetryPolicy::default());
        assert!(ctx.store.is_none());
        assert!(Arc::ptr_eq(ctx.retry.register(), &ProviderStatusRegister::global()));
    }

    #[test]
    fn test_private_register_and_store() {
        let register = Arc::new(ProviderStatusRegister::new());
        register.set(ProviderStatus::Connected);
        let ctx = EngineCtx::builder("http://localhost")
            .register(Arc::clone(&register))
            .store(Arc::new(MemoryStore::new()))
            .build()
            .unwrap();
        assert_eq!(ctx.retry.register().get(), ProviderStatus::Connected);
        assert!(ctx.store.is_some());
        assert!(format!("{ctx:?}").contains("has_store: true"));
    }

    #[test]
    fn test_from_config_openai() {
        let config = EngineConfig::new(ProviderKind::OpenAi)
            .with_api_key("gsk_0123456789abcdef")
            .with_max_attempts(2);
        let ctx = EngineCtx::from_config(&config).unwrap();
        assert_eq!(ctx.backend.name(), "openai");
        assert!(ctx.backend.is_configured());
        assert_eq!(ctx.base_url, "https://api.groq.com/openai");
        assert_eq!(ctx.retry.policy().max_attempts, 2);
    }

    #[cfg(feature = "gemini")]
    #[test]
    fn test_from_config_gemini_without_key() {
        let ctx = EngineCtx::from_config(&EngineConfig::new(ProviderKind::Gemini)).unwrap();
        assert_eq!(ctx.backend.name(), "gemini");
        assert!(!ctx.backend.is_configured());
        assert_eq!(ctx.model, "gemini-1.5-pro");
    }
}
