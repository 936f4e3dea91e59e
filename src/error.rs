use std::time::Duration;
use thiserror::Error;

/// Raw failures produced by a provider call, before classification.
///
/// This is the input to [`ErrorClassifier`](crate::classify::ErrorClassifier).
/// Backends return it from [`Backend::complete`](crate::backend::Backend::complete);
/// nothing outside the retry controller should need to inspect it.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Low-level HTTP transport failure (connection refused, timeout, etc.).
    ///
    /// Built through `From`, which drops the request URL so query strings
    /// never reach messages or logs.
    #[error("HTTP request failed: {0}")]
    Request(reqwest::Error),

    /// The provider answered 2xx but the envelope was not valid JSON.
    #[error("invalid provider response: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP error with status code, response body, and optional Retry-After hint.
    ///
    /// The `retry_after` field is populated from the `Retry-After` response
    /// header when present. It is informational only; backoff is always the
    /// controller's own exponential schedule.
    #[error("HTTP {status}: {body}")]
    HttpError {
        /// HTTP status code (e.g. 401, 429, 503).
        status: u16,
        /// Response body text.
        body: String,
        /// Parsed `Retry-After` header value, if present.
        retry_after: Option<Duration>,
    },

    /// Credentials are missing; no request was sent.
    #[error("provider not configured: {0}")]
    NotConfigured(String),

    /// Catch-all for other errors.
    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::Request(err.without_url())
    }
}

impl ProviderError {
    /// HTTP status associated with the failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ProviderError::HttpError { status, .. } => Some(*status),
            ProviderError::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Errors from the response extractor and domain validators.
///
/// Every variant surfaces to callers as `PARSING_FAILED`.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// The extracted text is not valid JSON.
    #[error("model output is not valid JSON: {0}")]
    Syntax(#[from] serde_json::Error),

    /// The top-level value was not a JSON object.
    #[error("expected a JSON object at the top level")]
    NotAnObject,

    /// A required field is absent or null.
    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    /// A required field is present but has the wrong JSON type.
    #[error("field '{field}' should be {expected}")]
    WrongType {
        /// Field name as it appears in the model output.
        field: &'static str,
        /// Human-readable expected type.
        expected: &'static str,
    },

    /// A section was present but could not be read into its record type.
    #[error("section '{section}' is malformed: {reason}")]
    Malformed {
        /// Section name as it appears in the model output.
        section: &'static str,
        /// The serde error message.
        reason: String,
    },
}

/// Errors returned by an [`OutreachStore`](crate::store::OutreachStore).
#[derive(Error, Debug)]
pub enum StoreError {
    /// The record was rejected before it reached the backend.
    #[error("invalid record: {0}")]
    Invalid(String),

    /// The storage backend reported a failure.
    #[error("storage backend failed: {0}")]
    Backend(String),
}

/// Errors raised while loading [`EngineConfig`](crate::config::EngineConfig).
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable is set but cannot be parsed.
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar {
        /// Variable name.
        var: String,
        /// Parse failure description.
        reason: String,
    },

    /// A `.env` file could not be read or parsed.
    #[error("failed to read env file {path}: {reason}")]
    EnvFile {
        path: String,
        reason: String,
    },

    /// The provider is known but this build does not include it.
    #[error("provider '{0}' is not available in this build")]
    UnsupportedProvider(String),

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

pub type Result<T> = std::result::Result<T, ProviderError>;
