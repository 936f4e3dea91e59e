//! Mapping raw provider failures onto a fixed error taxonomy.
//!
//! The classifier looks at the HTTP status (when there is one) and sniffs the
//! error text for known phrases. Status 429 is shared by plain throttling and
//! hard quota exhaustion, so the text decides between the two. The phrase
//! lists are heuristics that depend on provider wording, which is why they
//! are configurable on [`ErrorClassifier`].

use crate::error::ProviderError;
use crate::status::{ErrorKind, ProviderStatusRegister};
use serde::{Deserialize, Serialize};

/// Fallback message when a failure carries no usable text.
pub const GENERIC_FAILURE_MESSAGE: &str = "Network or unknown provider error";

/// A provider failure reduced to its kind, a display message, and whether
/// retrying makes sense.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedError {
    /// Failure kind.
    pub kind: ErrorKind,
    /// Human-readable message for the operator.
    pub message: String,
    /// Always equal to `kind.retryable()`.
    pub retryable: bool,
}

impl ClassifiedError {
    /// Build an error whose `retryable` flag follows from `kind`.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable: kind.retryable(),
        }
    }

    /// Build an error that must not be retried, whatever its kind.
    pub(crate) fn fatal(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable: false,
        }
    }
}

impl std::fmt::Display for ClassifiedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ClassifiedError {}

/// Result of any provider-facing call.
pub type GenerationResult<T> = std::result::Result<T, ClassifiedError>;

/// Classifies [`ProviderError`]s and records the derived provider status.
///
/// Rules, first match wins:
///
/// 1. HTTP 401/403, or an auth phrase → `invalid_key`
/// 2. HTTP 429 with a quota phrase → `quota_exceeded`
/// 3. HTTP 429 → `rate_limited`
/// 4. A network phrase → `network_error`
/// 5. Anything else → `network_error` with the raw message (or a generic one)
///
/// # Example
///
/// ```
/// use revenue_engine::classify::ErrorClassifier;
/// use revenue_engine::error::ProviderError;
/// use revenue_engine::status::{ErrorKind, ProviderStatus, ProviderStatusRegister};
///
/// let register = ProviderStatusRegister::new();
/// let err = ProviderError::HttpError { status: 401, body: String::new(), retry_after: None };
/// let classified = ErrorClassifier::default().classify(&err, &register);
/// assert_eq!(classified.kind, ErrorKind::InvalidKey);
/// assert!(!classified.retryable);
/// assert_eq!(register.get(), ProviderStatus::InvalidKey);
/// ```
#[derive(Debug, Clone)]
pub struct ErrorClassifier {
    /// Lowercase phrases indicating a rejected credential.
    pub auth_phrases: Vec<String>,
    /// Lowercase phrases indicating exhausted quota or billing limits.
    pub quota_phrases: Vec<String>,
    /// Lowercase phrases indicating a transport-level problem.
    pub network_phrases: Vec<String>,
}

impl Default for ErrorClassifier {
    fn default() -> Self {
        Self {
            auth_phrases: to_owned(&[
                "api key",
                "api_key",
                "apikey",
                "unauthorized",
                "unauthenticated",
                "permission denied",
                "permission_denied",
                "invalid authentication",
            ]),
            quota_phrases: to_owned(&[
                "quota",
                "resource_exhausted",
                "resource exhausted",
                "insufficient_quota",
                "billing",
            ]),
            network_phrases: to_owned(&[
                "network",
                "timeout",
                "timed out",
                "fetch",
                "connection",
                "connect",
                "dns",
                "error sending request",
            ]),
        }
    }
}

fn to_owned(phrases: &[&str]) -> Vec<String> {
    phrases.iter().map(|p| p.to_string()).collect()
}

fn mentions(haystack: &str, phrases: &[String]) -> bool {
    phrases.iter().any(|p| haystack.contains(p.as_str()))
}

impl ErrorClassifier {
    /// Replace the auth phrase list.
    pub fn with_auth_phrases(mut self, phrases: &[&str]) -> Self {
        self.auth_phrases = to_owned(phrases);
        self
    }

    /// Replace the quota phrase list.
    pub fn with_quota_phrases(mut self, phrases: &[&str]) -> Self {
        self.quota_phrases = to_owned(phrases);
        self
    }

    /// Replace the network phrase list.
    pub fn with_network_phrases(mut self, phrases: &[&str]) -> Self {
        self.network_phrases = to_owned(phrases);
        self
    }

    /// Classify without touching any provider status.
    pub fn kind_of(&self, error: &ProviderError) -> ClassifiedError {
        if let ProviderError::NotConfigured(reason) = error {
            return ClassifiedError::new(ErrorKind::NotConfigured, reason.clone());
        }

        let status = error.status();
        let text = error.to_string();
        let lowered = text.to_lowercase();

        if matches!(status, Some(401) | Some(403)) || mentions(&lowered, &self.auth_phrases) {
            return ClassifiedError::new(ErrorKind::InvalidKey, "Invalid provider API key");
        }

        if status == Some(429) {
            if mentions(&lowered, &self.quota_phrases) {
                return ClassifiedError::new(
                    ErrorKind::QuotaExceeded,
                    "Provider quota exceeded; check billing or plan limits",
                );
            }
            return ClassifiedError::new(ErrorKind::RateLimited, "Rate limit reached");
        }

        if mentions(&lowered, &self.network_phrases) {
            return ClassifiedError::new(
                ErrorKind::NetworkError,
                format!("Network error contacting provider: {}", text),
            );
        }

        let message = if text.trim().is_empty() {
            GENERIC_FAILURE_MESSAGE.to_string()
        } else {
            text
        };
        ClassifiedError::new(ErrorKind::NetworkError, message)
    }

    /// Classify and record the derived status on `register`.
    ///
    /// Never records `connected`; only successful calls do that.
    pub fn classify(
        &self,
        error: &ProviderError,
        register: &ProviderStatusRegister,
    ) -> ClassifiedError {
        let classified = self.kind_of(error);
        register.set(classified.kind.status());
        classified
    }
}
