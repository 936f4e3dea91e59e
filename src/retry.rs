//! Bounded retry with exponential backoff and a status circuit breaker.
//!
//! [`RetryController::run`] wraps one provider call. Before the first
//! attempt it reads the shared [`ProviderStatusRegister`]: a fatal status
//! (`invalid_key`, `quota_exceeded`) returns at once without calling the
//! operation. Otherwise failures are classified, logged, and retried while
//! the classification says so, sleeping `base_delay * 2^attempt` between
//! attempts. There is no jitter and no cap beyond `max_attempts`.

use crate::classify::{ClassifiedError, ErrorClassifier, GenerationResult, GENERIC_FAILURE_MESSAGE};
use crate::error::ProviderError;
use crate::status::{ErrorKind, ProviderStatus, ProviderStatusRegister};
use crate::store::OutreachStore;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Attempt budget and backoff base.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use revenue_engine::retry::RetryPolicy;
///
/// let policy = RetryPolicy::default();
/// assert_eq!(policy.max_attempts, 3);
/// assert_eq!(policy.delay_for_attempt(0), Duration::from_millis(1000));
/// assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(4000));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Never below 1.
    pub max_attempts: u32,

    /// Delay before the second attempt; doubles after each failure.
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// A policy with the given attempt count (clamped to at least 1).
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// One attempt, no backoff.
    pub fn single() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Sleep after failed attempt `attempt` (0-indexed): `base_delay * 2^attempt`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(1000))
    }
}

/// Runs provider operations under a [`RetryPolicy`].
///
/// Cheap to clone; concurrent `run` calls share only the status register.
#[derive(Clone)]
pub struct RetryController {
    policy: RetryPolicy,
    classifier: ErrorClassifier,
    register: Arc<ProviderStatusRegister>,
    log: Option<Arc<dyn OutreachStore>>,
}

impl std::fmt::Debug for RetryController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryController")
            .field("policy", &self.policy)
            .field("status", &self.register.get())
            .field("log", &self.log.is_some())
            .finish()
    }
}

impl RetryController {
    pub fn new(policy: RetryPolicy, register: Arc<ProviderStatusRegister>) -> Self {
        Self {
            policy,
            classifier: ErrorClassifier::default(),
            register,
            log: None,
        }
    }

    pub fn with_classifier(mut self, classifier: ErrorClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Send every attempt outcome to `store.log_action`.
    pub fn with_log(mut self, store: Arc<dyn OutreachStore>) -> Self {
        self.log = Some(store);
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn classifier(&self) -> &ErrorClassifier {
        &self.classifier
    }

    pub fn register(&self) -> &Arc<ProviderStatusRegister> {
        &self.register
    }

    async fn log_outcome(&self, action: &str, model: &str, error: Option<ErrorKind>) {
        if let Some(ref store) = self.log {
            store.log_action(action, model, error).await;
        }
    }

    /// Run `operation` until it succeeds, fails fatally, or runs out of attempts.
    ///
    /// `action` and `model` tag the log entries, e.g. `("GENERATE_LEADS", "gemini-1.5-pro")`.
    pub async fn run<T, F, Fut>(
        &self,
        action: &str,
        model: &str,
        mut operation: F,
    ) -> GenerationResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let current = self.register.get();
        if current.is_fatal() {
            if let Some(kind) = current.error_kind() {
                tracing::warn!(action, status = %current, "provider blocked; skipping call");
                return Err(ClassifiedError::fatal(
                    kind,
                    format!("Provider unavailable ({current}); fix credentials or quota first"),
                ));
            }
        }

        let max_attempts = self.policy.max_attempts.max(1);
        for attempt in 0..max_attempts {
            match operation().await {
                Ok(value) => {
                    self.register.set(ProviderStatus::Connected);
                    self.log_outcome(action, model, None).await;
                    tracing::debug!(action, model, attempt = attempt + 1, "provider call succeeded");
                    return Ok(value);
                }
                Err(err) => {
                    let classified = self.classifier.classify(&err, &self.register);
                    self.log_outcome(action, model, Some(classified.kind)).await;

                    if !classified.retryable || attempt + 1 >= max_attempts {
                        tracing::warn!(
                            action,
                            model,
                            attempt = attempt + 1,
                            error_kind = %classified.kind,
                            error = %err,
                            "provider call failed"
                        );
                        return Err(classified);
                    }

                    let delay = self.policy.delay_for_attempt(attempt);
                    tracing::warn!(
                        action,
                        attempt = attempt + 1,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error_kind = %classified.kind,
                        error = %err,
                        "transient provider error, retrying after backoff"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }

        Err(ClassifiedError::fatal(
            ErrorKind::NetworkError,
            GENERIC_FAILURE_MESSAGE,
        ))
    }
}
