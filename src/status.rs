//! Process-wide provider health signal.
//!
//! [`ProviderStatusRegister`] holds a single [`ProviderStatus`] in an atomic
//! byte. It is advisory: concurrent calls read and write it without any
//! lock, and the last write wins. The retry controller reads it before each
//! call to fast-fail when the provider is known to be unusable.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};

/// Health classification of the upstream AI provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ProviderStatus {
    /// The last call succeeded.
    Connected = 0,
    /// The provider is throttling requests (transient).
    RateLimited = 1,
    /// The account is out of quota (needs billing/plan change).
    QuotaExceeded = 2,
    /// The API key was rejected (needs key rotation).
    InvalidKey = 3,
    /// Transport failure or unknown provider error (transient).
    NetworkError = 4,
    /// No credentials are configured.
    NotConfigured = 5,
}

impl ProviderStatus {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => ProviderStatus::Connected,
            1 => ProviderStatus::RateLimited,
            2 => ProviderStatus::QuotaExceeded,
            3 => ProviderStatus::InvalidKey,
            4 => ProviderStatus::NetworkError,
            _ => ProviderStatus::NotConfigured,
        }
    }

    /// Wire name, e.g. `"quota_exceeded"`.
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderStatus::Connected => "connected",
            ProviderStatus::RateLimited => "rate_limited",
            ProviderStatus::QuotaExceeded => "quota_exceeded",
            ProviderStatus::InvalidKey => "invalid_key",
            ProviderStatus::NetworkError => "network_error",
            ProviderStatus::NotConfigured => "not_configured",
        }
    }

    /// Statuses that do not heal without outside remediation.
    pub fn is_fatal(self) -> bool {
        matches!(
            self,
            ProviderStatus::QuotaExceeded | ProviderStatus::InvalidKey
        )
    }

    /// The error kind matching this status. `None` for [`ProviderStatus::Connected`].
    pub fn error_kind(self) -> Option<ErrorKind> {
        match self {
            ProviderStatus::Connected => None,
            ProviderStatus::RateLimited => Some(ErrorKind::RateLimited),
            ProviderStatus::QuotaExceeded => Some(ErrorKind::QuotaExceeded),
            ProviderStatus::InvalidKey => Some(ErrorKind::InvalidKey),
            ProviderStatus::NetworkError => Some(ErrorKind::NetworkError),
            ProviderStatus::NotConfigured => Some(ErrorKind::NotConfigured),
        }
    }
}

impl fmt::Display for ProviderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of a classified provider failure.
///
/// Mirrors [`ProviderStatus`] minus `Connected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// HTTP 401/403 or an authorization phrase.
    InvalidKey,
    /// HTTP 429 with a quota/resource-exhaustion phrase.
    QuotaExceeded,
    /// HTTP 429 without a quota phrase.
    RateLimited,
    /// Transport failure, or anything unrecognized.
    NetworkError,
    /// Credentials missing; detected before any call.
    NotConfigured,
}

impl ErrorKind {
    /// Whether a failure of this kind is worth retrying. Depends on the kind only.
    pub fn retryable(self) -> bool {
        matches!(self, ErrorKind::RateLimited | ErrorKind::NetworkError)
    }

    /// The provider status recorded when this kind is observed.
    pub fn status(self) -> ProviderStatus {
        match self {
            ErrorKind::InvalidKey => ProviderStatus::InvalidKey,
            ErrorKind::QuotaExceeded => ProviderStatus::QuotaExceeded,
            ErrorKind::RateLimited => ProviderStatus::RateLimited,
            ErrorKind::NetworkError => ProviderStatus::NetworkError,
            ErrorKind::NotConfigured => ProviderStatus::NotConfigured,
        }
    }

    /// Wire name, e.g. `"rate_limited"`.
    pub fn as_str(self) -> &'static str {
        self.status().as_str()
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lock-free holder of the current [`ProviderStatus`].
///
/// # Example
///
/// ```
/// use revenue_engine::status::{ProviderStatus, ProviderStatusRegister};
///
/// let register = ProviderStatusRegister::new();
/// assert_eq!(register.get(), ProviderStatus::NotConfigured);
/// register.set(ProviderStatus::Connected);
/// assert_eq!(register.get(), ProviderStatus::Connected);
/// ```
#[derive(Debug)]
pub struct ProviderStatusRegister {
    current: AtomicU8,
}

impl ProviderStatusRegister {
    /// A fresh register, starting at [`ProviderStatus::NotConfigured`].
    pub const fn new() -> Self {
        Self {
            current: AtomicU8::new(ProviderStatus::NotConfigured as u8),
        }
    }

    /// The register shared by every engine in this process that was not
    /// given its own.
    pub fn global() -> Arc<ProviderStatusRegister> {
        static GLOBAL: OnceLock<Arc<ProviderStatusRegister>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(ProviderStatusRegister::new())))
    }

    /// Current status.
    pub fn get(&self) -> ProviderStatus {
        ProviderStatus::from_u8(self.current.load(Ordering::Relaxed))
    }

    /// Overwrite the current status. No validation, last write wins.
    pub fn set(&self, status: ProviderStatus) {
        self.current.store(status as u8, Ordering::Relaxed);
    }
}

impl Default for ProviderStatusRegister {
    fn default() -> Self {
        Self::new()
    }
}
