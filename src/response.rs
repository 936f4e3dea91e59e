//! Tagged results returned across the orchestrator boundary.
//!
//! Serializes as `{"status":"success","data":...}` or
//! `{"status":"error","error":{"code":...,"message":...,"retryable":...}}`.

use crate::classify::ClassifiedError;
use crate::error::ValidationError;
use crate::status::ErrorKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Error code on a failed [`ServiceResponse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    #[serde(rename = "invalid_key")]
    InvalidKey,
    #[serde(rename = "quota_exceeded")]
    QuotaExceeded,
    #[serde(rename = "rate_limited")]
    RateLimited,
    #[serde(rename = "network_error")]
    NetworkError,
    #[serde(rename = "not_configured")]
    NotConfigured,
    /// The provider answered but the output did not match the requested shape.
    #[serde(rename = "PARSING_FAILED")]
    ParsingFailed,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidKey => "invalid_key",
            ErrorCode::QuotaExceeded => "quota_exceeded",
            ErrorCode::RateLimited => "rate_limited",
            ErrorCode::NetworkError => "network_error",
            ErrorCode::NotConfigured => "not_configured",
            ErrorCode::ParsingFailed => "PARSING_FAILED",
        }
    }
}

impl From<ErrorKind> for ErrorCode {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::InvalidKey => ErrorCode::InvalidKey,
            ErrorKind::QuotaExceeded => ErrorCode::QuotaExceeded,
            ErrorKind::RateLimited => ErrorCode::RateLimited,
            ErrorKind::NetworkError => ErrorCode::NetworkError,
            ErrorKind::NotConfigured => ErrorCode::NotConfigured,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error payload of a [`ServiceResponse`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceError {
    pub code: ErrorCode,
    pub message: String,
    pub retryable: bool,
}

impl ServiceError {
    /// A non-retryable `PARSING_FAILED` error.
    pub fn parsing_failed(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::ParsingFailed,
            message: message.into(),
            retryable: false,
        }
    }
}

impl From<ClassifiedError> for ServiceError {
    fn from(err: ClassifiedError) -> Self {
        Self {
            code: err.kind.into(),
            message: err.message,
            retryable: err.retryable,
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        Self::parsing_failed(err.to_string())
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ServiceError {}

/// Outcome of an orchestrator call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ServiceResponse<T> {
    Success { data: T },
    Error { error: ServiceError },
}

impl<T> ServiceResponse<T> {
    pub fn success(data: T) -> Self {
        ServiceResponse::Success { data }
    }

    pub fn error(error: impl Into<ServiceError>) -> Self {
        ServiceResponse::Error {
            error: error.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ServiceResponse::Success { .. })
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            ServiceResponse::Success { data } => Some(data),
            ServiceResponse::Error { .. } => None,
        }
    }

    pub fn error_ref(&self) -> Option<&ServiceError> {
        match self {
            ServiceResponse::Success { .. } => None,
            ServiceResponse::Error { error } => Some(error),
        }
    }

    /// Convert into a plain `Result`.
    pub fn into_result(self) -> Result<T, ServiceError> {
        match self {
            ServiceResponse::Success { data } => Ok(data),
            ServiceResponse::Error { error } => Err(error),
        }
    }
}
