//! Unified application error types for Droplink.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the ? operator. The kinds mirror the outcome
//! classes callers must be able to distinguish: validation failures and
//! detected races are expected results, quota and rate denials carry
//! their own kinds so callers can react differently, and the two
//! infrastructure kinds (database, storage) are the retryable ones.

use std::fmt;
use thiserror::Error;

/// Top-level error kind categorization used across the entire application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// The requested resource was not found.
    NotFound,
    /// Input validation failed or a structural invariant was violated.
    Validation,
    /// A detected race or duplicate (slug taken, name sequence exhausted).
    Conflict,
    /// The owner's storage plan limit would be exceeded.
    QuotaExceeded,
    /// Too many uploads inside the sliding window.
    RateLimited,
    /// The caller does not have permission to perform the action.
    Forbidden,
    /// A database error occurred.
    Database,
    /// A blob storage I/O error occurred.
    Storage,
    /// A configuration error occurred.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// An internal invariant was broken.
    Internal,
    /// The service is temporarily unavailable.
    ServiceUnavailable,
}

impl ErrorKind {
    /// Whether the caller is expected to retry with backoff.
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            Self::Database | Self::Storage | Self::ServiceUnavailable
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::Validation => write!(f, "VALIDATION"),
            Self::Conflict => write!(f, "CONFLICT"),
            Self::QuotaExceeded => write!(f, "QUOTA_EXCEEDED"),
            Self::RateLimited => write!(f, "RATE_LIMITED"),
            Self::Forbidden => write!(f, "FORBIDDEN"),
            Self::Database => write!(f, "DATABASE"),
            Self::Storage => write!(f, "STORAGE"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::Internal => write!(f, "INTERNAL"),
            Self::ServiceUnavailable => write!(f, "SERVICE_UNAVAILABLE"),
        }
    }
}

/// The unified application error used throughout Droplink.
///
/// All crate-specific errors are mapped into `AppError` using `From` impls
/// or explicit `.map_err()` calls. This provides a single error type for
/// the entire application boundary.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional structured detail (current usage, limits, etc.).
    pub details: Option<serde_json::Value>,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
            source: Some(Box::new(source)),
        }
    }

    /// Attach structured details for the caller to react to.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Create a quota-exceeded denial carrying the current usage and limit.
    pub fn quota_exceeded(used_bytes: i64, limit_bytes: i64, incoming_bytes: i64) -> Self {
        Self::new(
            ErrorKind::QuotaExceeded,
            format!(
                "Upload of {incoming_bytes} bytes would exceed the storage limit \
                 ({used_bytes} of {limit_bytes} bytes used)"
            ),
        )
        .with_details(serde_json::json!({
            "used_bytes": used_bytes,
            "limit_bytes": limit_bytes,
            "incoming_bytes": incoming_bytes,
        }))
    }

    /// Create a rate-limited denial carrying the window parameters.
    pub fn rate_limited(window_seconds: u64, max_uploads: u32) -> Self {
        Self::new(
            ErrorKind::RateLimited,
            format!("More than {max_uploads} uploads in {window_seconds} seconds"),
        )
        .with_details(serde_json::json!({
            "window_seconds": window_seconds,
            "max_uploads": max_uploads,
        }))
    }

    /// Create a forbidden error.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, message)
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
    }

    /// Create a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Storage, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Create a service-unavailable error.
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ServiceUnavailable, message)
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            details: self.details.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorKind::Storage, format!("I/O error: {err}"), err)
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_details_distinguishable_from_rate() {
        let quota = AppError::quota_exceeded(900, 1000, 200);
        let rate = AppError::rate_limited(60, 30);

        assert_eq!(quota.kind, ErrorKind::QuotaExceeded);
        assert_eq!(rate.kind, ErrorKind::RateLimited);
        assert_ne!(quota.kind, rate.kind);

        let details = quota.details.unwrap();
        assert_eq!(details["used_bytes"], 900);
        assert_eq!(details["limit_bytes"], 1000);
    }

    #[test]
    fn test_infrastructure_kinds() {
        assert!(ErrorKind::Database.is_infrastructure());
        assert!(ErrorKind::Storage.is_infrastructure());
        assert!(!ErrorKind::Conflict.is_infrastructure());
        assert!(!ErrorKind::Validation.is_infrastructure());
    }
}
