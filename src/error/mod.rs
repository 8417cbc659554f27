//! Error handling for the dispatch core
//!
//! This module provides:
//! - Classification of failed upstream attempts (`FailureKind`, `ServiceFailure`)
//! - The terminal `ExhaustedError` surfaced when every credential failed
//! - `LocationError`, always recovered by the location layer
//! - The crate-wide `AppError` and `Result` alias

pub mod failure;
pub mod types;

pub use failure::{ExhaustedError, FailureKind, ServiceFailure};

use thiserror::Error;

/// Reasons a position could not be resolved.
///
/// None of these escape `LocationManager::get_location`; the manager substitutes the
/// fallback location and reports the error alongside it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LocationError {
    #[error("Location access denied by user")]
    PermissionDenied,

    #[error("Location information unavailable")]
    PositionUnavailable,

    #[error("Location request timed out")]
    Timeout,

    #[error("Geolocation is not supported by this position source")]
    Unsupported,

    #[error("Reverse geocoding failed: {0}")]
    GeocodeFailed(String),
}

/// Main error type of the crate.
#[derive(Error, Debug)]
pub enum AppError {
    // Configuration errors
    #[error("Configuration validation failed: {message}")]
    ConfigValidation { message: String, field: Option<String> },

    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    #[error("Configuration parse error: {message}")]
    ConfigParse { message: String, line: Option<usize> },

    // Storage errors
    #[error("Storage persistence failed: {message}")]
    StoragePersistence { message: String },

    // HTTP and upstream errors
    #[error("HTTP client error: {message}")]
    HttpClient { message: String, status_code: Option<u16> },

    #[error(transparent)]
    Exhausted(#[from] ExhaustedError),

    #[error("Upstream returned no completion text")]
    EmptyCompletion,

    #[error(transparent)]
    Location(#[from] LocationError),

    // Validation errors
    #[error("Validation failed: {field} - {message}")]
    Validation { field: String, message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("IO operation failed: {operation} - {message}")]
    Io { operation: String, message: String },
}

impl AppError {
    /// Create a new configuration validation error
    pub fn config_validation(message: impl Into<String>, field: Option<impl Into<String>>) -> Self {
        Self::ConfigValidation {
            message: message.into(),
            field: field.map(Into::into),
        }
    }

    /// Create a new internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::StoragePersistence {
            message: message.into(),
        }
    }

    /// Whether a degraded response should be served in place of this error.
    ///
    /// A dispatch rejected before any attempt is a caller error, not an outage.
    pub fn is_degradable(&self) -> bool {
        match self {
            Self::Exhausted(e) => !e.is_rejected(),
            Self::EmptyCompletion => true,
            _ => false,
        }
    }

    /// Stable machine-readable code, used in structured log fields.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ConfigValidation { .. } => "CONFIG_VALIDATION_ERROR",
            Self::ConfigNotFound { .. } => "CONFIG_NOT_FOUND",
            Self::ConfigParse { .. } => "CONFIG_PARSE_ERROR",
            Self::StoragePersistence { .. } => "STORAGE_ERROR",
            Self::HttpClient { .. } => "HTTP_CLIENT_ERROR",
            Self::Exhausted(_) => "CREDENTIALS_EXHAUSTED",
            Self::EmptyCompletion => "EMPTY_COMPLETION",
            Self::Location(_) => "LOCATION_ERROR",
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::Internal { .. } => "INTERNAL_ERROR",
            Self::Serialization { .. } => "SERIALIZATION_ERROR",
            Self::Io { .. } => "IO_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructor_helpers() {
        let err = AppError::config_validation("no keys", Some("weather.api_keys"));
        match err {
            AppError::ConfigValidation { message, field } => {
                assert_eq!(message, "no keys");
                assert_eq!(field.as_deref(), Some("weather.api_keys"));
            }
            other => panic!("unexpected variant: {other:?}"),
        }

        let err = AppError::validation("days", "must be positive");
        assert_eq!(err.to_string(), "Validation failed: days - must be positive");
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_degradable_errors() {
        let exhausted = ExhaustedError {
            service: "weather".to_string(),
            attempts: 2,
            last: ServiceFailure::new(FailureKind::RateLimited, Some(429), "quota", 1),
        };
        assert!(AppError::from(exhausted).is_degradable());
        assert!(AppError::EmptyCompletion.is_degradable());
        assert!(!AppError::internal("boom").is_degradable());

        let rejected = ExhaustedError {
            service: "weather".to_string(),
            attempts: 0,
            last: ServiceFailure::new(FailureKind::BadRequest, None, "bad operation", 0),
        };
        assert!(!AppError::from(rejected).is_degradable());
    }

    #[test]
    fn test_location_error_messages() {
        assert_eq!(
            LocationError::PermissionDenied.to_string(),
            "Location access denied by user"
        );
        assert_eq!(LocationError::Timeout.to_string(), "Location request timed out");
        let err: AppError = LocationError::Unsupported.into();
        assert_eq!(err.error_code(), "LOCATION_ERROR");
    }
}
