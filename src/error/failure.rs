// src/error/failure.rs

use reqwest::StatusCode;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

const MAX_MESSAGE_LEN: usize = 256;

/// Classification of a single failed upstream attempt.
///
/// The retry policy treats every kind the same way (advance to the next key); the kind is
/// kept for logging and for the final `ExhaustedError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    AuthError,
    RateLimited,
    NetworkError,
    BadRequest,
    Unknown,
}

impl FailureKind {
    /// Maps an upstream HTTP status to a failure kind.
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Self::AuthError,
            StatusCode::TOO_MANY_REQUESTS => Self::RateLimited,
            StatusCode::BAD_REQUEST => Self::BadRequest,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthError => "auth_error",
            Self::RateLimited => "rate_limited",
            Self::NetworkError => "network_error",
            Self::BadRequest => "bad_request",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detail of one failed attempt against one credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceFailure {
    pub kind: FailureKind,
    /// HTTP status, absent when no response was received.
    pub status: Option<u16>,
    pub message: String,
    /// Position of the credential in its `CredentialSet`.
    pub key_index: usize,
}

impl ServiceFailure {
    pub fn new(
        kind: FailureKind,
        status: Option<u16>,
        message: impl Into<String>,
        key_index: usize,
    ) -> Self {
        Self {
            kind,
            status,
            message: message.into(),
            key_index,
        }
    }

    /// Builds a failure from a non-success upstream response.
    ///
    /// Google-style bodies (`{"error": {"message": ..}}`) contribute their message; any other
    /// body is kept verbatim, truncated.
    pub fn from_response(status: StatusCode, body: &str, key_index: usize) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|json| {
                json.pointer("/error/message")
                    .and_then(|m| m.as_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| truncate(body));

        Self::new(
            FailureKind::from_status(status),
            Some(status.as_u16()),
            message,
            key_index,
        )
    }

    /// Builds a failure from a transport-level error.
    ///
    /// Errors that never produced a response (connect, timeout, request setup) are
    /// `NetworkError`; a body that failed to decode after a response is `Unknown`.
    pub fn from_transport(err: &reqwest::Error, key_index: usize) -> Self {
        if err.is_decode() {
            return Self::new(
                FailureKind::Unknown,
                err.status().map(|s| s.as_u16()),
                format!("Failed to decode upstream body: {err}"),
                key_index,
            );
        }

        match err.status() {
            Some(status) => Self::new(
                FailureKind::from_status(status),
                Some(status.as_u16()),
                err.to_string(),
                key_index,
            ),
            None => Self::new(FailureKind::NetworkError, None, err.to_string(), key_index),
        }
    }
}

impl fmt::Display for ServiceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(
                f,
                "{} (status {}) on key #{}: {}",
                self.kind,
                status,
                self.key_index + 1,
                self.message
            ),
            None => write!(f, "{} on key #{}: {}", self.kind, self.key_index + 1, self.message),
        }
    }
}

/// Every credential of a service failed within one logical call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("All {attempts} credential attempt(s) for '{service}' failed; last: {last}")]
pub struct ExhaustedError {
    pub service: String,
    pub attempts: usize,
    /// The failure of the final attempt, not the first.
    pub last: ServiceFailure,
}

impl ExhaustedError {
    pub fn kind(&self) -> FailureKind {
        self.last.kind
    }

    /// The call was refused before any credential was tried (bad operation or parameters).
    pub fn is_rejected(&self) -> bool {
        self.attempts == 0 && self.last.kind == FailureKind::BadRequest
    }
}

fn truncate(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= MAX_MESSAGE_LEN {
        return trimmed.to_string();
    }
    let mut out: String = trimmed.chars().take(MAX_MESSAGE_LEN).collect();
    out.push_str("...");
    out
}
