//! # Error Types
//!
//! Hub RPC failures carry a status code so both transports (HTTP and
//! loopback) classify them the same way.

use serde::{Deserialize, Serialize};
use shared_crypto::CryptoError;
use std::fmt;
use thiserror::Error;

/// Status code of a failed hub RPC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HubStatus {
    /// Malformed request (same origin and destination, bad payload).
    InvalidArgument,
    /// Destination chain not served here.
    NotFound,
    /// Signature missing or invalid.
    Unauthenticated,
    /// Peer unreachable.
    Unavailable,
    /// Per-call deadline elapsed.
    DeadlineExceeded,
    /// Anything else.
    Internal,
}

impl HubStatus {
    /// HTTP status used by the HTTP transport.
    pub fn http_code(&self) -> u16 {
        match self {
            HubStatus::InvalidArgument => 400,
            HubStatus::Unauthenticated => 401,
            HubStatus::NotFound => 404,
            HubStatus::Internal => 500,
            HubStatus::Unavailable => 503,
            HubStatus::DeadlineExceeded => 504,
        }
    }
}

impl fmt::Display for HubStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HubStatus::InvalidArgument => "InvalidArgument",
            HubStatus::NotFound => "NotFound",
            HubStatus::Unauthenticated => "Unauthenticated",
            HubStatus::Unavailable => "Unavailable",
            HubStatus::DeadlineExceeded => "DeadlineExceeded",
            HubStatus::Internal => "Internal",
        };
        f.write_str(name)
    }
}

/// Hub RPC error.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
#[error("{status}: {message}")]
pub struct HubError {
    pub status: HubStatus,
    pub message: String,
}

impl HubError {
    pub fn new(status: HubStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(HubStatus::InvalidArgument, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(HubStatus::NotFound, message)
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::new(HubStatus::Unauthenticated, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(HubStatus::Unavailable, message)
    }

    pub fn deadline_exceeded(message: impl Into<String>) -> Self {
        Self::new(HubStatus::DeadlineExceeded, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(HubStatus::Internal, message)
    }

    /// Whether the client re-dials on this error.
    pub fn is_deadline_exceeded(&self) -> bool {
        self.status == HubStatus::DeadlineExceeded
    }

    /// Network-level failures that may succeed later.
    pub fn is_transient(&self) -> bool {
        matches!(
            self.status,
            HubStatus::Unavailable | HubStatus::DeadlineExceeded | HubStatus::Internal
        )
    }
}

impl From<CryptoError> for HubError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::MissingPrivateKey(_) => HubError::not_found(err.to_string()),
            CryptoError::SigningFailed(_) => HubError::internal(err.to_string()),
            CryptoError::EmptyDigest => HubError::invalid_argument(err.to_string()),
            _ => HubError::unauthenticated(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_json_names() {
        let err = HubError::deadline_exceeded("slow");
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("DEADLINE_EXCEEDED"));
        let back: HubError = serde_json::from_str(&json).unwrap();
        assert!(back.is_deadline_exceeded());
    }

    #[test]
    fn test_classification() {
        assert!(HubError::unavailable("x").is_transient());
        assert!(!HubError::unauthenticated("x").is_transient());
        assert!(!HubError::not_found("x").is_transient());
        assert_eq!(HubStatus::NotFound.http_code(), 404);
    }

    #[test]
    fn test_crypto_error_mapping() {
        let err: HubError = CryptoError::MissingPublicKey("B".into()).into();
        assert_eq!(err.status, HubStatus::Unauthenticated);
        let err: HubError = CryptoError::EmptyDigest.into();
        assert_eq!(err.status, HubStatus::InvalidArgument);
        let err: HubError = CryptoError::MissingPrivateKey("Z".into()).into();
        assert_eq!(err.status, HubStatus::NotFound);
        assert!(!err.is_transient());
    }
}
