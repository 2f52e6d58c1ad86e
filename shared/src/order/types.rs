//! Shared types for order mutations
//!
//! Every mutation entry point returns a [`MutationResponse`] - failures are
//! data, never panics, so UI collaborators can render them directly.

use serde::{Deserialize, Serialize};

/// Uniform mutation result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MutationResponse {
    /// Whether the mutation reached the store
    pub success: bool,
    /// Error details if failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<MutationError>,
}

impl MutationResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failure(error: MutationError) -> Self {
        Self {
            success: false,
            error: Some(error),
        }
    }

    /// Error code of a failed response, if any
    pub fn code(&self) -> Option<MutationErrorCode> {
        self.error.as_ref().map(|e| e.code)
    }

    /// Whether this failure was the single-flight guard rejecting a
    /// concurrent mutation
    pub fn is_busy(&self) -> bool {
        self.code() == Some(MutationErrorCode::Busy)
    }
}

/// Mutation error
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, thiserror::Error)]
#[error("{code:?}: {message}")]
pub struct MutationError {
    pub code: MutationErrorCode,
    pub message: String,
}

impl MutationError {
    pub fn new(code: MutationErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Mutation error codes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MutationErrorCode {
    /// Target order vanished between read and write; never retried
    NotFound,
    /// Another mutation is in flight; caller should retry later
    Busy,
    /// Malformed caller input (empty id, bad patch)
    Validation,
    /// Transport-level store failure
    Connection,
    /// Anything the engine cannot classify
    Internal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_response() {
        let resp = MutationResponse::ok();
        assert!(resp.success);
        assert!(resp.error.is_none());
        assert!(!resp.is_busy());
    }

    #[test]
    fn test_failure_carries_code() {
        let resp = MutationResponse::failure(MutationError::new(
            MutationErrorCode::NotFound,
            "Order not found: o1",
        ));
        assert!(!resp.success);
        assert_eq!(resp.code(), Some(MutationErrorCode::NotFound));
    }

    #[test]
    fn test_busy_detection() {
        let resp = MutationResponse::failure(MutationError::new(
            MutationErrorCode::Busy,
            "mutation in flight",
        ));
        assert!(resp.is_busy());
    }

    #[test]
    fn test_error_code_serializes_screaming() {
        let json = serde_json::to_string(&MutationErrorCode::NotFound).unwrap();
        assert_eq!(json, "\"NOT_FOUND\"");
    }

    #[test]
    fn test_success_response_omits_error_field() {
        let json = serde_json::to_value(MutationResponse::ok()).unwrap();
        assert!(json.get("error").is_none());
    }
}
