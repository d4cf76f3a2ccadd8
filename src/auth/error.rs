//! Authentication and authorization failures

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Every way a request can fail the auth layer.
///
/// Per-request variants are terminal for that request and never retried.
/// `HashingFailure` is the only process-level condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("missing bearer credential")]
    MissingCredential,
    #[error("malformed token")]
    Malformed,
    #[error("invalid token signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("insufficient role")]
    Forbidden,
    #[error("password hashing failed")]
    HashingFailure,
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::MissingCredential
            | AuthError::Malformed
            | AuthError::InvalidSignature
            | AuthError::Expired => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden => StatusCode::FORBIDDEN,
            AuthError::HashingFailure => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing text. Deliberately coarse: it never distinguishes token
    /// failure modes beyond the status code.
    pub fn public_message(&self) -> &'static str {
        match self.status() {
            StatusCode::UNAUTHORIZED => "Authentication required",
            StatusCode::FORBIDDEN => "Insufficient permissions",
            _ => "Internal server error",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (self.status(), self.public_message()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_responses() {
        for err in [
            AuthError::MissingCredential,
            AuthError::Malformed,
            AuthError::InvalidSignature,
            AuthError::Expired,
        ] {
            assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
        }

        assert_eq!(
            AuthError::Forbidden.into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AuthError::HashingFailure.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_token_failures_share_one_message() {
        assert_eq!(
            AuthError::Expired.public_message(),
            AuthError::InvalidSignature.public_message()
        );
        assert_eq!(
            AuthError::Malformed.public_message(),
            AuthError::MissingCredential.public_message()
        );
    }
}
