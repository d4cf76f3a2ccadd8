//! HTTP error mapping
//! Mission: One JSON error shape; nothing internal leaks to clients

use crate::auth::AuthError;
use crate::store::StoreError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Serialize;
use std::fmt::Display;
use thiserror::Error;
use tracing::error;

/// Message for every failed login, whatever the cause
pub const INVALID_CREDENTIALS: &str = "invalid credentials";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error(transparent)]
    Auth(#[from] AuthError),
    /// Resource-level denial (e.g. not the owner), distinct from role checks
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Conflict(String),
    #[error("internal server error")]
    Internal,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub status: u16,
    pub message: String,
    pub timestamp: i64,
}

impl ApiError {
    /// Log an infrastructure failure and collapse it into a bare 500
    pub fn internal(err: impl Display) -> Self {
        error!("Internal error: {}", err);
        ApiError::Internal
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::Auth(e) => e.status(),
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Auth(e) => e.public_message().to_string(),
            other => other.to_string(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(what) => ApiError::Conflict(format!("{} already exists", what)),
            StoreError::NotFound(what) => ApiError::NotFound(format!("{} not found", what)),
            StoreError::Backend(e) => ApiError::internal(format!("{:#}", e)),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse {
            status: status.as_u16(),
            message: self.message(),
            timestamp: Utc::now().timestamp_millis(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_statuses() {
        assert_eq!(
            ApiError::InvalidCredentials.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Auth(AuthError::Forbidden).into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::Forbidden("not yours").into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::NotFound("post 1 not found".into()).into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Conflict("user a already exists".into()).into_response().status(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_store_errors_map_to_statuses() {
        let conflict: ApiError = StoreError::Conflict("user alice".into()).into();
        assert_eq!(conflict.status(), StatusCode::CONFLICT);

        let missing: ApiError = StoreError::NotFound("post 3".into()).into();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let backend: ApiError = StoreError::Backend(anyhow::anyhow!("disk on fire")).into();
        assert_eq!(backend.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!backend.message().contains("disk"));
    }

    #[test]
    fn test_auth_errors_keep_generic_message() {
        let err = ApiError::Auth(AuthError::InvalidSignature);
        assert_eq!(err.message(), "Authentication required");
    }
}
