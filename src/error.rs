//! API error taxonomy
//!
//! Every handler failure is one of these kinds; the `IntoResponse` impl maps
//! each to a status code and the JSON body shape `{"error", "code"}` used
//! across the API. All of them are recoverable at the request boundary.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::password::PasswordError;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The referenced short code does not exist
    #[error("short link not found")]
    NotFound,

    /// No acting user on a request that requires one
    #[error("not logged in")]
    Unauthorized,

    /// The acting user does not own the referenced link
    #[error("wrong user")]
    Forbidden,

    /// Malformed registration input (bad email, empty password, duplicate email)
    #[error("{0}")]
    Validation(String),

    /// Login failure; deliberately the same for unknown email and wrong password
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("internal server error")]
    Password(#[from] PasswordError),

    #[error("internal server error")]
    Session(#[from] jsonwebtoken::errors::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden | Self::InvalidCredentials => StatusCode::FORBIDDEN,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Password(_) | Self::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::Validation(_) => "validation",
            Self::InvalidCredentials => "invalid_credentials",
            Self::Password(_) | Self::Session(_) => "internal",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = ?self, "request failed");
        }

        (
            status,
            Json(json!({
                "error": self.to_string(),
                "code": self.code()
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            ApiError::Validation("existing user".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::InvalidCredentials.status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_internal_errors_do_not_leak_detail() {
        let err = ApiError::Password(PasswordError::Hash("salt exhausted".into()));
        assert_eq!(err.to_string(), "internal server error");
    }
}
