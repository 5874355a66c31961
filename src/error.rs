//! Error types for the application

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized access")]
    Unauthorized,

    /// Deliberately identical for "does not exist" and "exists but is not
    /// yours" so callers cannot probe for other users' records.
    #[error("{0} not found or unauthorized")]
    NotFoundOrUnauthorized(&'static str),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid or expired invite token")]
    InvalidToken,

    #[error("Invite is not pending")]
    InvalidState,

    #[error("Unknown invite action: {0}")]
    InvalidAction(String),

    #[error("You are not assigned as executor to any user")]
    NoActiveDelegation,

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable machine-readable kind; clients branch on this, not the message.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Database(_) => "database",
            AppError::Validation(_) => "validation",
            AppError::Unauthorized => "unauthorized",
            AppError::NotFoundOrUnauthorized(_) => "not_found_or_unauthorized",
            AppError::NotFound(_) => "not_found",
            AppError::InvalidToken => "invalid_token",
            AppError::InvalidState => "invalid_state",
            AppError::InvalidAction(_) => "invalid_action",
            AppError::NoActiveDelegation => "no_active_delegation",
            AppError::Upstream(_) => "upstream",
            AppError::Internal(_) => "internal",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) | AppError::InvalidToken | AppError::InvalidAction(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::NoActiveDelegation => StatusCode::FORBIDDEN,
            AppError::NotFoundOrUnauthorized(_) | AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidState => StatusCode::CONFLICT,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = match &self {
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                "Database error".to_string()
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {}", e);
                self.to_string()
            }
            AppError::Upstream(e) => {
                tracing::error!("Upstream error: {}", e);
                self.to_string()
            }
            _ => self.to_string(),
        };

        let body = Json(json!({
            "kind": self.kind(),
            "message": message,
        }));

        (self.status(), body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
