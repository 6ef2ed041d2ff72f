use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::core::markup::MarkupError;

pub type AppResult<T> = Result<T, AppError>;

/// Errors returned by HTTP handlers and middleware
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error(transparent)]
    Markup(#[from] MarkupError),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Markup(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::Markup(MarkupError::Validation {
                token,
                position,
                reason,
            }) => json!({
                "error": self.to_string(),
                "token": token,
                "position": position,
                "reason": reason,
            }),
            Self::Markup(MarkupError::UnsupportedDialect {
                dialect,
                feature,
                token,
            }) => json!({
                "error": self.to_string(),
                "dialect": dialect.as_str(),
                "feature": feature,
                "token": token,
            }),
            // Internal details stay in the logs
            Self::Internal(_) => json!({"error": "Internal server error"}),
            _ => json!({"error": self.to_string()}),
        };

        (status, Json(body)).into_response()
    }
}
