//! Telegram webhook authentication.
//!
//! When `TELEGRAM_WEBHOOK_SECRET` is configured, Telegram echoes it back in the
//! `X-Telegram-Bot-Api-Secret-Token` header of every webhook call. Requests
//! without a matching header are rejected with 401.
//!
//! # Example
//!
//! ```ignore
//! let app = Router::new()
//!     .route("/webhook", post(webhook::telegram_webhook))
//!     .layer(axum::middleware::from_fn_with_state(
//!         state.clone(),
//!         webhook_secret_middleware,
//!     ));
//! ```

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use subtle::ConstantTimeEq;

use crate::errors::AppError;
use crate::state::AppState;

pub const SECRET_TOKEN_HEADER: &str = "x-telegram-bot-api-secret-token";

/// Compare secrets without leaking the mismatch position through timing
fn secret_matches(provided: &str, expected: &str) -> bool {
    provided.as_bytes().ct_eq(expected.as_bytes()).into()
}

pub async fn webhook_secret_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(expected) = state
        .config
        .telegram_webhook_secret
        .as_deref()
        .filter(|s| !s.is_empty())
    else {
        return Ok(next.run(request).await);
    };

    let provided = request
        .headers()
        .get(SECRET_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok());

    match provided {
        Some(token) if secret_matches(token, expected) => Ok(next.run(request).await),
        Some(_) => {
            tracing::warn!(path = %request.uri().path(), "Webhook secret mismatch");
            Err(AppError::Unauthorized("Invalid webhook secret".to_string()))
        }
        None => {
            tracing::warn!(path = %request.uri().path(), "Webhook call without secret header");
            Err(AppError::Unauthorized("Missing webhook secret".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_matches() {
        assert!(secret_matches("s3cret", "s3cret"));
        assert!(!secret_matches("s3cret", "s3creT"));
        assert!(!secret_matches("s3c", "s3cret"));
        assert!(!secret_matches("", "s3cret"));
    }
}
