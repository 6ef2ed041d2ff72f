use axum::{body::Bytes, extract::State, response::Json};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, error};

use crate::errors::{AppError, AppResult};
use crate::state::AppState;
use crate::telegram::Update;

/// Telegram webhook endpoint.
///
/// The update is processed before answering. Failures while talking back to
/// Telegram are logged and still acknowledged so the update is not redelivered.
pub async fn telegram_webhook(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> AppResult<Json<Value>> {
    let bot = state
        .bot
        .as_ref()
        .ok_or_else(|| AppError::ServiceUnavailable("Bot is not configured".to_string()))?;

    let update: Update = serde_json::from_slice(&body).map_err(|e| {
        debug!(error = %e, "Rejecting malformed update");
        AppError::BadRequest(format!("Invalid update: {e}"))
    })?;

    if let Err(e) = bot.handle_update(&update).await {
        error!(update_id = update.update_id, error = %e, "Failed to handle webhook update");
    }

    Ok(Json(json!({"ok": true})))
}
