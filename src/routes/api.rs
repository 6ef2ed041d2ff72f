use axum::{
    Router, middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::handlers::{api, translate, webhook};
use crate::middleware::webhook_secret_middleware;
use crate::state::AppState;

/// Telegram webhook routes, guarded by the secret token check
fn webhook_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(webhook::telegram_webhook))
        .route("/webhook", post(webhook::telegram_webhook))
        .route_layer(middleware::from_fn_with_state(
            state,
            webhook_secret_middleware,
        ))
}

/// Create the full application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(api::health_check))
        .route("/health", get(api::health_check))
        .route("/translate", post(translate::translate_markup))
        .merge(webhook_router(state.clone()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
