use axum::{extract::State, response::Json};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::core::markup::{Dialect, Rendered, translate};
use crate::errors::{AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TranslateRequest {
    pub text: String,
    /// Dialect of `text`, `inline` when omitted
    #[serde(default)]
    pub source: Option<String>,
    /// Dialect to render, `legacy` when omitted
    #[serde(default)]
    pub target: Option<String>,
}

fn dialect_param(value: Option<&str>, default: Dialect, name: &str) -> AppResult<Dialect> {
    match value {
        None => Ok(default),
        Some(raw) => Dialect::from_name(raw).ok_or_else(|| {
            AppError::BadRequest(format!(
                "Unknown {name} dialect '{raw}'. Expected inline or legacy"
            ))
        }),
    }
}

/// Convert markup between the inline and legacy dialects without synthesis
pub async fn translate_markup(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TranslateRequest>,
) -> AppResult<Json<Rendered>> {
    let request_id = Uuid::new_v4();
    let source = dialect_param(request.source.as_deref(), Dialect::Inline, "source")?;
    let target = dialect_param(request.target.as_deref(), Dialect::Legacy, "target")?;

    match translate(&request.text, source, target, state.pipeline.markup_config()) {
        Ok(rendered) => {
            info!(
                request_id = %request_id,
                source = %source,
                target = %target,
                chars = request.text.chars().count(),
                warnings = rendered.warnings.len(),
                "Markup translated"
            );
            Ok(Json(rendered))
        }
        Err(e) => {
            warn!(request_id = %request_id, error = %e, "Markup rejected");
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_param() {
        assert_eq!(
            dialect_param(None, Dialect::Legacy, "target").unwrap(),
            Dialect::Legacy
        );
        assert_eq!(
            dialect_param(Some("ssml"), Dialect::Inline, "source").unwrap(),
            Dialect::Legacy
        );
        let err = dialect_param(Some("morse"), Dialect::Inline, "source").unwrap_err();
        assert!(err.to_string().contains("morse"));
    }
}
