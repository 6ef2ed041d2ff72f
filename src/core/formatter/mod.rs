//! Optional auto-formatting: rewrite plain text with pause and stress marks
//! before it reaches the markup translator.
//!
//! Formatter output is untrusted. It is parsed and validated exactly like
//! text a user typed.

mod rules;
mod yandex_gpt;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

pub use rules::{CLAUSE_PAUSE_MS, RuleFormatter, SENTENCE_PAUSE_MS};
pub use yandex_gpt::{GptConfig, YANDEX_GPT_URL, YandexGptFormatter};

/// Result type for formatter operations
pub type FormatResult<T> = Result<T, FormatError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("Invalid formatter configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Formatter request failed: {0}")]
    Network(String),

    #[error("Formatter API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Unexpected formatter response: {0}")]
    InvalidResponse(String),
}

impl FormatError {
    /// Failures that should not be papered over with a fallback
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::InvalidConfiguration(_) => true,
            Self::Api { status, .. } => matches!(status, 401 | 403),
            Self::Network(_) | Self::InvalidResponse(_) => false,
        }
    }
}

/// Turns plain text into annotated text.
#[async_trait]
pub trait TextFormatter: Send + Sync {
    async fn format(&self, text: &str) -> FormatResult<String>;

    /// Short name for logs
    fn name(&self) -> &'static str;
}

pub type SharedFormatter = Arc<dyn TextFormatter>;
