//! Markup translator error types

use thiserror::Error;

use super::config::Dialect;

/// Result type for markup operations
pub type MarkupResult<T> = Result<T, MarkupError>;

/// Errors raised while parsing, validating or rendering markup.
///
/// Both variants are scoped to a single request: they never poison shared
/// state and are always safe to report back to the sender.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarkupError {
    /// Malformed or out-of-range markup token
    #[error("Invalid markup '{token}' at position {position}: {reason}")]
    Validation {
        /// The offending fragment exactly as it appeared in the input
        token: String,
        /// Char offset of the fragment in the input
        position: usize,
        /// Human-readable explanation
        reason: String,
    },

    /// The document holds a feature the target dialect cannot express
    #[error("The {dialect} dialect cannot represent {feature} ('{token}')")]
    UnsupportedDialect {
        dialect: Dialect,
        feature: &'static str,
        token: String,
    },
}

impl MarkupError {
    pub(crate) fn validation(
        token: impl Into<String>,
        position: usize,
        reason: impl Into<String>,
    ) -> Self {
        Self::Validation {
            token: token.into(),
            position,
            reason: reason.into(),
        }
    }

    /// The offending fragment, for user-facing messages
    pub fn token(&self) -> &str {
        match self {
            Self::Validation { token, .. } | Self::UnsupportedDialect { token, .. } => token,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}
