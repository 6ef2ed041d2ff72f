use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use xxhash_rust::xxh3::xxh3_128;

use crate::core::markup::{Dialect, Language};
use crate::core::settings::{AudioFormat, Role, Speed, UserSettings, Voice};

/// Result type for synthesis operations
pub type TTSResult<T> = Result<T, TTSError>;

/// Errors returned by synthesis backends.
///
/// These are handed to the caller as-is; nothing in this crate retries.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TTSError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Audio generation failed: {0}")]
    AudioGenerationFailed(String),

    #[error("Synthesis returned no audio")]
    EmptyAudio,
}

impl TTSError {
    /// Caused by the request itself rather than the service or network
    pub fn is_request_error(&self) -> bool {
        matches!(self, Self::InvalidConfiguration(_))
    }
}

/// Everything a backend needs to produce one utterance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SynthesisRequest {
    /// Rendered markup in `dialect`
    pub payload: String,
    pub dialect: Dialect,
    pub voice: Voice,
    pub role: Role,
    pub speed: Speed,
    pub format: AudioFormat,
    pub language: Language,
}

impl SynthesisRequest {
    pub fn new(payload: impl Into<String>, dialect: Dialect, settings: &UserSettings) -> Self {
        Self {
            payload: payload.into(),
            dialect,
            voice: settings.voice,
            role: settings.role,
            speed: settings.speed,
            format: settings.format,
            language: Language::default(),
        }
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    /// Stable hash of every field that affects the produced audio
    pub fn cache_key(&self) -> String {
        let mut s = String::with_capacity(self.payload.len() + 48);
        s.push_str(self.dialect.as_str());
        s.push('|');
        s.push_str(self.voice.as_str());
        s.push('|');
        s.push_str(self.role.as_str());
        s.push('|');
        s.push_str(&format!("{:.3}", self.speed.value()));
        s.push('|');
        s.push_str(self.format.as_str());
        s.push('|');
        s.push_str(self.language.code());
        s.push('|');
        s.push_str(&self.payload);
        let hash = xxh3_128(s.as_bytes());
        format!("{hash:032x}")
    }
}

/// A speech-synthesis backend.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Produce audio for a single request
    async fn synthesize(&self, request: &SynthesisRequest) -> TTSResult<Bytes>;

    /// Short backend name for logs
    fn name(&self) -> &'static str;
}

pub type SharedSynthesizer = Arc<dyn SpeechSynthesizer>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::settings::SettingsDefaults;

    fn request(payload: &str) -> SynthesisRequest {
        SynthesisRequest::new(
            payload,
            Dialect::Inline,
            &UserSettings::from(SettingsDefaults::default()),
        )
    }

    #[test]
    fn test_cache_key_depends_on_every_field() {
        let base = request("Привет");
        let mut other_voice = base.clone();
        other_voice.voice = Voice::Jane;
        let mut other_speed = base.clone();
        other_speed.speed = Speed::new(1.2).unwrap();
        let mut other_dialect = base.clone();
        other_dialect.dialect = Dialect::Legacy;

        let key = base.cache_key();
        assert_eq!(key.len(), 32);
        assert_eq!(key, request("Привет").cache_key());
        assert_ne!(key, request("Пока").cache_key());
        assert_ne!(key, other_voice.cache_key());
        assert_ne!(key, other_speed.cache_key());
        assert_ne!(key, other_dialect.cache_key());
    }

    #[test]
    fn test_request_error_classification() {
        assert!(TTSError::InvalidConfiguration("x".into()).is_request_error());
        assert!(!TTSError::ProviderError("x".into()).is_request_error());
    }
}
