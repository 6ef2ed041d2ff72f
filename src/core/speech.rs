//! Message-to-audio pipeline.
//!
//! settings → optional auto-format → parse/validate/render → synthesize

use std::sync::Arc;

use bytes::Bytes;
use thiserror::Error;
use tracing::{debug, info};

use crate::core::formatter::{FormatError, SharedFormatter};
use crate::core::markup::{self, Dialect, MarkupConfig, MarkupError, RenderWarning};
use crate::core::settings::{AudioFormat, SettingsStore, UserId};
use crate::core::tts::{SharedSynthesizer, SynthesisRequest, TTSError};

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error(transparent)]
    Markup(#[from] MarkupError),

    #[error(transparent)]
    Synthesis(#[from] TTSError),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("Nothing to synthesize")]
    EmptyText,
}

pub type SpeechResult<T> = Result<T, SpeechError>;

/// How the incoming text should be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpeakMode {
    /// Text in the user's chosen dialect
    #[default]
    Plain,
    /// Legacy markup sent explicitly, synthesized as legacy
    Ssml,
}

impl SpeakMode {
    fn dialects(&self, user_dialect: Dialect) -> (Dialect, Dialect) {
        match self {
            Self::Plain => (user_dialect, user_dialect),
            Self::Ssml => (Dialect::Legacy, Dialect::Legacy),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SpeechOutput {
    pub audio: Bytes,
    pub format: AudioFormat,
    /// Payload actually sent to the synthesizer
    pub payload: String,
    pub warnings: Vec<RenderWarning>,
}

pub struct SpeechPipeline {
    settings: Arc<dyn SettingsStore>,
    synthesizer: SharedSynthesizer,
    formatter: Option<SharedFormatter>,
    markup: MarkupConfig,
}

impl SpeechPipeline {
    pub fn new(
        settings: Arc<dyn SettingsStore>,
        synthesizer: SharedSynthesizer,
        formatter: Option<SharedFormatter>,
        markup: MarkupConfig,
    ) -> Self {
        Self {
            settings,
            synthesizer,
            formatter,
            markup,
        }
    }

    pub fn markup_config(&self) -> &MarkupConfig {
        &self.markup
    }

    pub fn has_formatter(&self) -> bool {
        self.formatter.is_some()
    }

    pub async fn speak(&self, user_id: UserId, text: &str, mode: SpeakMode) -> SpeechResult<SpeechOutput> {
        let settings = self.settings.get_settings(user_id);
        let (source, target) = mode.dialects(settings.dialect);

        let formatted = match (&self.formatter, mode) {
            (Some(formatter), SpeakMode::Plain) if settings.auto_format => {
                let annotated = formatter.format(text).await?;
                debug!(
                    user_id,
                    formatter = formatter.name(),
                    "Auto-formatted message"
                );
                // Inline pause markers are valid in both dialects
                markup::parse(&annotated, source, &self.markup)?
            }
            _ => markup::parse(text, source, &self.markup)?,
        };
        if !formatted.has_speech() {
            return Err(SpeechError::EmptyText);
        }

        let rendered = markup::render(&formatted, target, &self.markup)?;
        let request = SynthesisRequest::new(rendered.payload.as_str(), target, &settings)
            .with_language(self.markup.language);
        let audio = self.synthesizer.synthesize(&request).await?;

        info!(
            user_id,
            dialect = %target,
            voice = %settings.voice,
            bytes = audio.len(),
            warnings = rendered.warnings.len(),
            "Speech synthesized"
        );

        Ok(SpeechOutput {
            audio,
            format: settings.format,
            payload: rendered.payload,
            warnings: rendered.warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::formatter::{FormatResult, TextFormatter};
    use crate::core::settings::{InMemorySettingsStore, SettingField, SettingsDefaults};
    use crate::core::tts::{SpeechSynthesizer, TTSResult};
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSynth {
        requests: Mutex<Vec<SynthesisRequest>>,
    }

    #[async_trait]
    impl SpeechSynthesizer for RecordingSynth {
        async fn synthesize(&self, request: &SynthesisRequest) -> TTSResult<Bytes> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(Bytes::from_static(b"OggS"))
        }

        fn name(&self) -> &'static str {
            "recording"
        }
    }

    struct FixedFormatter(&'static str);

    #[async_trait]
    impl TextFormatter for FixedFormatter {
        async fn format(&self, _text: &str) -> FormatResult<String> {
            Ok(self.0.to_string())
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    fn pipeline(formatter: Option<SharedFormatter>) -> (SpeechPipeline, Arc<RecordingSynth>, Arc<InMemorySettingsStore>) {
        let store = Arc::new(InMemorySettingsStore::new(SettingsDefaults::default()));
        let synth = Arc::new(RecordingSynth::default());
        let pipeline = SpeechPipeline::new(
            store.clone(),
            synth.clone(),
            formatter,
            MarkupConfig::default(),
        );
        (pipeline, synth, store)
    }

    #[tokio::test]
    async fn test_plain_text_uses_user_dialect() {
        let (pipeline, synth, store) = pipeline(None);
        store.set_setting(1, SettingField::Voice, "ermil").unwrap();

        let out = pipeline.speak(1, "Привет sil<[300]> мир", SpeakMode::Plain).await.unwrap();
        assert_eq!(out.payload, "Привет sil<[300]> мир");
        assert!(out.warnings.is_empty());

        let requests = synth.requests.lock().unwrap();
        assert_eq!(requests[0].dialect, Dialect::Inline);
        assert_eq!(requests[0].voice.as_str(), "ermil");
    }

    #[tokio::test]
    async fn test_ssml_mode_forces_legacy() {
        let (pipeline, synth, _) = pipeline(None);
        let out = pipeline
            .speak(1, r#"<speak>Раз <break time="500ms"/> два</speak>"#, SpeakMode::Ssml)
            .await
            .unwrap();
        assert_eq!(out.payload, r#"<speak>Раз <break time="0.5s"/> два</speak>"#);
        assert_eq!(synth.requests.lock().unwrap()[0].dialect, Dialect::Legacy);
    }

    #[tokio::test]
    async fn test_legacy_user_dialect_reports_stripped_marks() {
        let (pipeline, _, store) = pipeline(None);
        store.set_setting(1, SettingField::Dialect, "legacy").unwrap();

        let out = pipeline.speak(1, "Это **важно**", SpeakMode::Plain).await.unwrap();
        assert_eq!(out.payload, "<speak>Это важно</speak>");
        assert_eq!(out.warnings.len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_markup_never_reaches_synthesizer() {
        let (pipeline, synth, _) = pipeline(None);
        let err = pipeline.speak(1, "a sil<[9999]> b", SpeakMode::Plain).await.unwrap_err();
        assert!(matches!(err, SpeechError::Markup(MarkupError::Validation { .. })));
        assert!(synth.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_formatter_output_is_validated() {
        let formatter: SharedFormatter = Arc::new(FixedFormatter("Привет sil<[50]> мир"));
        let (pipeline, synth, store) = pipeline(Some(formatter));
        store.set_setting(1, SettingField::AutoFormat, "on").unwrap();

        let err = pipeline.speak(1, "Привет мир", SpeakMode::Plain).await.unwrap_err();
        assert!(matches!(err, SpeechError::Markup(_)));
        assert!(synth.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_formatted_text_keeps_legacy_breaks() {
        let formatter: SharedFormatter = Arc::new(crate::core::formatter::RuleFormatter::new());
        let (pipeline, synth, store) = pipeline(Some(formatter));
        store.set_setting(1, SettingField::Dialect, "legacy").unwrap();
        let text = r#"Привет <break time="1s"/> мир"#;

        let plain = pipeline.speak(1, text, SpeakMode::Plain).await.unwrap();
        store.set_setting(1, SettingField::AutoFormat, "on").unwrap();
        let formatted = pipeline.speak(1, text, SpeakMode::Plain).await.unwrap();

        assert_eq!(plain.payload, r#"<speak>Привет <break time="1s"/> мир</speak>"#);
        assert_eq!(formatted.payload, plain.payload);
        assert_eq!(synth.requests.lock().unwrap()[1].dialect, Dialect::Legacy);
    }

    #[tokio::test]
    async fn test_formatter_pauses_render_for_legacy_users() {
        let formatter: SharedFormatter = Arc::new(FixedFormatter("Раз. sil<[300]> Два"));
        let (pipeline, _, store) = pipeline(Some(formatter));
        store.set_setting(1, SettingField::Dialect, "legacy").unwrap();
        store.set_setting(1, SettingField::AutoFormat, "on").unwrap();

        let out = pipeline.speak(1, "Раз. Два", SpeakMode::Plain).await.unwrap();
        assert_eq!(out.payload, r#"<speak>Раз. <break time="0.3s"/> Два</speak>"#);
    }

    #[tokio::test]
    async fn test_formatter_skipped_when_disabled() {
        let formatter: SharedFormatter = Arc::new(FixedFormatter("совсем другое"));
        let (pipeline, _, _) = pipeline(Some(formatter));

        let out = pipeline.speak(1, "Привет", SpeakMode::Plain).await.unwrap();
        assert_eq!(out.payload, "Привет");
    }

    #[tokio::test]
    async fn test_markup_only_message_is_rejected() {
        let (pipeline, _, _) = pipeline(None);
        let err = pipeline.speak(1, "sil<[300]>", SpeakMode::Plain).await.unwrap_err();
        assert!(matches!(err, SpeechError::EmptyText));
    }
}
