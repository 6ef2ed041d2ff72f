//! Yandex SpeechKit configuration.
//!
//! Two REST endpoints are used:
//!
//! - **v3** `utteranceSynthesis`: JSON body, inline `sil<[..]>`/`+` markup,
//!   voice/role/speed passed as separate hints. Streams JSON lines with
//!   base64 audio chunks.
//! - **v1** `tts:synthesize`: form body with an `ssml` field. Requires a
//!   folder id unless a service-account key is used. Returns raw audio.
//!
//! # References
//!
//! - [v3 REST](https://yandex.cloud/en/docs/speechkit/tts-v3/api-ref/rest/Synthesizer/utteranceSynthesis)
//! - [v1 REST](https://yandex.cloud/en/docs/speechkit/tts/request)
//! - [Markup](https://yandex.cloud/en/docs/speechkit/tts/markup/tts-markup)

use serde::Serialize;
use zeroize::Zeroize;

use crate::core::settings::{AudioFormat, Role, Speed, Voice};

// =============================================================================
// Constants
// =============================================================================

/// v3 synthesis endpoint (inline markup)
pub const YANDEX_TTS_V3_URL: &str = "https://tts.api.cloud.yandex.net/tts/v3/utteranceSynthesis";

/// v1 synthesis endpoint (SSML)
pub const YANDEX_TTS_V1_URL: &str = "https://tts.api.cloud.yandex.net/speech/v1/tts:synthesize";

/// Sample rate for raw PCM output
pub const DEFAULT_SAMPLE_RATE: u32 = 48000;

/// SpeechKit rejects longer utterances
pub const MAX_TEXT_LENGTH: usize = 5000;

// =============================================================================
// Client configuration
// =============================================================================

#[derive(Clone)]
pub struct SpeechKitConfig {
    /// API key, sent as `Authorization: Api-Key <key>`
    pub api_key: String,
    /// Cloud folder, required by v1 with user-account keys
    pub folder_id: Option<String>,
    pub v3_url: String,
    pub v1_url: String,
    pub request_timeout_secs: u64,
    pub sample_rate_hz: u32,
}

impl Default for SpeechKitConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            folder_id: None,
            v3_url: YANDEX_TTS_V3_URL.to_string(),
            v1_url: YANDEX_TTS_V1_URL.to_string(),
            request_timeout_secs: 20,
            sample_rate_hz: DEFAULT_SAMPLE_RATE,
        }
    }
}

impl std::fmt::Debug for SpeechKitConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechKitConfig")
            .field("api_key", &"<redacted>")
            .field("folder_id", &self.folder_id)
            .field("v3_url", &self.v3_url)
            .field("v1_url", &self.v1_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("sample_rate_hz", &self.sample_rate_hz)
            .finish()
    }
}

impl Drop for SpeechKitConfig {
    fn drop(&mut self) {
        self.api_key.zeroize();
    }
}

impl SpeechKitConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        let mut config = Self::default();
        config.api_key = api_key.into();
        config
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.api_key.trim().is_empty() {
            return Err("Yandex API key is required".to_string());
        }
        if self.v3_url.is_empty() || self.v1_url.is_empty() {
            return Err("SpeechKit endpoint URLs must not be empty".to_string());
        }
        if self.request_timeout_secs == 0 {
            return Err("Request timeout must be greater than zero".to_string());
        }
        Ok(())
    }
}

// =============================================================================
// v3 request body
// =============================================================================

/// One hint object. SpeechKit wants exactly one field per object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Hint {
    Voice(String),
    Role(String),
    Speed(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerAudio {
    pub container_audio_type: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAudio {
    pub audio_encoding: &'static str,
    pub sample_rate_hertz: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum OutputAudioSpec {
    ContainerAudio(ContainerAudio),
    RawAudio(RawAudio),
}

impl OutputAudioSpec {
    pub fn for_format(format: AudioFormat, sample_rate_hz: u32) -> Self {
        let container = |kind: &'static str| {
            Self::ContainerAudio(ContainerAudio {
                container_audio_type: kind,
            })
        };
        match format {
            AudioFormat::OggOpus => container("OGG_OPUS"),
            AudioFormat::Mp3 => container("MP3"),
            AudioFormat::Wav => container("WAV"),
            AudioFormat::Lpcm => Self::RawAudio(RawAudio {
                audio_encoding: "LINEAR16_PCM",
                sample_rate_hertz: sample_rate_hz,
            }),
        }
    }
}

/// JSON body for `utteranceSynthesis`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UtteranceRequest {
    pub text: String,
    pub lang: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hints: Vec<Hint>,
    pub output_audio_spec: OutputAudioSpec,
}

/// Hints for a voice; neutral role and normal speed are implied and omitted.
pub fn build_hints(voice: Voice, role: Role, speed: Speed) -> Vec<Hint> {
    let mut hints = vec![Hint::Voice(voice.as_str().to_string())];
    if role != Role::Neutral {
        hints.push(Hint::Role(role.as_str().to_string()));
    }
    if !speed.is_normal() {
        hints.push(Hint::Speed(speed.to_string()));
    }
    hints
}

// =============================================================================
// v1 form fields
// =============================================================================

/// v1 `format` value, if the format is available on v1
pub fn v1_format(format: AudioFormat) -> Option<&'static str> {
    match format {
        AudioFormat::OggOpus => Some("oggopus"),
        AudioFormat::Mp3 => Some("mp3"),
        AudioFormat::Lpcm => Some("lpcm"),
        AudioFormat::Wav => None,
    }
}
