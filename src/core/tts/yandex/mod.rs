mod config;
mod provider;

#[cfg(test)]
mod tests;

pub use config::{
    DEFAULT_SAMPLE_RATE, Hint, MAX_TEXT_LENGTH, OutputAudioSpec, SpeechKitConfig, UtteranceRequest,
    YANDEX_TTS_V1_URL, YANDEX_TTS_V3_URL, build_hints, v1_format,
};
pub use provider::{YandexSpeechKit, classify_status, decode_audio_stream, is_text_too_long};
