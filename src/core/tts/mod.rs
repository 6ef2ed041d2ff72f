mod base;
pub mod cache;
pub mod yandex;

pub use base::{SharedSynthesizer, SpeechSynthesizer, SynthesisRequest, TTSError, TTSResult};
pub use cache::CachedSynthesizer;
pub use yandex::{SpeechKitConfig, YANDEX_TTS_V1_URL, YANDEX_TTS_V3_URL, YandexSpeechKit};

/// Factory function to create a synthesis provider by name.
///
/// # Supported Providers
///
/// - `"yandex"`, `"speechkit"` or `"yandex-speechkit"` - Yandex SpeechKit (v3 inline, v1 SSML)
pub fn create_synthesizer(provider: &str, config: SpeechKitConfig) -> TTSResult<SharedSynthesizer> {
    match provider.to_lowercase().as_str() {
        "yandex" | "speechkit" | "yandex-speechkit" => {
            Ok(std::sync::Arc::new(YandexSpeechKit::new(config)?))
        }
        other => Err(TTSError::InvalidConfiguration(format!(
            "Unsupported TTS provider: {other}. Supported providers: yandex"
        ))),
    }
}
