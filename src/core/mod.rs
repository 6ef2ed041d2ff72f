pub mod formatter;
pub mod markup;
pub mod settings;
pub mod speech;
pub mod tts;

// Re-export commonly used types for convenience
pub use formatter::{
    FormatError, FormatResult, GptConfig, RuleFormatter, SharedFormatter, TextFormatter,
    YandexGptFormatter,
};

pub use markup::{
    Dialect, Language, LegacyPolicy, MarkupConfig, MarkupDocument, MarkupError, MarkupResult,
    RenderWarning, Rendered, Segment, parse, render, translate,
};

pub use settings::{
    FileSettingsStore, InMemorySettingsStore, SettingField, SettingsDefaults, SettingsError,
    SettingsStore, UserId, UserSettings,
};

pub use speech::{SpeakMode, SpeechError, SpeechOutput, SpeechPipeline, SpeechResult};

pub use tts::{
    CachedSynthesizer, SharedSynthesizer, SpeechKitConfig, SpeechSynthesizer, SynthesisRequest,
    TTSError, TTSResult, YandexSpeechKit, create_synthesizer,
};
