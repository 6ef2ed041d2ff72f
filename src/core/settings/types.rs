//! Setting value types and the per-user settings record.
//!
//! Voice and role tables follow Yandex SpeechKit v3. Not every voice
//! supports every role; see [`Voice::supported_roles`].
//!
//! # References
//!
//! - [Voices and roles](https://yandex.cloud/en/docs/speechkit/tts/voices)

use serde::{Deserialize, Serialize};

use crate::core::markup::Dialect;

use super::store::SettingsError;

// =============================================================================
// Voice
// =============================================================================

/// SpeechKit voices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Voice {
    /// Алёна - female, neutral/good
    #[default]
    Alena,
    /// Александр - male, neutral/good
    Alexander,
    /// Антон - male, neutral/good
    Anton,
    /// Даша - female, neutral/good/friendly
    Dasha,
    /// Ермил - male, neutral/good
    Ermil,
    /// Филипп - male, neutral only
    Filipp,
    /// Джейн - female, neutral/good/evil
    Jane,
    /// Юлия - female, neutral/strict
    Julia,
    /// Кирилл - male, neutral/good/strict
    Kirill,
    /// Лера - female, neutral/friendly
    Lera,
    /// Маша - female, neutral/good/strict/friendly
    Masha,
    /// Марина - female, neutral/whisper/friendly
    Marina,
    /// Омаж - female, neutral/evil
    Omazh,
    /// Захар - male, neutral/good
    Zahar,
    /// Джон - male, English voice that also reads Russian
    John,
}

impl Voice {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Alena => "alena",
            Self::Alexander => "alexander",
            Self::Anton => "anton",
            Self::Dasha => "dasha",
            Self::Ermil => "ermil",
            Self::Filipp => "filipp",
            Self::Jane => "jane",
            Self::Julia => "julia",
            Self::Kirill => "kirill",
            Self::Lera => "lera",
            Self::Masha => "masha",
            Self::Marina => "marina",
            Self::Omazh => "omazh",
            Self::Zahar => "zahar",
            Self::John => "john",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        Self::all().iter().copied().find(|v| v.as_str() == s)
    }

    /// Parse from string, with fallback to default.
    pub fn from_str_or_default(s: &str) -> Self {
        Self::from_name(s).unwrap_or_default()
    }

    /// Name shown in the chat UI
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Alena => "Алёна",
            Self::Alexander => "Александр",
            Self::Anton => "Антон",
            Self::Dasha => "Даша",
            Self::Ermil => "Ермил",
            Self::Filipp => "Филипп",
            Self::Jane => "Джейн",
            Self::Julia => "Юлия",
            Self::Kirill => "Кирилл",
            Self::Lera => "Лера",
            Self::Masha => "Маша",
            Self::Marina => "Марина",
            Self::Omazh => "Омаж",
            Self::Zahar => "Захар",
            Self::John => "Джон",
        }
    }

    /// Roles the voice can be synthesised with. The first entry is always
    /// `Neutral`.
    pub fn supported_roles(&self) -> &'static [Role] {
        use Role::*;
        match self {
            Self::Alena | Self::Alexander | Self::Anton | Self::Ermil | Self::Zahar => {
                &[Neutral, Good]
            }
            Self::Dasha => &[Neutral, Good, Friendly],
            Self::Filipp | Self::John => &[Neutral],
            Self::Jane => &[Neutral, Good, Evil],
            Self::Julia => &[Neutral, Strict],
            Self::Kirill => &[Neutral, Good, Strict],
            Self::Lera => &[Neutral, Friendly],
            Self::Masha => &[Neutral, Good, Strict, Friendly],
            Self::Marina => &[Neutral, Whisper, Friendly],
            Self::Omazh => &[Neutral, Evil],
        }
    }

    #[inline]
    pub fn supports(&self, role: Role) -> bool {
        self.supported_roles().contains(&role)
    }

    pub fn all() -> &'static [Voice] {
        &[
            Self::Alena,
            Self::Alexander,
            Self::Anton,
            Self::Dasha,
            Self::Ermil,
            Self::Filipp,
            Self::Jane,
            Self::Julia,
            Self::Kirill,
            Self::Lera,
            Self::Masha,
            Self::Marina,
            Self::Omazh,
            Self::Zahar,
            Self::John,
        ]
    }
}

impl std::fmt::Display for Voice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Role
// =============================================================================

/// Emotional role ("amplua") of the voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Neutral,
    Good,
    Evil,
    Friendly,
    Strict,
    Whisper,
}

impl Role {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Neutral => "neutral",
            Self::Good => "good",
            Self::Evil => "evil",
            Self::Friendly => "friendly",
            Self::Strict => "strict",
            Self::Whisper => "whisper",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        Self::all().iter().copied().find(|r| r.as_str() == s)
    }

    pub fn from_str_or_default(s: &str) -> Self {
        Self::from_name(s).unwrap_or_default()
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Neutral => "Покой",
            Self::Good => "Добро",
            Self::Evil => "Злоба",
            Self::Friendly => "Дружба",
            Self::Strict => "Строгий",
            Self::Whisper => "Шёпот",
        }
    }

    pub fn all() -> &'static [Role] {
        &[
            Self::Neutral,
            Self::Good,
            Self::Evil,
            Self::Friendly,
            Self::Strict,
            Self::Whisper,
        ]
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Speed
// =============================================================================

/// Speech rate multiplier, bounded to [`Speed::MIN`]..=[`Speed::MAX`].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "SpeedRepr", into = "f32")]
pub struct Speed(f32);

/// Speeds offered in the chat keyboard
pub const SPEED_PRESETS: [Speed; 3] = [Speed(0.8), Speed(1.0), Speed(1.2)];

impl Speed {
    pub const MIN: f32 = 0.1;
    pub const MAX: f32 = 3.0;
    pub const NORMAL: Speed = Speed(1.0);

    pub fn new(value: f32) -> Result<Self, String> {
        if !value.is_finite() || !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(format!(
                "speed must be between {} and {}, got {value}",
                Self::MIN,
                Self::MAX
            ));
        }
        Ok(Self(value))
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        let value: f32 = s
            .trim()
            .replace(',', ".")
            .parse()
            .map_err(|_| format!("'{}' is not a number", s.trim()))?;
        Self::new(value)
    }

    #[inline]
    pub fn value(&self) -> f32 {
        self.0
    }

    pub fn is_normal(&self) -> bool {
        (self.0 - 1.0).abs() < f32::EPSILON
    }

    /// Preset label in the chat UI, or the number itself
    pub fn display_name(&self) -> String {
        match self.to_string().as_str() {
            "0.8" => "Медленная".to_string(),
            "1.0" => "Обычная".to_string(),
            "1.2" => "Быстрая".to_string(),
            other => other.to_string(),
        }
    }
}

impl Default for Speed {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl std::fmt::Display for Speed {
    /// Always at least one decimal: `1.0`, `0.8`, `1.25`
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tenths = self.0 * 10.0;
        if (tenths - tenths.round()).abs() < 1e-4 {
            write!(f, "{:.1}", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl From<Speed> for f32 {
    fn from(speed: Speed) -> Self {
        speed.0
    }
}

/// Speed as stored on disk: a number, or a string like `"1.0"`
#[derive(Deserialize)]
#[serde(untagged)]
enum SpeedRepr {
    Number(f32),
    Text(String),
}

impl TryFrom<SpeedRepr> for Speed {
    type Error = String;

    fn try_from(repr: SpeedRepr) -> Result<Self, Self::Error> {
        match repr {
            SpeedRepr::Number(v) => Speed::new(v),
            SpeedRepr::Text(s) => Speed::parse(&s),
        }
    }
}

// =============================================================================
// Audio format
// =============================================================================

/// Output audio container/encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    /// OGG container with Opus, what Telegram voice messages use
    #[default]
    OggOpus,
    Mp3,
    Wav,
    /// Raw 16-bit PCM
    Lpcm,
}

impl AudioFormat {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OggOpus => "oggopus",
            Self::Mp3 => "mp3",
            Self::Wav => "wav",
            Self::Lpcm => "lpcm",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "oggopus" | "ogg_opus" | "ogg" | "opus" => Some(Self::OggOpus),
            "mp3" => Some(Self::Mp3),
            "wav" => Some(Self::Wav),
            "lpcm" | "pcm" | "linear16" => Some(Self::Lpcm),
            _ => None,
        }
    }

    pub fn from_str_or_default(s: &str) -> Self {
        Self::from_name(s).unwrap_or_default()
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::OggOpus => "audio/ogg",
            Self::Mp3 => "audio/mpeg",
            Self::Wav => "audio/wav",
            Self::Lpcm => "audio/pcm",
        }
    }

    pub fn file_extension(&self) -> &'static str {
        match self {
            Self::OggOpus => "ogg",
            Self::Mp3 => "mp3",
            Self::Wav => "wav",
            Self::Lpcm => "pcm",
        }
    }

    pub fn all() -> &'static [AudioFormat] {
        &[Self::OggOpus, Self::Mp3, Self::Wav, Self::Lpcm]
    }
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Fields
// =============================================================================

/// A user-settable field, as named in commands and callback data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingField {
    Voice,
    Role,
    Speed,
    Format,
    Dialect,
    AutoFormat,
}

impl SettingField {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Voice => "voice",
            Self::Role => "role",
            Self::Speed => "speed",
            Self::Format => "format",
            Self::Dialect => "dialect",
            Self::AutoFormat => "auto_format",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "voice" => Some(Self::Voice),
            "role" | "emotion" => Some(Self::Role),
            "speed" => Some(Self::Speed),
            "format" | "audio_format" => Some(Self::Format),
            "dialect" | "markup" => Some(Self::Dialect),
            "auto_format" | "autoformat" => Some(Self::AutoFormat),
            _ => None,
        }
    }

    /// Accusative form used in "Ты выбрала ..." confirmations
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Voice => "голос",
            Self::Role => "эмоцию",
            Self::Speed => "скорость",
            Self::Format => "формат",
            Self::Dialect => "разметку",
            Self::AutoFormat => "автоформатирование",
        }
    }

    pub fn all() -> &'static [SettingField] {
        &[
            Self::Voice,
            Self::Role,
            Self::Speed,
            Self::Format,
            Self::Dialect,
            Self::AutoFormat,
        ]
    }
}

impl std::fmt::Display for SettingField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Records
// =============================================================================

/// Process-wide defaults every user starts from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsDefaults {
    pub voice: Voice,
    pub role: Role,
    pub speed: Speed,
    pub format: AudioFormat,
    pub dialect: Dialect,
    pub auto_format: bool,
}

impl Default for SettingsDefaults {
    fn default() -> Self {
        Self {
            voice: Voice::default(),
            role: Role::default(),
            speed: Speed::default(),
            format: AudioFormat::default(),
            dialect: Dialect::default(),
            auto_format: false,
        }
    }
}

impl SettingsDefaults {
    pub fn validate(&self) -> Result<(), String> {
        if !self.voice.supports(self.role) {
            return Err(format!(
                "Default role '{}' is not available for default voice '{}'",
                self.role, self.voice
            ));
        }
        Ok(())
    }
}

/// Values a user changed away from the defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<Voice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<Speed>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<AudioFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dialect: Option<Dialect>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_format: Option<bool>,
}

impl UserOverrides {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merge with `defaults`; overrides win
    pub fn resolve(&self, defaults: &SettingsDefaults) -> UserSettings {
        UserSettings {
            voice: self.voice.unwrap_or(defaults.voice),
            role: self.role.unwrap_or(defaults.role),
            speed: self.speed.unwrap_or(defaults.speed),
            format: self.format.unwrap_or(defaults.format),
            dialect: self.dialect.unwrap_or(defaults.dialect),
            auto_format: self.auto_format.unwrap_or(defaults.auto_format),
        }
    }

    /// Apply one textual update.
    ///
    /// The update is all-or-nothing: on error `self` is left unchanged.
    pub fn apply(
        &mut self,
        defaults: &SettingsDefaults,
        field: SettingField,
        value: &str,
    ) -> Result<(), SettingsError> {
        let invalid = |reason: String| SettingsError::InvalidValue {
            field,
            value: value.trim().to_string(),
            reason,
        };

        match field {
            SettingField::Voice => {
                let voice = Voice::from_name(value).ok_or_else(|| {
                    invalid(format!("unknown voice, expected one of: {}", names(Voice::all())))
                })?;
                // A new voice starts from default role and speed
                self.voice = Some(voice);
                self.speed = None;
                self.role = if voice.supports(defaults.role) {
                    None
                } else {
                    Some(voice.supported_roles()[0])
                };
            }
            SettingField::Role => {
                let role = Role::from_name(value).ok_or_else(|| {
                    invalid(format!("unknown role, expected one of: {}", names(Role::all())))
                })?;
                let voice = self.voice.unwrap_or(defaults.voice);
                if !voice.supports(role) {
                    return Err(SettingsError::IncompatibleRole { voice, role });
                }
                self.role = Some(role);
            }
            SettingField::Speed => {
                self.speed = Some(Speed::parse(value).map_err(invalid)?);
            }
            SettingField::Format => {
                let format = AudioFormat::from_name(value).ok_or_else(|| {
                    invalid(format!(
                        "unknown audio format, expected one of: {}",
                        names(AudioFormat::all())
                    ))
                })?;
                self.format = Some(format);
            }
            SettingField::Dialect => {
                let dialect = Dialect::from_name(value)
                    .ok_or_else(|| invalid("expected 'inline' or 'legacy'".to_string()))?;
                self.dialect = Some(dialect);
            }
            SettingField::AutoFormat => {
                let current = self.auto_format.unwrap_or(defaults.auto_format);
                let enabled = match value.trim().to_lowercase().as_str() {
                    "toggle" => !current,
                    "true" | "on" | "1" | "yes" | "вкл" => true,
                    "false" | "off" | "0" | "no" | "выкл" => false,
                    _ => return Err(invalid("expected on, off or toggle".to_string())),
                };
                self.auto_format = Some(enabled);
            }
        }
        Ok(())
    }
}

/// Fully resolved preferences for one user.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UserSettings {
    pub voice: Voice,
    pub role: Role,
    pub speed: Speed,
    pub format: AudioFormat,
    pub dialect: Dialect,
    pub auto_format: bool,
}

impl From<SettingsDefaults> for UserSettings {
    fn from(defaults: SettingsDefaults) -> Self {
        UserOverrides::default().resolve(&defaults)
    }
}

fn names<T: std::fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
