//! Configuration types for the markup translator.
//!
//! - Output dialect selection (inline markers vs legacy SSML)
//! - Pause bounds and the vowel set used for stress marks
//! - Policy for marks the legacy dialect cannot express

use serde::{Deserialize, Serialize};

/// Default lower bound for explicit pauses in milliseconds
pub const DEFAULT_MIN_PAUSE_MS: u32 = 100;

/// Default upper bound for explicit pauses in milliseconds
pub const DEFAULT_MAX_PAUSE_MS: u32 = 5000;

// =============================================================================
// Dialect
// =============================================================================

/// Payload dialect understood by the synthesis service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// SpeechKit v3 inline markers: `sil<[300]>`, `<[medium]>`, `м+олоко`, `**важно**`
    #[default]
    Inline,
    /// SSML-like markup: `<speak>... <break time="0.3s"/> ...</speak>`
    Legacy,
}

impl Dialect {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inline => "inline",
            Self::Legacy => "legacy",
        }
    }

    /// Strict parse used for user input and configuration.
    pub fn from_name(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "inline" | "v3" | "markup" => Some(Self::Inline),
            "legacy" | "ssml" | "xml" => Some(Self::Legacy),
            _ => None,
        }
    }

    /// Parse from string, with fallback to default.
    pub fn from_str_or_default(s: &str) -> Self {
        Self::from_name(s).unwrap_or_default()
    }

    pub fn all() -> &'static [Dialect] {
        &[Self::Inline, Self::Legacy]
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Language
// =============================================================================

/// Synthesis language. Determines the vowel set for stress marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "ru-RU")]
    Russian,
    #[serde(rename = "en-US")]
    English,
}

impl Language {
    /// Language code sent to the synthesis API
    #[inline]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Russian => "ru-RU",
            Self::English => "en-US",
        }
    }

    pub fn from_str_or_default(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "ru" | "ru-ru" | "russian" => Self::Russian,
            "en" | "en-us" | "english" => Self::English,
            _ => Self::default(),
        }
    }

    /// Whether `c` is a vowel that can carry a stress mark
    pub fn is_vowel(&self, c: char) -> bool {
        let lower = c.to_lowercase().next().unwrap_or(c);
        match self {
            Self::Russian => "аеёиоуыэюя".contains(lower),
            Self::English => "aeiouy".contains(lower),
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

// =============================================================================
// Legacy policy
// =============================================================================

/// What to do with stress and emphasis marks when rendering the legacy dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegacyPolicy {
    /// Drop the mark, keep its text, and report a warning
    #[default]
    Strip,
    /// Fail with `MarkupError::UnsupportedDialect`
    Reject,
}

impl LegacyPolicy {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strip => "strip",
            Self::Reject => "reject",
        }
    }

    pub fn from_str_or_default(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "reject" | "error" | "strict" => Self::Reject,
            _ => Self::Strip,
        }
    }
}

// =============================================================================
// Translator configuration
// =============================================================================

/// Bounds and policies applied by `parse` and `render`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkupConfig {
    pub min_pause_ms: u32,
    pub max_pause_ms: u32,
    pub language: Language,
    pub legacy_policy: LegacyPolicy,
}

impl Default for MarkupConfig {
    fn default() -> Self {
        Self {
            min_pause_ms: DEFAULT_MIN_PAUSE_MS,
            max_pause_ms: DEFAULT_MAX_PAUSE_MS,
            language: Language::default(),
            legacy_policy: LegacyPolicy::default(),
        }
    }
}

impl MarkupConfig {
    /// Check the configuration itself is usable
    pub fn validate(&self) -> Result<(), String> {
        if self.min_pause_ms > self.max_pause_ms {
            return Err(format!(
                "Pause bounds are inverted: min {}ms > max {}ms",
                self.min_pause_ms, self.max_pause_ms
            ));
        }
        Ok(())
    }

    #[inline]
    pub fn pause_in_bounds(&self, ms: i64) -> bool {
        ms >= i64::from(self.min_pause_ms) && ms <= i64::from(self.max_pause_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_from_name() {
        assert_eq!(Dialect::from_name("inline"), Some(Dialect::Inline));
        assert_eq!(Dialect::from_name("SSML"), Some(Dialect::Legacy));
        assert_eq!(Dialect::from_name(" legacy "), Some(Dialect::Legacy));
        assert_eq!(Dialect::from_name("html"), None);
        assert_eq!(Dialect::from_str_or_default("html"), Dialect::Inline);
    }

    #[test]
    fn test_russian_vowels() {
        let lang = Language::Russian;
        for c in "аеёиоуыэюяАЕЁИОУЫЭЮЯ".chars() {
            assert!(lang.is_vowel(c), "{c} should be a vowel");
        }
        assert!(!lang.is_vowel('м'));
        assert!(!lang.is_vowel('a'));
    }

    #[test]
    fn test_english_vowels() {
        assert!(Language::English.is_vowel('E'));
        assert!(!Language::English.is_vowel('о'));
    }

    #[test]
    fn test_config_validate() {
        assert!(MarkupConfig::default().validate().is_ok());
        let inverted = MarkupConfig {
            min_pause_ms: 600,
            max_pause_ms: 500,
            ..Default::default()
        };
        assert!(inverted.validate().is_err());
    }

    #[test]
    fn test_pause_in_bounds() {
        let config = MarkupConfig::default();
        assert!(config.pause_in_bounds(100));
        assert!(config.pause_in_bounds(5000));
        assert!(!config.pause_in_bounds(99));
        assert!(!config.pause_in_bounds(5001));
        assert!(!config.pause_in_bounds(-300));
    }

    #[test]
    fn test_legacy_policy_parsing() {
        assert_eq!(LegacyPolicy::from_str_or_default("reject"), LegacyPolicy::Reject);
        assert_eq!(LegacyPolicy::from_str_or_default("whatever"), LegacyPolicy::Strip);
    }
}
