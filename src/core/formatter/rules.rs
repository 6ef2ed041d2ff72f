//! Deterministic pause insertion.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;

use super::{FormatResult, TextFormatter};

macro_rules! pattern {
    ($name:ident, $re:expr) => {
        static $name: LazyLock<Regex> =
            LazyLock::new(|| Regex::new($re).expect(concat!(stringify!($name), " is valid")));
    };
}

pattern!(EXISTING_PAUSE, r"sil<\[\d+\]>");
pattern!(WHITESPACE, r"\s+");
pattern!(SENTENCE_END, r"([.!?])\s+");
pattern!(SEMICOLON, r";\s+");
pattern!(EM_DASH, r"\s*—\s*");
pattern!(SPACED_HYPHEN, r"\s+-\s+");
pattern!(
    CONJUNCTION,
    r",\s+(но|а|однако|хотя|чтобы|если|когда|пока|после того как)\s+"
);
pattern!(
    INTRO_CLAUSE,
    r"^((?:Когда|После того как|Если|Хотя|Несмотря на то что)[^,]+,)\s+"
);
pattern!(REPEATED_PAUSE, r"(sil<\[\d+\]>)(?:\s*sil<\[\d+\]>)+");
pattern!(COMPLEX_PUNCTUATION, r"[;:—]");
pattern!(SENTENCE_TERMINATOR, r"[.!?]+");
pattern!(REPEATED_EXCLAMATION, r"!.*!");

/// Sentence-end pause
pub const SENTENCE_PAUSE_MS: u32 = 300;
/// Clause-level pause
pub const CLAUSE_PAUSE_MS: u32 = 200;

/// Inserts `sil<[..]>` pauses at punctuation and clause boundaries.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleFormatter;

impl RuleFormatter {
    pub fn new() -> Self {
        Self
    }

    /// Drop existing pause markers and collapse whitespace
    pub fn clean(&self, text: &str) -> String {
        let text = EXISTING_PAUSE.replace_all(text, "");
        WHITESPACE.replace_all(&text, " ").trim().to_string()
    }

    /// Apply the pause rules to already-cleaned text
    pub fn apply(&self, text: &str) -> String {
        let sentence = format!("$1 sil<[{SENTENCE_PAUSE_MS}]> ");
        let clause = format!(" sil<[{CLAUSE_PAUSE_MS}]> ");

        let text = SENTENCE_END.replace_all(text, sentence.as_str());
        let text = SEMICOLON.replace_all(&text, format!(";{clause}").as_str());
        let text = EM_DASH.replace_all(&text, clause.as_str());
        let text = SPACED_HYPHEN.replace_all(&text, clause.as_str());
        let text = CONJUNCTION.replace_all(&text, format!(",{clause}$1 ").as_str());
        let text = INTRO_CLAUSE.replace(&text, format!("$1{clause}").as_str());
        let text = REPEATED_PAUSE.replace_all(&text, "$1");
        WHITESPACE.replace_all(&text, " ").trim().to_string()
    }

    /// Whether the text is worth sending to a language model.
    ///
    /// More than two sentences, `; : —`, more than 50 words, or
    /// poetry-like layout.
    pub fn is_complex(&self, text: &str) -> bool {
        let sentences = SENTENCE_TERMINATOR.find_iter(text).count();
        let words = text.split_whitespace().count();
        let poetry = REPEATED_EXCLAMATION.is_match(text) || text.matches('\n').count() > 2;

        sentences > 2 || COMPLEX_PUNCTUATION.is_match(text) || words > 50 || poetry
    }
}

#[async_trait]
impl TextFormatter for RuleFormatter {
    async fn format(&self, text: &str) -> FormatResult<String> {
        Ok(self.apply(&self.clean(text)))
    }

    fn name(&self) -> &'static str {
        "rules"
    }
}
