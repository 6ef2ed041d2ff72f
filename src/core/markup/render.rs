//! Serialise a [`MarkupDocument`] into a dialect-specific payload.

use serde::Serialize;

use super::config::{Dialect, LegacyPolicy, MarkupConfig};
use super::document::{MarkupDocument, Segment};
use super::error::{MarkupError, MarkupResult};
use super::parser::{inline_collision, parse, text_collision};

/// A mark that was dropped while rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderWarning {
    pub feature: &'static str,
    /// The mark in inline notation, e.g. `м+олоко`
    pub token: String,
}

impl std::fmt::Display for RenderWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} dropped from '{}'", self.feature, self.token)
    }
}

/// Rendered payload plus any lossy-conversion warnings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rendered {
    pub dialect: Dialect,
    pub payload: String,
    pub warnings: Vec<RenderWarning>,
}

impl Rendered {
    pub fn is_lossless(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Render `doc` for the given dialect.
///
/// Segments are re-validated here so documents built by hand go through
/// the same checks as parsed input. The finished payload must read back as
/// the same document, so neighbouring segments can never fuse into a
/// different mark.
pub fn render(doc: &MarkupDocument, dialect: Dialect, config: &MarkupConfig) -> MarkupResult<Rendered> {
    let mut out = Renderer {
        dialect,
        config,
        payload: String::new(),
        warnings: Vec::new(),
    };
    match dialect {
        Dialect::Inline => out.inline(doc)?,
        Dialect::Legacy => out.legacy(doc)?,
    }
    out.check_reads_back(doc)?;
    Ok(Rendered {
        dialect,
        payload: out.payload,
        warnings: out.warnings,
    })
}

struct Renderer<'a> {
    dialect: Dialect,
    config: &'a MarkupConfig,
    payload: String,
    warnings: Vec<RenderWarning>,
}

impl Renderer<'_> {
    fn position(&self) -> usize {
        self.payload.chars().count()
    }

    fn invalid(&self, token: impl Into<String>, reason: impl Into<String>) -> MarkupError {
        MarkupError::validation(token, self.position(), reason)
    }

    fn check_pause(&self, ms: u32) -> MarkupResult<()> {
        if self.config.pause_in_bounds(i64::from(ms)) {
            return Ok(());
        }
        Err(self.invalid(
            format!("sil<[{ms}]>"),
            format!(
                "pause of {ms}ms is outside the allowed range {}-{}ms",
                self.config.min_pause_ms, self.config.max_pause_ms
            ),
        ))
    }

    /// Re-parse the whole payload and compare it with what was rendered
    fn check_reads_back(&self, doc: &MarkupDocument) -> MarkupResult<()> {
        let expected = match self.dialect {
            Dialect::Inline => doc.clone(),
            Dialect::Legacy => legacy_reading(doc),
        };
        // Bounds were already enforced per segment; named sizes may fall outside them
        let relaxed = MarkupConfig {
            min_pause_ms: 0,
            max_pause_ms: u32::MAX,
            ..*self.config
        };
        let reason = "adjacent segments would be read back as different markup";

        let reparsed = match parse(&self.payload, self.dialect, &relaxed) {
            Ok(reparsed) => reparsed,
            Err(MarkupError::Validation { token, position, .. }) => {
                return Err(MarkupError::validation(token, position, reason));
            }
            Err(other) => return Err(other),
        };
        if reparsed == expected {
            return Ok(());
        }

        let got = reparsed.segments();
        let want = expected.segments();
        let first_diff = got
            .iter()
            .zip(want)
            .position(|(g, w)| g != w)
            .unwrap_or_else(|| got.len().min(want.len()));
        let token = got[first_diff.min(got.len())..]
            .iter()
            .find(|s| !matches!(s, Segment::Text { .. }))
            .or_else(|| got.get(first_diff))
            .or_else(|| want.get(first_diff))
            .map(inline_notation)
            .unwrap_or_default();
        let position = self
            .payload
            .find(&token)
            .map(|byte| self.payload[..byte].chars().count())
            .unwrap_or(0);
        Err(MarkupError::validation(token, position, reason))
    }

    fn stressed_inline(&self, word: &str, vowel_index: usize) -> MarkupResult<String> {
        let chars: Vec<char> = word.chars().collect();
        let well_formed = chars
            .get(vowel_index)
            .is_some_and(|c| self.config.language.is_vowel(*c))
            && chars.iter().all(|c| c.is_alphabetic() || *c == '-');
        if !well_formed {
            return Err(self.invalid(
                word,
                format!("stress position {vowel_index} does not point at a vowel of a single word"),
            ));
        }
        let mut marked = String::with_capacity(word.len() + 1);
        for (i, c) in chars.into_iter().enumerate() {
            if i == vowel_index {
                marked.push('+');
            }
            marked.push(c);
        }
        Ok(marked)
    }

    // -------------------------------------------------------------------------
    // Inline markers
    // -------------------------------------------------------------------------

    fn inline(&mut self, doc: &MarkupDocument) -> MarkupResult<()> {
        for segment in doc.segments() {
            match segment {
                Segment::Text { text } => {
                    if let Some(token) = inline_collision(text, self.config) {
                        return Err(self.invalid(
                            token,
                            "text would be read back as inline markup",
                        ));
                    }
                    self.payload.push_str(text);
                }
                Segment::Pause { ms } => {
                    self.check_pause(*ms)?;
                    self.payload.push_str(&format!("sil<[{ms}]>"));
                }
                Segment::NamedPause { size } => {
                    self.payload.push_str(&format!("<[{size}]>"));
                }
                Segment::Stressed { word, vowel_index } => {
                    let marked = self.stressed_inline(word, *vowel_index)?;
                    self.payload.push_str(&marked);
                }
                Segment::Emphasis { text } => {
                    if text.trim().is_empty() || inline_collision(text, self.config).is_some() {
                        return Err(self.invalid(
                            format!("**{text}**"),
                            "emphasis must wrap plain, non-empty text",
                        ));
                    }
                    self.payload.push_str("**");
                    self.payload.push_str(text);
                    self.payload.push_str("**");
                }
            }
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Legacy SSML
    // -------------------------------------------------------------------------

    fn legacy(&mut self, doc: &MarkupDocument) -> MarkupResult<()> {
        self.payload.push_str("<speak>");
        for segment in doc.segments() {
            match segment {
                Segment::Text { text } => self.legacy_text(text)?,
                Segment::Pause { ms } => {
                    self.check_pause(*ms)?;
                    self.push_break(*ms);
                }
                Segment::NamedPause { size } => self.push_break(size.duration_ms()),
                Segment::Stressed { word, vowel_index } => {
                    let token = self.stressed_inline(word, *vowel_index)?;
                    self.lossy("stress mark", token)?;
                    self.legacy_text(word)?;
                }
                Segment::Emphasis { text } => {
                    self.lossy("emphasis", format!("**{text}**"))?;
                    self.legacy_text(text)?;
                }
            }
        }
        self.payload.push_str("</speak>");
        Ok(())
    }

    fn legacy_text(&mut self, text: &str) -> MarkupResult<()> {
        let escaped = escape_xml(text);
        if let Some(token) = text_collision(&escaped, text, Dialect::Legacy, self.config) {
            return Err(self.invalid(token, "text would be read back as markup"));
        }
        self.payload.push_str(&escaped);
        Ok(())
    }

    fn push_break(&mut self, ms: u32) {
        self.payload
            .push_str(&format!("<break time=\"{}\"/>", format_seconds(ms)));
    }

    fn lossy(&mut self, feature: &'static str, token: String) -> MarkupResult<()> {
        match self.config.legacy_policy {
            LegacyPolicy::Strip => {
                tracing::debug!(feature, token = %token, "Dropping mark unsupported by legacy dialect");
                self.warnings.push(RenderWarning { feature, token });
                Ok(())
            }
            LegacyPolicy::Reject => Err(MarkupError::UnsupportedDialect {
                dialect: self.dialect,
                feature,
                token,
            }),
        }
    }
}

/// The document a legacy payload reads back as: stripped marks become
/// text and named sizes become their durations.
fn legacy_reading(doc: &MarkupDocument) -> MarkupDocument {
    MarkupDocument::from_segments(doc.segments().iter().map(|segment| match segment {
        Segment::NamedPause { size } => Segment::Pause {
            ms: size.duration_ms(),
        },
        Segment::Stressed { word, .. } => Segment::text(word.clone()),
        Segment::Emphasis { text } => Segment::text(text.clone()),
        other => other.clone(),
    }))
}

/// A segment written in the inline dialect, for error messages
fn inline_notation(segment: &Segment) -> String {
    match segment {
        Segment::Text { text } => text.clone(),
        Segment::Pause { ms } => format!("sil<[{ms}]>"),
        Segment::NamedPause { size } => format!("<[{size}]>"),
        Segment::Stressed { word, vowel_index } => word
            .chars()
            .enumerate()
            .flat_map(|(i, c)| (i == *vowel_index).then_some('+').into_iter().chain([c]))
            .collect(),
        Segment::Emphasis { text } => format!("**{text}**"),
    }
}

/// Milliseconds as an SSML seconds value: 300 -> `0.3s`, 1000 -> `1s`
pub fn format_seconds(ms: u32) -> String {
    let secs = ms / 1000;
    let frac = ms % 1000;
    if frac == 0 {
        return format!("{secs}s");
    }
    let frac = format!("{frac:03}");
    format!("{secs}.{}s", frac.trim_end_matches('0'))
}

/// Escape XML special characters in text content
pub fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
