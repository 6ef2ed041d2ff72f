//! Left-to-right tokenizer for the annotation syntax.
//!
//! Recognised tokens become typed segments; anything that merely looks like
//! markup (`<3>`, `<[rate=slow]>`, `2+2`) is kept as literal text.

use std::sync::LazyLock;

use regex::Regex;

use super::config::{Dialect, MarkupConfig};
use super::document::{MarkupDocument, PauseSize, Segment};
use super::error::{MarkupError, MarkupResult};

const EXPLICIT_PAUSE_OPEN: &str = "sil<[";
const NAMED_PAUSE_OPEN: &str = "<[";
const TOKEN_CLOSE: &str = "]>";
const EMPHASIS: &str = "**";

/// `name="value"` or `name='value'` inside an SSML tag
static ATTRIBUTE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([A-Za-z][\w-]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
        .expect("attribute pattern is valid")
});

/// Parse `input` into a validated document.
///
/// The legacy dialect additionally accepts `<break .../>` elements, the
/// `<speak>` envelope and XML entities.
pub fn parse(input: &str, dialect: Dialect, config: &MarkupConfig) -> MarkupResult<MarkupDocument> {
    Parser::new(input, 0, dialect, config).run()
}

/// Check that `rendered`, the serialised form of the plain text `expected`,
/// reads back in `dialect` as that same single text run. Returns the
/// colliding token otherwise.
pub(crate) fn text_collision(
    rendered: &str,
    expected: &str,
    dialect: Dialect,
    config: &MarkupConfig,
) -> Option<String> {
    match parse(rendered, dialect, config) {
        Err(e) => Some(e.token().to_string()),
        Ok(doc) => match doc.segments() {
            [] if expected.is_empty() => None,
            [Segment::Text { text }] if text == expected => None,
            segments => Some(
                segments
                    .iter()
                    .find(|s| !matches!(s, Segment::Text { .. }))
                    .map(|s| format!("{s:?}"))
                    .unwrap_or_else(|| expected.to_string()),
            ),
        },
    }
}

/// Inline shorthand for [`text_collision`]
pub(crate) fn inline_collision(text: &str, config: &MarkupConfig) -> Option<String> {
    text_collision(text, text, Dialect::Inline, config)
}

struct Parser<'a> {
    chars: Vec<char>,
    pos: usize,
    /// Char offset of `chars[0]` in the original input, for error positions
    offset: usize,
    dialect: Dialect,
    config: &'a MarkupConfig,
    doc: MarkupDocument,
    pending: String,
}

impl<'a> Parser<'a> {
    fn new(input: &str, offset: usize, dialect: Dialect, config: &'a MarkupConfig) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
            offset,
            dialect,
            config,
            doc: MarkupDocument::new(),
            pending: String::new(),
        }
    }

    fn run(mut self) -> MarkupResult<MarkupDocument> {
        while self.pos < self.chars.len() {
            let handled = if self.starts_with(EXPLICIT_PAUSE_OPEN) {
                self.explicit_pause()?
            } else if self.starts_with(NAMED_PAUSE_OPEN) {
                self.named_pause()?
            } else if self.starts_with(EMPHASIS) {
                self.emphasis()?
            } else if self.chars[self.pos] == '+' {
                self.stress()?
            } else if self.dialect == Dialect::Legacy {
                self.legacy_token()?
            } else {
                false
            };

            if !handled {
                self.pending.push(self.chars[self.pos]);
                self.pos += 1;
            }
        }
        self.flush_text();
        Ok(self.doc)
    }

    // -------------------------------------------------------------------------
    // Cursor helpers
    // -------------------------------------------------------------------------

    fn starts_with(&self, pat: &str) -> bool {
        self.starts_with_at(self.pos, pat, false)
    }

    fn starts_with_ignore_case(&self, pat: &str) -> bool {
        self.starts_with_at(self.pos, pat, true)
    }

    fn starts_with_at(&self, at: usize, pat: &str, ignore_case: bool) -> bool {
        let mut i = at;
        for p in pat.chars() {
            match self.chars.get(i) {
                Some(c) if *c == p => {}
                Some(c) if ignore_case && c.to_ascii_lowercase() == p => {}
                _ => return false,
            }
            i += 1;
        }
        true
    }

    fn find_from(&self, from: usize, pat: &str) -> Option<usize> {
        (from..self.chars.len()).find(|&i| self.starts_with_at(i, pat, false))
    }

    fn slice(&self, start: usize, end: usize) -> String {
        self.chars[start..end].iter().collect()
    }

    fn position(&self, at: usize) -> usize {
        self.offset + at
    }

    fn error(&self, start: usize, end: usize, reason: impl Into<String>) -> MarkupError {
        MarkupError::validation(self.slice(start, end), self.position(start), reason)
    }

    fn flush_text(&mut self) {
        if !self.pending.is_empty() {
            let text = std::mem::take(&mut self.pending);
            self.doc.push(Segment::Text { text });
        }
    }

    fn push(&mut self, segment: Segment) {
        self.flush_text();
        self.doc.push(segment);
    }

    /// Content between an opener and `]>`, if it forms a bracket token.
    fn bracket_content(&self, content_start: usize) -> Option<(String, usize)> {
        let close = self.find_from(content_start, TOKEN_CLOSE)?;
        let content = self.slice(content_start, close);
        if content.chars().any(|c| matches!(c, '<' | '>' | '[' | ']' | '\n')) {
            return None;
        }
        Some((content, close + TOKEN_CLOSE.len()))
    }

    // -------------------------------------------------------------------------
    // Pauses
    // -------------------------------------------------------------------------

    fn explicit_pause(&mut self) -> MarkupResult<bool> {
        let start = self.pos;
        let Some((content, end)) = self.bracket_content(start + EXPLICIT_PAUSE_OPEN.len()) else {
            return Ok(false);
        };

        // Bare digits with an optional leading minus
        let digits = content.strip_prefix('-').unwrap_or(&content);
        let canonical = !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit());
        let ms: i64 = canonical
            .then(|| content.parse().ok())
            .flatten()
            .ok_or_else(|| {
                self.error(
                    start,
                    end,
                    "pause duration must be an integer number of milliseconds without spaces or sign",
                )
            })?;
        let ms = self.checked_pause(ms, start, end)?;

        self.push(Segment::Pause { ms });
        self.pos = end;
        Ok(true)
    }

    fn named_pause(&mut self) -> MarkupResult<bool> {
        let start = self.pos;
        let Some((content, end)) = self.bracket_content(start + NAMED_PAUSE_OPEN.len()) else {
            return Ok(false);
        };

        let looks_like_size = !content.is_empty()
            && content
                .chars()
                .all(|c| c.is_ascii_alphabetic() || c == '-' || c == '_');
        if !looks_like_size {
            return Ok(false);
        }

        let size = PauseSize::from_name(&content).ok_or_else(|| {
            self.error(
                start,
                end,
                format!(
                    "unknown pause size '{content}', expected one of: {}",
                    size_names()
                ),
            )
        })?;

        self.push(Segment::NamedPause { size });
        self.pos = end;
        Ok(true)
    }

    fn checked_pause(&self, ms: i64, start: usize, end: usize) -> MarkupResult<u32> {
        if !self.config.pause_in_bounds(ms) {
            return Err(self.error(
                start,
                end,
                format!(
                    "pause of {ms}ms is outside the allowed range {}-{}ms",
                    self.config.min_pause_ms, self.config.max_pause_ms
                ),
            ));
        }
        // In bounds implies it fits u32
        Ok(ms as u32)
    }

    // -------------------------------------------------------------------------
    // Emphasis
    // -------------------------------------------------------------------------

    fn emphasis(&mut self) -> MarkupResult<bool> {
        let start = self.pos;
        let content_start = start + EMPHASIS.len();
        let Some(close) = self.find_from(content_start, EMPHASIS) else {
            return Err(self.error(start, self.chars.len(), "unterminated emphasis, missing closing '**'"));
        };
        let end = close + EMPHASIS.len();

        let raw = self.slice(content_start, close);
        if raw.trim().is_empty() {
            return Err(self.error(start, end, "emphasis must wrap a word or phrase"));
        }

        let inner = Parser::new(&raw, self.position(content_start), self.dialect, self.config).run()?;
        let text = match inner.into_segments().as_slice() {
            [Segment::Text { text }] => text.clone(),
            _ => {
                return Err(self.error(
                    start,
                    end,
                    "nested markup inside emphasis is not allowed",
                ));
            }
        };

        self.push(Segment::Emphasis { text });
        self.pos = end;
        Ok(true)
    }

    // -------------------------------------------------------------------------
    // Stress
    // -------------------------------------------------------------------------

    fn is_vowel_at(&self, at: usize) -> bool {
        self.chars
            .get(at)
            .is_some_and(|c| self.config.language.is_vowel(*c))
    }

    fn is_letter_at(&self, at: usize) -> bool {
        self.chars.get(at).is_some_and(|c| c.is_alphabetic())
    }

    fn stress(&mut self) -> MarkupResult<bool> {
        let plus = self.pos;
        let prev_is_letter = plus > 0 && self.is_letter_at(plus - 1);

        if !self.is_vowel_at(plus + 1) {
            if prev_is_letter || self.is_letter_at(plus + 1) {
                let end = (plus + 2).min(self.chars.len());
                return Err(self.error(plus, end, "stress mark '+' must directly precede a vowel"));
            }
            return Ok(false);
        }

        // The word prefix has already been buffered as pending text
        let mut prefix: Vec<char> = Vec::new();
        while let Some(c) = self.pending.chars().last() {
            if !(c.is_alphabetic() || c == '-') {
                break;
            }
            self.pending.pop();
            prefix.push(c);
        }
        prefix.reverse();
        while prefix.first() == Some(&'-') {
            self.pending.push(prefix.remove(0));
        }

        let word_start = plus - prefix.len();
        let vowel_index = prefix.len();
        let mut word: String = prefix.into_iter().collect();
        word.push(self.chars[plus + 1]);

        let mut i = plus + 2;
        while i < self.chars.len() {
            let c = self.chars[i];
            if c == '+' {
                let mut end = i + 1;
                while end < self.chars.len() && (self.is_letter_at(end) || self.chars[end] == '+') {
                    end += 1;
                }
                let reason = if self.is_vowel_at(i + 1) {
                    "a word may carry only one stress mark"
                } else {
                    "stress mark '+' must directly precede a vowel"
                };
                return Err(self.error(word_start, end, reason));
            }
            let joins_word = c.is_alphabetic() || (c == '-' && self.is_letter_at(i + 1));
            if !joins_word {
                break;
            }
            word.push(c);
            i += 1;
        }

        self.push(Segment::Stressed { word, vowel_index });
        self.pos = i;
        Ok(true)
    }

    // -------------------------------------------------------------------------
    // Legacy-only tokens
    // -------------------------------------------------------------------------

    fn legacy_token(&mut self) -> MarkupResult<bool> {
        match self.chars[self.pos] {
            '<' if self.starts_with_ignore_case("<break") => self.legacy_break(),
            '<' => Ok(self.speak_envelope()),
            '&' => Ok(self.entity()),
            _ => Ok(false),
        }
    }

    fn legacy_break(&mut self) -> MarkupResult<bool> {
        let start = self.pos;
        let after_name = start + "<break".len();
        match self.chars.get(after_name) {
            Some(c) if c.is_whitespace() || *c == '/' || *c == '>' => {}
            _ => return Ok(false),
        }
        let Some(gt) = self.find_from(after_name, ">") else {
            return Ok(false);
        };

        let mut end = gt + 1;
        let self_closing = self.chars[gt - 1] == '/';
        let attributes = self.slice(after_name, if self_closing { gt - 1 } else { gt });
        if !self_closing {
            // `<break ...></break>` is accepted as well
            let mut close = end;
            while self.chars.get(close).is_some_and(|c| c.is_whitespace()) {
                close += 1;
            }
            if self.starts_with_at(close, "</break>", true) {
                end = close + "</break>".len();
            }
        }

        let mut time = None;
        let mut strength = None;
        for caps in ATTRIBUTE_PATTERN.captures_iter(&attributes) {
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();
            match caps[1].to_ascii_lowercase().as_str() {
                "time" => time = Some(value),
                "strength" => strength = Some(value),
                _ => {}
            }
        }

        let segment = if let Some(time) = time {
            let ms = parse_break_time(&time).map_err(|reason| self.error(start, end, reason))?;
            Segment::Pause {
                ms: self.checked_pause(ms, start, end)?,
            }
        } else if let Some(strength) = strength {
            let size = PauseSize::from_ssml_strength(&strength).ok_or_else(|| {
                self.error(
                    start,
                    end,
                    format!(
                        "unknown break strength '{strength}', expected x-weak, weak, medium, strong or x-strong"
                    ),
                )
            })?;
            Segment::NamedPause { size }
        } else {
            return Err(self.error(
                start,
                end,
                "break element needs a time or strength attribute",
            ));
        };

        self.push(segment);
        self.pos = end;
        Ok(true)
    }

    /// `<speak ...>` and `</speak>` carry no content of their own.
    fn speak_envelope(&mut self) -> bool {
        if self.starts_with_ignore_case("</speak>") {
            self.pos += "</speak>".len();
            return true;
        }
        if !self.starts_with_ignore_case("<speak") {
            return false;
        }
        match self.chars.get(self.pos + "<speak".len()) {
            Some(c) if c.is_whitespace() || *c == '>' => {}
            _ => return false,
        }
        match self.find_from(self.pos, ">") {
            Some(gt) => {
                self.pos = gt + 1;
                true
            }
            None => false,
        }
    }

    fn entity(&mut self) -> bool {
        const ENTITIES: [(&str, char); 5] = [
            ("&amp;", '&'),
            ("&lt;", '<'),
            ("&gt;", '>'),
            ("&quot;", '"'),
            ("&apos;", '\''),
        ];
        for (name, decoded) in ENTITIES {
            if self.starts_with(name) {
                self.pending.push(decoded);
                self.pos += name.chars().count();
                return true;
            }
        }
        false
    }
}

fn size_names() -> String {
    PauseSize::all()
        .iter()
        .map(PauseSize::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Convert an SSML time value (`500ms`, `0.3s`) to whole milliseconds.
fn parse_break_time(value: &str) -> Result<i64, String> {
    let value = value.trim().to_ascii_lowercase();
    let (number, scale) = if let Some(n) = value.strip_suffix("ms") {
        (n, 1.0)
    } else if let Some(n) = value.strip_suffix('s') {
        (n, 1000.0)
    } else {
        return Err(format!("break time '{value}' must end with 'ms' or 's'"));
    };

    let parsed: f64 = number
        .trim()
        .parse()
        .map_err(|_| format!("break time '{value}' is not a number"))?;
    if !parsed.is_finite() {
        return Err(format!("break time '{value}' is not a number"));
    }
    Ok((parsed * scale).round() as i64)
}
