//! Intermediate representation produced by the parser.

use serde::{Deserialize, Serialize};

// =============================================================================
// Named pause sizes
// =============================================================================

/// Context-dependent pause sizes accepted as `<[size]>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PauseSize {
    Tiny,
    Small,
    Medium,
    Large,
    Huge,
}

impl PauseSize {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tiny => "tiny",
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
            Self::Huge => "huge",
        }
    }

    /// Exact, case-insensitive match against the enumeration.
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "tiny" => Some(Self::Tiny),
            "small" => Some(Self::Small),
            "medium" => Some(Self::Medium),
            "large" => Some(Self::Large),
            "huge" => Some(Self::Huge),
            _ => None,
        }
    }

    /// Map an SSML `strength` attribute onto a size
    pub fn from_ssml_strength(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "x-weak" => Some(Self::Tiny),
            "weak" => Some(Self::Small),
            "medium" => Some(Self::Medium),
            "strong" => Some(Self::Large),
            "x-strong" => Some(Self::Huge),
            _ => None,
        }
    }

    /// Duration used when the size has to be spelled out in milliseconds
    #[inline]
    pub fn duration_ms(&self) -> u32 {
        match self {
            Self::Tiny => 100,
            Self::Small => 250,
            Self::Medium => 500,
            Self::Large => 1000,
            Self::Huge => 2000,
        }
    }

    pub fn all() -> &'static [PauseSize] {
        &[
            Self::Tiny,
            Self::Small,
            Self::Medium,
            Self::Large,
            Self::Huge,
        ]
    }
}

impl std::fmt::Display for PauseSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Segments
// =============================================================================

/// A typed unit of a [`MarkupDocument`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Segment {
    /// Plain text, stored unescaped
    Text { text: String },
    /// Explicit pause in milliseconds (already bounds-checked)
    Pause { ms: u32 },
    /// Named-size pause
    NamedPause { size: PauseSize },
    /// A word with a stress mark on the vowel at `vowel_index` (char index)
    Stressed { word: String, vowel_index: usize },
    /// Emphasised word or phrase
    Emphasis { text: String },
}

impl Segment {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Text that would be spoken, with all marks removed
    pub fn spoken_text(&self) -> &str {
        match self {
            Self::Text { text } | Self::Emphasis { text } => text,
            Self::Stressed { word, .. } => word,
            Self::Pause { .. } | Self::NamedPause { .. } => "",
        }
    }

    pub fn is_pause(&self) -> bool {
        matches!(self, Self::Pause { .. } | Self::NamedPause { .. })
    }
}

// =============================================================================
// Document
// =============================================================================

/// Ordered sequence of segments. Adjacent text runs are always coalesced,
/// so two documents that render identically compare equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkupDocument {
    segments: Vec<Segment>,
}

impl MarkupDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_segments(segments: impl IntoIterator<Item = Segment>) -> Self {
        let mut doc = Self::new();
        for segment in segments {
            doc.push(segment);
        }
        doc
    }

    /// Append a segment, merging it into a preceding text run when possible
    pub fn push(&mut self, segment: Segment) {
        if let Segment::Text { text } = &segment {
            if text.is_empty() {
                return;
            }
            if let Some(Segment::Text { text: last }) = self.segments.last_mut() {
                last.push_str(text);
                return;
            }
        }
        self.segments.push(segment);
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn into_segments(self) -> Vec<Segment> {
        self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Text with every mark and pause removed
    pub fn plain_text(&self) -> String {
        self.segments.iter().map(Segment::spoken_text).collect()
    }

    /// True when the document holds stress or emphasis marks
    pub fn has_prosody_marks(&self) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Stressed { .. } | Segment::Emphasis { .. }))
    }

    pub fn pause_count(&self) -> usize {
        self.segments.iter().filter(|s| s.is_pause()).count()
    }

    /// Whether the document contains anything audible
    pub fn has_speech(&self) -> bool {
        self.segments
            .iter()
            .any(|s| !s.spoken_text().trim().is_empty())
    }
}
