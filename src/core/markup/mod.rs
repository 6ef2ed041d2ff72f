//! Markup translator.
//!
//! Converts the lightweight annotation syntax users type into the payload a
//! synthesis backend expects:
//!
//! | Mark            | Input          | Inline dialect | Legacy dialect           |
//! |-----------------|----------------|----------------|--------------------------|
//! | Explicit pause  | `sil<[300]>`   | `sil<[300]>`   | `<break time="0.3s"/>`   |
//! | Named pause     | `<[medium]>`   | `<[medium]>`   | `<break time="0.5s"/>`   |
//! | Stress          | `м+олоко`      | `м+олоко`      | `молоко` (+ warning)     |
//! | Emphasis        | `**важно**`    | `**важно**`    | `важно` (+ warning)      |
//!
//! Everything here is a pure function of its arguments and can be called
//! from any number of tasks at once.
//!
//! # Example
//!
//! ```rust,ignore
//! use echosage::core::markup::{translate, Dialect, MarkupConfig};
//!
//! let rendered = translate("Привет sil<[300]> мир", Dialect::Inline, Dialect::Legacy, &MarkupConfig::default())?;
//! assert_eq!(rendered.payload, "<speak>Привет <break time=\"0.3s\"/> мир</speak>");
//! ```

mod config;
mod document;
mod error;
mod parser;
mod render;


pub use config::{
    DEFAULT_MAX_PAUSE_MS, DEFAULT_MIN_PAUSE_MS, Dialect, Language, LegacyPolicy, MarkupConfig,
};
pub use document::{MarkupDocument, PauseSize, Segment};
pub use error::{MarkupError, MarkupResult};
pub use parser::parse;
pub use render::{RenderWarning, Rendered, escape_xml, format_seconds, render};

/// Parse `input` written in `source` and render it as `target`.
pub fn translate(
    input: &str,
    source: Dialect,
    target: Dialect,
    config: &MarkupConfig,
) -> MarkupResult<Rendered> {
    let doc = parse(input, source, config)?;
    let rendered = render(&doc, target, config)?;
    if !rendered.warnings.is_empty() {
        tracing::debug!(
            source = %source,
            target = %target,
            warnings = rendered.warnings.len(),
            "Markup translated with dropped marks"
        );
    }
    Ok(rendered)
}
