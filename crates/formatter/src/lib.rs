//! # Formatter
//!
//! Renders one immutable [`LogEvent`](contracts::LogEvent) into one line of text.
//!
//! Responsibilities:
//! - Parse the output template once, at construction
//! - Render events without side effects
//! - Keep output deterministic through the [`FormatProvider`](contracts::FormatProvider)
//!
//! Template syntax: literal text with `{Property[,alignment][:format]}` tokens.
//! Built-in properties are `Timestamp`, `Level`, `Message`, `NewLine`,
//! `Exception` and `Properties`; any other name is looked up in the event's
//! bound properties.

mod message;
mod render;
mod template;
mod timestamp;

pub use render::Formatter;
pub use template::{Alignment, OutputTemplate, TemplateError};
pub use timestamp::TimestampPattern;
