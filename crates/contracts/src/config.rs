//! TranscriptConfig - configuration surface of a transcript sink

use serde::{Deserialize, Serialize};

use crate::{DeliveryMetadata, DEFAULT_SUBJECT};

/// Output template used when none is configured
pub const DEFAULT_OUTPUT_TEMPLATE: &str =
    "{Timestamp:yyyy-MM-dd HH:mm:ss.fff zzz} [{Level:u3}] {Message:lj}{NewLine}{Exception}";

/// Separator placed between rendered lines in the message body
pub const DEFAULT_LINE_SEPARATOR: &str = "\r\n";

/// Locale surrogate controlling culture-sensitive rendering.
///
/// The invariant provider keeps transcripts identical across machines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatProvider {
    /// Decimal separator for floating-point values
    #[serde(default = "default_decimal_separator")]
    pub decimal_separator: char,

    /// Render every timestamp in this UTC offset (minutes); `None` keeps the event's own offset
    #[serde(default)]
    pub utc_offset_minutes: Option<i32>,
}

fn default_decimal_separator() -> char {
    '.'
}

impl FormatProvider {
    /// Locale-independent provider
    pub fn invariant() -> Self {
        Self {
            decimal_separator: '.',
            utc_offset_minutes: None,
        }
    }
}

impl Default for FormatProvider {
    fn default() -> Self {
        Self::invariant()
    }
}

/// Transcript sink configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptConfig {
    /// Sink name (used for logging, metrics and diagnostics)
    #[serde(default = "default_name")]
    pub name: String,

    /// Output template applied to each event
    #[serde(default = "default_output_template")]
    pub output_template: String,

    /// Culture-sensitive formatting
    #[serde(default)]
    pub format_provider: FormatProvider,

    /// Skip the decision callback entirely when nothing is buffered
    #[serde(default = "default_skip_if_empty")]
    pub skip_if_empty: bool,

    /// Evict the oldest lines beyond this many (`None` = unbounded)
    #[serde(default)]
    pub max_buffered_lines: Option<usize>,

    /// Default subject of every transcript
    #[serde(default = "default_subject")]
    pub subject: String,

    /// Separator between rendered lines in the body
    #[serde(default = "default_line_separator")]
    pub line_separator: String,

    /// Default delivery endpoint, overridable by the decision callback
    #[serde(default)]
    pub delivery: DeliveryMetadata,
}

fn default_name() -> String {
    "transcript".to_string()
}

fn default_output_template() -> String {
    DEFAULT_OUTPUT_TEMPLATE.to_string()
}

fn default_skip_if_empty() -> bool {
    true
}

fn default_subject() -> String {
    DEFAULT_SUBJECT.to_string()
}

fn default_line_separator() -> String {
    DEFAULT_LINE_SEPARATOR.to_string()
}

impl Default for TranscriptConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            output_template: default_output_template(),
            format_provider: FormatProvider::default(),
            skip_if_empty: true,
            max_buffered_lines: None,
            subject: default_subject(),
            line_separator: default_line_separator(),
            delivery: DeliveryMetadata::default(),
        }
    }
}
