//! Error types for CLI operations.

use contracts::TranscriptError;
use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Input could not be opened
    #[error("Cannot open input '{input}': {source}")]
    InputOpen {
        input: String,
        #[source]
        source: std::io::Error,
    },

    /// One input line is not a valid LogEvent
    #[error("Invalid event on line {line}: {message}")]
    EventParse { line: usize, message: String },

    /// Transcript construction or configuration error
    #[error(transparent)]
    Transcript(#[from] TranscriptError),
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn input_open(input: impl Into<String>, source: std::io::Error) -> Self {
        Self::InputOpen {
            input: input.into(),
            source,
        }
    }

    pub fn event_parse(line: usize, message: impl Into<String>) -> Self {
        Self::EventParse {
            line,
            message: message.into(),
        }
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
