//! JSON-lines event input.

use std::fs::File;
use std::io::{self, BufRead, BufReader};

use contracts::LogEvent;
use tokio::io::AsyncBufRead;

use crate::error::{CliError, Result};

/// Open `-` (stdin) or a file for line-by-line reading
pub fn open(input: &str) -> Result<Box<dyn BufRead>> {
    if input == "-" {
        return Ok(Box::new(BufReader::new(io::stdin())));
    }
    let file = File::open(input).map_err(|e| CliError::input_open(input, e))?;
    Ok(Box::new(BufReader::new(file)))
}

/// Async counterpart of [`open`]
pub async fn open_async(input: &str) -> Result<Box<dyn AsyncBufRead + Unpin + Send>> {
    if input == "-" {
        return Ok(Box::new(tokio::io::BufReader::new(tokio::io::stdin())));
    }
    let file = tokio::fs::File::open(input)
        .await
        .map_err(|e| CliError::input_open(input, e))?;
    Ok(Box::new(tokio::io::BufReader::new(file)))
}

/// Parse one input line; blank lines yield `None`
pub fn parse_event(line_no: usize, line: &str) -> Result<Option<LogEvent>> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(trimmed)
        .map(Some)
        .map_err(|e| CliError::event_parse(line_no, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::Level;

    #[test]
    fn test_parse_event_line() {
        let line = r#"{"timestamp":"2024-03-01T09:05:07.042+02:00","level":"Warning","message_template":"Disk at {Pct}%","properties":{"Pct":91}}"#;
        let event = parse_event(1, line).unwrap().unwrap();
        assert_eq!(event.level, Level::Warning);
        assert_eq!(event.properties["Pct"], 91);
    }

    #[test]
    fn test_blank_line_skipped() {
        assert!(parse_event(3, "   ").unwrap().is_none());
    }

    #[test]
    fn test_invalid_line_reports_position() {
        let err = parse_event(7, "{not json").unwrap_err();
        assert!(err.to_string().starts_with("Invalid event on line 7"));
    }

    #[test]
    fn test_missing_file() {
        let err = open("/nonexistent/events.jsonl").err().unwrap();
        assert!(matches!(err, CliError::InputOpen { .. }));
    }
}
