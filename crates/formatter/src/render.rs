//! Formatter - applies an output template to one event

use chrono::FixedOffset;
use serde_json::{Map, Value};
use std::fmt::Write;

use contracts::{FormatProvider, Level, LogEvent, TranscriptError};

use crate::message::{referenced_names, render_message, render_value};
use crate::template::{LetterCase, LevelStyle, OutputTemplate, PropertyKind, Token};

/// Renders events through a parsed output template
#[derive(Debug, Clone)]
pub struct Formatter {
    template: OutputTemplate,
    provider: FormatProvider,
    offset: Option<FixedOffset>,
}

impl Formatter {
    /// Create a formatter
    ///
    /// # Errors
    /// Configuration error for a malformed template or an out-of-range UTC offset
    pub fn new(template: &str, provider: FormatProvider) -> Result<Self, TranscriptError> {
        let template = OutputTemplate::parse(template)?;
        let offset = provider
            .utc_offset_minutes
            .map(|minutes| {
                minutes
                    .checked_mul(60)
                    .and_then(FixedOffset::east_opt)
                    .ok_or_else(|| {
                        TranscriptError::configuration(
                            "format_provider.utc_offset_minutes",
                            format!("offset {minutes} is out of range"),
                        )
                    })
            })
            .transpose()?;

        Ok(Self {
            template,
            provider,
            offset,
        })
    }

    pub fn template(&self) -> &str {
        self.template.source()
    }

    pub fn provider(&self) -> &FormatProvider {
        &self.provider
    }

    /// Render an event into one line
    pub fn format(&self, event: &LogEvent) -> String {
        let mut out = String::new();
        self.format_into(event, &mut out);
        out
    }

    /// Line used when rendering an event fails: level abbreviation and raw template
    pub fn fallback(event: &LogEvent) -> String {
        let mut line = format!(
            "{} [{}] {}",
            event.timestamp.to_rfc3339(),
            event.level.abbreviation(),
            event.message_template
        );
        if let Some(exception) = &event.exception {
            line.push('\n');
            line.push_str(exception);
        }
        line
    }

    fn format_into(&self, event: &LogEvent, out: &mut String) {
        for token in self.template.tokens() {
            match token {
                Token::Text(text) => out.push_str(text),
                Token::Property { kind, alignment } => match alignment {
                    Some(alignment) => {
                        let mut scratch = String::new();
                        self.render_property(kind, event, &mut scratch);
                        alignment.apply(&scratch, out);
                    }
                    None => self.render_property(kind, event, out),
                },
            }
        }
    }

    fn render_property(&self, kind: &PropertyKind, event: &LogEvent, out: &mut String) {
        match kind {
            PropertyKind::Timestamp(pattern) => {
                let ts = match self.offset {
                    Some(offset) => event.timestamp.with_timezone(&offset),
                    None => event.timestamp,
                };
                pattern.render(&ts, out);
            }
            PropertyKind::Level(style) => render_level(event.level, *style, out),
            PropertyKind::Message(style) => render_message(
                &event.message_template,
                &event.properties,
                *style,
                &self.provider,
                out,
            ),
            PropertyKind::NewLine => out.push('\n'),
            PropertyKind::Exception => {
                if let Some(exception) = &event.exception {
                    out.push_str(exception);
                    out.push('\n');
                }
            }
            PropertyKind::Properties(_) => {
                let referenced = referenced_names(&event.message_template);
                let rest: Map<String, Value> = event
                    .properties
                    .iter()
                    .filter(|(name, _)| !referenced.contains(&name.as_str()))
                    .map(|(name, value)| (name.clone(), value.clone()))
                    .collect();
                let _ = write!(out, "{}", Value::Object(rest));
            }
            PropertyKind::Named(name, style) => {
                if let Some(value) = event.properties.get(name) {
                    render_value(value, *style, &self.provider, out);
                }
            }
        }
    }
}

fn render_level(level: Level, style: LevelStyle, out: &mut String) {
    let LevelStyle::Styled { case, width } = style else {
        out.push_str(level.name());
        return;
    };

    let base: String = match width {
        Some(3) => level.abbreviation().to_string(),
        Some(w) => level.name().chars().take(w).collect(),
        None => level.name().to_string(),
    };

    match case {
        LetterCase::Upper => out.push_str(&base.to_uppercase()),
        LetterCase::Lower => out.push_str(&base.to_lowercase()),
        LetterCase::Title => {
            let mut chars = base.chars();
            if let Some(first) = chars.next() {
                out.extend(first.to_uppercase());
                out.push_str(&chars.as_str().to_lowercase());
            }
        }
    }
}
