//! Output template parsing
//!
//! Malformed templates are rejected here so rendering never has to.

use thiserror::Error;

use contracts::TranscriptError;

use crate::timestamp::TimestampPattern;

/// Template parse errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("unbalanced '{brace}' at position {position}")]
    UnbalancedBrace { brace: char, position: usize },

    #[error("empty or invalid property name '{name}' at position {position}")]
    InvalidName { name: String, position: usize },

    #[error("invalid alignment '{value}' for property '{property}'")]
    InvalidAlignment { property: String, value: String },

    #[error("invalid format '{format}' for property '{property}': {message}")]
    InvalidFormat {
        property: String,
        format: String,
        message: String,
    },

    #[error("invalid timestamp pattern '{pattern}': {message}")]
    Timestamp { pattern: String, message: String },
}

impl TemplateError {
    pub(crate) fn timestamp(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Timestamp {
            pattern: pattern.into(),
            message: message.into(),
        }
    }

    fn format(property: &str, format: &str, message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            property: property.to_string(),
            format: format.to_string(),
            message: message.into(),
        }
    }
}

impl From<TemplateError> for TranscriptError {
    fn from(err: TemplateError) -> Self {
        TranscriptError::configuration("output_template", err.to_string())
    }
}

/// Padding applied to a rendered token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Alignment {
    pub width: usize,
    /// Pad on the right instead of the left
    pub left: bool,
}

impl Alignment {
    pub(crate) fn apply(&self, text: &str, out: &mut String) {
        let len = text.chars().count();
        let pad = self.width.saturating_sub(len);
        if !self.left {
            out.extend(std::iter::repeat(' ').take(pad));
        }
        out.push_str(text);
        if self.left {
            out.extend(std::iter::repeat(' ').take(pad));
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LetterCase {
    Upper,
    Lower,
    Title,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LevelStyle {
    /// `Information`
    Full,
    /// `u3` -> `INF`, `w` -> `information`, `t1` -> `I`
    Styled {
        case: LetterCase,
        width: Option<usize>,
    },
}

/// How a value is rendered: `l` drops quotes around strings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct ValueStyle {
    pub literal: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PropertyKind {
    Timestamp(TimestampPattern),
    Level(LevelStyle),
    Message(ValueStyle),
    NewLine,
    Exception,
    Properties(ValueStyle),
    Named(String, ValueStyle),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    Text(String),
    Property {
        kind: PropertyKind,
        alignment: Option<Alignment>,
    },
}

/// A parsed output template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTemplate {
    source: String,
    tokens: Vec<Token>,
}

impl OutputTemplate {
    /// Parse an output template
    ///
    /// # Errors
    /// Returns the first syntax or format error found
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let mut tokens = Vec::new();
        let mut text = String::new();
        let mut chars = source.char_indices().peekable();

        while let Some((pos, c)) = chars.next() {
            match c {
                '{' if matches!(chars.peek(), Some((_, '{'))) => {
                    chars.next();
                    text.push('{');
                }
                '}' if matches!(chars.peek(), Some((_, '}'))) => {
                    chars.next();
                    text.push('}');
                }
                '}' => {
                    return Err(TemplateError::UnbalancedBrace {
                        brace: '}',
                        position: pos,
                    })
                }
                '{' => {
                    let mut body = String::new();
                    let mut closed = false;
                    for (_, inner) in chars.by_ref() {
                        match inner {
                            '}' => {
                                closed = true;
                                break;
                            }
                            '{' => break,
                            other => body.push(other),
                        }
                    }
                    if !closed {
                        return Err(TemplateError::UnbalancedBrace {
                            brace: '{',
                            position: pos,
                        });
                    }
                    if !text.is_empty() {
                        tokens.push(Token::Text(std::mem::take(&mut text)));
                    }
                    tokens.push(parse_property(&body, pos)?);
                }
                other => text.push(other),
            }
        }

        if !text.is_empty() {
            tokens.push(Token::Text(text));
        }

        Ok(Self {
            source: source.to_string(),
            tokens,
        })
    }

    /// The template text this was parsed from
    pub fn source(&self) -> &str {
        &self.source
    }

    pub(crate) fn tokens(&self) -> &[Token] {
        &self.tokens
    }
}

/// Parse `Name[,alignment][:format]`
fn parse_property(body: &str, position: usize) -> Result<Token, TemplateError> {
    let (head, format) = match body.split_once(':') {
        Some((head, format)) => (head, Some(format)),
        None => (body, None),
    };
    let (name, alignment) = match head.split_once(',') {
        Some((name, alignment)) => (name.trim(), Some(alignment.trim())),
        None => (head.trim(), None),
    };

    if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Err(TemplateError::InvalidName {
            name: name.to_string(),
            position,
        });
    }

    let alignment = alignment
        .map(|value| parse_alignment(name, value))
        .transpose()?;

    let kind = match name {
        "Timestamp" => PropertyKind::Timestamp(match format {
            Some(pattern) => TimestampPattern::parse(pattern)?,
            None => TimestampPattern::default(),
        }),
        "Level" => PropertyKind::Level(parse_level_style(format)?),
        "Message" => PropertyKind::Message(parse_value_style(name, format)?),
        "NewLine" => PropertyKind::NewLine,
        "Exception" => PropertyKind::Exception,
        "Properties" => PropertyKind::Properties(parse_value_style(name, format)?),
        other => PropertyKind::Named(other.to_string(), parse_value_style(other, format)?),
    };

    Ok(Token::Property { kind, alignment })
}

fn parse_alignment(property: &str, value: &str) -> Result<Alignment, TemplateError> {
    let invalid = || TemplateError::InvalidAlignment {
        property: property.to_string(),
        value: value.to_string(),
    };
    let (left, digits) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value),
    };
    let width: usize = digits.parse().map_err(|_| invalid())?;
    if width == 0 {
        return Err(invalid());
    }
    Ok(Alignment { width, left })
}

fn parse_level_style(format: Option<&str>) -> Result<LevelStyle, TemplateError> {
    let Some(format) = format else {
        return Ok(LevelStyle::Full);
    };
    let mut chars = format.chars();
    let case = match chars.next() {
        Some('u') => LetterCase::Upper,
        Some('w') => LetterCase::Lower,
        Some('t') => LetterCase::Title,
        _ => return Err(TemplateError::format("Level", format, "expected u, w or t")),
    };
    let digits = chars.as_str();
    let width = if digits.is_empty() {
        None
    } else {
        match digits.parse::<usize>() {
            Ok(w) if w > 0 => Some(w),
            _ => {
                return Err(TemplateError::format(
                    "Level",
                    format,
                    "width must be a positive number",
                ))
            }
        }
    };
    Ok(LevelStyle::Styled { case, width })
}

fn parse_value_style(property: &str, format: Option<&str>) -> Result<ValueStyle, TemplateError> {
    let Some(format) = format else {
        return Ok(ValueStyle::default());
    };
    if let Some(bad) = format.chars().find(|c| !matches!(c, 'l' | 'j')) {
        return Err(TemplateError::format(
            property,
            format,
            format!("unsupported flag '{bad}', expected l or j"),
        ));
    }
    Ok(ValueStyle {
        literal: format.contains('l'),
    })
}
