//! LogEvent - the immutable record handed over by the logging framework

use chrono::{DateTime, FixedOffset, Local};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Event severity, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum Level {
    #[serde(alias = "verbose", alias = "trace")]
    Verbose,
    #[serde(alias = "debug")]
    Debug,
    #[default]
    #[serde(alias = "information", alias = "info")]
    Information,
    #[serde(alias = "warning", alias = "warn")]
    Warning,
    #[serde(alias = "error")]
    Error,
    #[serde(alias = "fatal")]
    Fatal,
}

impl Level {
    /// Full level name, e.g. `Information`
    pub fn name(self) -> &'static str {
        match self {
            Self::Verbose => "Verbose",
            Self::Debug => "Debug",
            Self::Information => "Information",
            Self::Warning => "Warning",
            Self::Error => "Error",
            Self::Fatal => "Fatal",
        }
    }

    /// Three-letter uppercase abbreviation, e.g. `INF`
    pub fn abbreviation(self) -> &'static str {
        match self {
            Self::Verbose => "VRB",
            Self::Debug => "DBG",
            Self::Information => "INF",
            Self::Warning => "WRN",
            Self::Error => "ERR",
            Self::Fatal => "FTL",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "verbose" | "trace" | "vrb" => Ok(Self::Verbose),
            "debug" | "dbg" => Ok(Self::Debug),
            "information" | "info" | "inf" => Ok(Self::Information),
            "warning" | "warn" | "wrn" => Ok(Self::Warning),
            "error" | "err" => Ok(Self::Error),
            "fatal" | "ftl" => Ok(Self::Fatal),
            other => Err(format!("unknown level '{other}'")),
        }
    }
}

/// One structured log event.
///
/// `message_template` may contain `{Name}` holes that are filled from
/// `properties` when rendered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    /// When the event was produced
    pub timestamp: DateTime<FixedOffset>,

    /// Severity
    #[serde(default)]
    pub level: Level,

    /// Message template, e.g. `"User {UserId} signed in"`
    pub message_template: String,

    /// Bound template arguments and contextual properties
    #[serde(default)]
    pub properties: BTreeMap<String, Value>,

    /// Rendered error/exception payload, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception: Option<String>,
}

impl LogEvent {
    /// Create an event stamped with the current local time
    pub fn new(level: Level, message_template: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now().fixed_offset(),
            level,
            message_template: message_template.into(),
            properties: BTreeMap::new(),
            exception: None,
        }
    }

    /// Override the timestamp
    pub fn at(mut self, timestamp: DateTime<FixedOffset>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Bind a property
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Attach an exception payload
    pub fn with_exception(mut self, exception: impl Into<String>) -> Self {
        self.exception = Some(exception.into());
        self
    }
}
