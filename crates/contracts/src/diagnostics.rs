//! Diagnostic (self-log) channel contract

use chrono::{DateTime, Utc};
use std::error::Error;

/// One record written to the diagnostic channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticRecord {
    /// Sink that produced the record
    pub sink: String,
    /// When the failure was observed
    pub timestamp: DateTime<Utc>,
    /// Error description
    pub message: String,
    /// Causes, outermost first
    pub context: Vec<String>,
}

impl DiagnosticRecord {
    /// Build a record from an error and its `source()` chain
    pub fn from_error(sink: impl Into<String>, err: &(dyn Error + 'static)) -> Self {
        let mut context = Vec::new();
        let mut cause = err.source();
        while let Some(inner) = cause {
            context.push(inner.to_string());
            cause = inner.source();
        }
        Self {
            sink: sink.into(),
            timestamp: Utc::now(),
            message: err.to_string(),
            context,
        }
    }
}

/// Fire-and-forget diagnostic channel.
///
/// Implementations must not panic; the sink calls `report` from flush and
/// close paths that cannot fail.
pub trait Diagnostics: Send + Sync {
    fn report(&self, record: DiagnosticRecord);
}
