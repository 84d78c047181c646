//! Diagnostic channels for delivery failures

use std::sync::{Mutex, PoisonError};

use contracts::{DiagnosticRecord, Diagnostics};
use tracing::error;

/// Target used for self-log records; events on it never re-enter a transcript
pub const SELFLOG_TARGET: &str = "transcript::selflog";

/// Writes each record as one `tracing` error event
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn report(&self, record: DiagnosticRecord) {
        error!(
            target: SELFLOG_TARGET,
            sink = %record.sink,
            at = %record.timestamp.to_rfc3339(),
            context = ?record.context,
            "{}",
            record.message
        );
    }
}

/// Keeps records in memory
#[derive(Debug, Default)]
pub struct MemoryDiagnostics {
    records: Mutex<Vec<DiagnosticRecord>>,
}

impl MemoryDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<DiagnosticRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Diagnostics for MemoryDiagnostics {
    fn report(&self, record: DiagnosticRecord) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::TranscriptError;

    #[test]
    fn test_memory_diagnostics_collects() {
        let diagnostics = MemoryDiagnostics::new();
        assert!(diagnostics.is_empty());

        let err = TranscriptError::send("recording", "injected");
        diagnostics.report(DiagnosticRecord::from_error("ops", &err));

        let records = diagnostics.records();
        assert_eq!(records.len(), 1);
        assert!(records[0].message.contains("injected"));
    }

    #[test]
    fn test_tracing_diagnostics_does_not_panic_without_subscriber() {
        let err = TranscriptError::connect("smtp", "refused");
        TracingDiagnostics.report(DiagnosticRecord::from_error("ops", &err));
    }
}
