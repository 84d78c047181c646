//! Transcript metrics for observability
//!
//! Counters live per sink instance and are mirrored to the `metrics` facade
//! with a `sink` label.

use metrics::{counter, gauge};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Metrics for a single transcript sink
#[derive(Debug)]
pub struct TranscriptMetrics {
    sink: String,
    /// Lines currently buffered
    buffered_lines: AtomicUsize,
    /// Events appended to the buffer
    emitted_count: AtomicU64,
    /// Events rendered with the fallback line
    fallback_count: AtomicU64,
    /// Events refused because the sink was closed
    rejected_count: AtomicU64,
    /// Lines evicted by the buffer bound
    dropped_count: AtomicU64,
    /// Events dropped because the mailbox queue was full
    queue_dropped_count: AtomicU64,
    /// Transcripts delivered
    sent_count: AtomicU64,
    /// Flushes the decision callback declined
    suppressed_count: AtomicU64,
    /// Flushes that failed (connect, send or callback panic)
    failure_count: AtomicU64,
}

impl TranscriptMetrics {
    /// Create new metrics instance
    pub fn new(sink: impl Into<String>) -> Self {
        Self {
            sink: sink.into(),
            buffered_lines: AtomicUsize::new(0),
            emitted_count: AtomicU64::new(0),
            fallback_count: AtomicU64::new(0),
            rejected_count: AtomicU64::new(0),
            dropped_count: AtomicU64::new(0),
            queue_dropped_count: AtomicU64::new(0),
            sent_count: AtomicU64::new(0),
            suppressed_count: AtomicU64::new(0),
            failure_count: AtomicU64::new(0),
        }
    }

    pub fn buffered_lines(&self) -> usize {
        self.buffered_lines.load(Ordering::Relaxed)
    }

    pub fn set_buffered_lines(&self, len: usize) {
        self.buffered_lines.store(len, Ordering::Relaxed);
        gauge!("transcript_buffered_lines", "sink" => self.sink.clone()).set(len as f64);
    }

    pub fn emitted_count(&self) -> u64 {
        self.emitted_count.load(Ordering::Relaxed)
    }

    pub fn inc_emitted_count(&self) {
        self.emitted_count.fetch_add(1, Ordering::Relaxed);
        counter!("transcript_events_emitted_total", "sink" => self.sink.clone()).increment(1);
    }

    pub fn fallback_count(&self) -> u64 {
        self.fallback_count.load(Ordering::Relaxed)
    }

    pub fn inc_fallback_count(&self) {
        self.fallback_count.fetch_add(1, Ordering::Relaxed);
        counter!("transcript_format_fallbacks_total", "sink" => self.sink.clone()).increment(1);
    }

    pub fn rejected_count(&self) -> u64 {
        self.rejected_count.load(Ordering::Relaxed)
    }

    pub fn inc_rejected_count(&self) {
        self.rejected_count.fetch_add(1, Ordering::Relaxed);
        counter!("transcript_events_rejected_total", "sink" => self.sink.clone()).increment(1);
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped_count.load(Ordering::Relaxed)
    }

    pub fn add_dropped_count(&self, n: u64) {
        self.dropped_count.fetch_add(n, Ordering::Relaxed);
        counter!("transcript_lines_evicted_total", "sink" => self.sink.clone()).increment(n);
    }

    pub fn queue_dropped_count(&self) -> u64 {
        self.queue_dropped_count.load(Ordering::Relaxed)
    }

    pub fn inc_queue_dropped_count(&self) {
        self.queue_dropped_count.fetch_add(1, Ordering::Relaxed);
        counter!("transcript_queue_dropped_total", "sink" => self.sink.clone()).increment(1);
    }

    pub fn sent_count(&self) -> u64 {
        self.sent_count.load(Ordering::Relaxed)
    }

    pub fn inc_sent_count(&self) {
        self.sent_count.fetch_add(1, Ordering::Relaxed);
        counter!("transcript_flushes_total", "sink" => self.sink.clone(), "status" => "sent")
            .increment(1);
    }

    pub fn suppressed_count(&self) -> u64 {
        self.suppressed_count.load(Ordering::Relaxed)
    }

    pub fn inc_suppressed_count(&self) {
        self.suppressed_count.fetch_add(1, Ordering::Relaxed);
        counter!("transcript_flushes_total", "sink" => self.sink.clone(), "status" => "suppressed")
            .increment(1);
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    pub fn inc_failure_count(&self) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
        counter!("transcript_flushes_total", "sink" => self.sink.clone(), "status" => "failure")
            .increment(1);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            buffered_lines: self.buffered_lines(),
            emitted_count: self.emitted_count(),
            fallback_count: self.fallback_count(),
            rejected_count: self.rejected_count(),
            dropped_count: self.dropped_count(),
            queue_dropped_count: self.queue_dropped_count(),
            sent_count: self.sent_count(),
            suppressed_count: self.suppressed_count(),
            failure_count: self.failure_count(),
        }
    }
}

/// Snapshot of transcript metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub buffered_lines: usize,
    pub emitted_count: u64,
    pub fallback_count: u64,
    pub rejected_count: u64,
    pub dropped_count: u64,
    pub queue_dropped_count: u64,
    pub sent_count: u64,
    pub suppressed_count: u64,
    pub failure_count: u64,
}
