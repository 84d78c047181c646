//! TranscriptSink - accumulates rendered events and delivers them as one message
//!
//! Buffer discipline:
//! - `emit` formats outside the lock and appends under it
//! - `flush` swaps the buffer out under the lock, then delivers without holding it
//! - a declined or failed delivery puts the snapshot back in front of whatever
//!   was emitted meanwhile; a successful one simply drops it
//! - flushes and `close` are serialized by a separate gate so only one
//!   delivery is ever in flight

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use contracts::{
    DeliveryClient, DeliveryMetadata, DiagnosticRecord, Diagnostics, LogEvent, OutboundMessage,
    TranscriptConfig, TranscriptError,
};
use formatter::Formatter;
use tracing::{debug, info, instrument, warn};

use crate::diagnostics::TracingDiagnostics;
use crate::metrics::TranscriptMetrics;

/// Decision callback: finalises the message and metadata, returns `true` to send
pub type DecisionCallback = Arc<
    dyn Fn(&mut dyn DeliveryClient, &mut OutboundMessage, &mut DeliveryMetadata) -> bool
        + Send
        + Sync,
>;

/// Creates a fresh delivery client for every flush
pub type ClientFactory = Arc<dyn Fn() -> Box<dyn DeliveryClient> + Send + Sync>;

enum BufferState {
    Active(VecDeque<String>),
    Closed,
}

/// Result of one delivery attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlushOutcome {
    Skipped,
    Sent,
    Suppressed,
    Failed,
}

/// Callback verdict together with the message it finalised
struct Decision {
    approved: bool,
    client: Box<dyn DeliveryClient>,
    message: OutboundMessage,
    metadata: DeliveryMetadata,
}

/// Builder for creating a TranscriptSink
pub struct TranscriptSinkBuilder {
    config: TranscriptConfig,
    decide: DecisionCallback,
    new_client: Option<ClientFactory>,
    diagnostics: Arc<dyn Diagnostics>,
}

impl TranscriptSinkBuilder {
    /// Create a builder around the decision callback
    pub fn new<F>(decide: F) -> Self
    where
        F: Fn(&mut dyn DeliveryClient, &mut OutboundMessage, &mut DeliveryMetadata) -> bool
            + Send
            + Sync
            + 'static,
    {
        Self {
            config: TranscriptConfig::default(),
            decide: Arc::new(decide),
            new_client: None,
            diagnostics: Arc::new(TracingDiagnostics),
        }
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: TranscriptConfig) -> Self {
        self.config = config;
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    pub fn output_template(mut self, template: impl Into<String>) -> Self {
        self.config.output_template = template.into();
        self
    }

    pub fn skip_if_empty(mut self, skip: bool) -> Self {
        self.config.skip_if_empty = skip;
        self
    }

    pub fn max_buffered_lines(mut self, max: Option<usize>) -> Self {
        self.config.max_buffered_lines = max;
        self
    }

    /// Factory producing the delivery client used by each flush
    pub fn client<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Box<dyn DeliveryClient> + Send + Sync + 'static,
    {
        self.new_client = Some(Arc::new(factory));
        self
    }

    /// Diagnostic channel for delivery failures
    pub fn diagnostics(mut self, diagnostics: Arc<dyn Diagnostics>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Build the sink
    ///
    /// # Errors
    /// Configuration error for a malformed template, a zero buffer bound or a
    /// missing delivery client
    #[instrument(name = "transcript_sink_build", skip(self), fields(sink = %self.config.name))]
    pub fn build(self) -> Result<TranscriptSink, TranscriptError> {
        let formatter = Formatter::new(
            &self.config.output_template,
            self.config.format_provider.clone(),
        )?;

        if self.config.max_buffered_lines == Some(0) {
            return Err(TranscriptError::configuration(
                "max_buffered_lines",
                "buffer bound must be > 0",
            ));
        }

        let new_client = self.new_client.ok_or_else(|| {
            TranscriptError::configuration("client", "no delivery client configured")
        })?;

        debug!(
            sink = %self.config.name,
            template = %formatter.template(),
            skip_if_empty = self.config.skip_if_empty,
            max_buffered_lines = ?self.config.max_buffered_lines,
            "TranscriptSink created"
        );

        Ok(TranscriptSink {
            metrics: Arc::new(TranscriptMetrics::new(&self.config.name)),
            formatter,
            config: self.config,
            decide: self.decide,
            new_client,
            diagnostics: self.diagnostics,
            buffer: Mutex::new(BufferState::Active(VecDeque::new())),
            flush_gate: Mutex::new(()),
            overflow_warned: AtomicBool::new(false),
        })
    }
}

/// Accumulates rendered log events and delivers them as one transcript
pub struct TranscriptSink {
    config: TranscriptConfig,
    formatter: Formatter,
    decide: DecisionCallback,
    new_client: ClientFactory,
    diagnostics: Arc<dyn Diagnostics>,
    metrics: Arc<TranscriptMetrics>,
    buffer: Mutex<BufferState>,
    flush_gate: Mutex<()>,
    overflow_warned: AtomicBool,
}

impl TranscriptSink {
    /// Start building a sink around the decision callback
    pub fn builder<F>(decide: F) -> TranscriptSinkBuilder
    where
        F: Fn(&mut dyn DeliveryClient, &mut OutboundMessage, &mut DeliveryMetadata) -> bool
            + Send
            + Sync
            + 'static,
    {
        TranscriptSinkBuilder::new(decide)
    }

    /// Sink name (used for logging/metrics)
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Shared metrics
    pub fn metrics(&self) -> &Arc<TranscriptMetrics> {
        &self.metrics
    }

    pub fn is_closed(&self) -> bool {
        matches!(*self.lock_buffer(), BufferState::Closed)
    }

    /// Copy of the currently buffered lines, oldest first
    pub fn buffered_lines(&self) -> Vec<String> {
        match &*self.lock_buffer() {
            BufferState::Active(lines) => lines.iter().cloned().collect(),
            BufferState::Closed => Vec::new(),
        }
    }

    /// Format an event and append it to the buffer
    ///
    /// Returns `false` when the sink is already closed. Never fails otherwise:
    /// a formatter panic is replaced by a fallback line.
    pub fn emit(&self, event: &LogEvent) -> bool {
        let line = self.render(event);

        let mut state = self.lock_buffer();
        let BufferState::Active(lines) = &mut *state else {
            self.metrics.inc_rejected_count();
            debug!(sink = %self.config.name, "Event emitted after close, ignored");
            return false;
        };

        lines.push_back(line);
        let evicted = self.enforce_bound(lines);
        let len = lines.len();
        drop(state);

        self.metrics.inc_emitted_count();
        self.metrics.set_buffered_lines(len);
        if evicted > 0 {
            self.note_eviction(evicted);
        }
        true
    }

    /// Attempt to deliver the buffered transcript
    ///
    /// Never fails: a declined delivery keeps the lines, a failed one keeps
    /// them and writes one diagnostic record.
    #[instrument(name = "transcript_sink_flush", skip(self), fields(sink = %self.config.name))]
    pub fn flush(&self) {
        let _gate = self.flush_gate.lock().unwrap_or_else(PoisonError::into_inner);

        let snapshot = {
            let mut state = self.lock_buffer();
            match &mut *state {
                BufferState::Active(lines) => std::mem::take(lines),
                BufferState::Closed => {
                    debug!(sink = %self.config.name, "Flush after close, ignored");
                    return;
                }
            }
        };
        self.metrics.set_buffered_lines(0);

        let (outcome, snapshot) = self.dispatch(snapshot);
        if matches!(outcome, FlushOutcome::Suppressed | FlushOutcome::Failed) {
            self.restore(snapshot);
        }
    }

    /// Perform one final flush, then release the buffer
    ///
    /// Idempotent: later calls never send. With `skip_if_empty` off they
    /// still hand the callback an empty transcript. Events emitted after
    /// the final snapshot is taken are rejected.
    #[instrument(name = "transcript_sink_close", skip(self), fields(sink = %self.config.name))]
    pub fn close(&self) {
        let _gate = self.flush_gate.lock().unwrap_or_else(PoisonError::into_inner);

        let snapshot = {
            let mut state = self.lock_buffer();
            match std::mem::replace(&mut *state, BufferState::Closed) {
                BufferState::Active(lines) => Some(lines),
                BufferState::Closed => None,
            }
        };
        let Some(snapshot) = snapshot else {
            self.reclose();
            return;
        };
        self.metrics.set_buffered_lines(0);

        let (outcome, snapshot) = self.dispatch(snapshot);
        if !snapshot.is_empty() && outcome != FlushOutcome::Sent {
            warn!(
                sink = %self.config.name,
                lines = snapshot.len(),
                ?outcome,
                "Releasing undelivered transcript on close"
            );
        }
        info!(sink = %self.config.name, "TranscriptSink closed");
    }

    /// Repeated close: the callback sees the empty buffer, nothing is sent
    fn reclose(&self) {
        if self.config.skip_if_empty {
            debug!(sink = %self.config.name, "TranscriptSink already closed");
            return;
        }
        match self.consult(&VecDeque::new()) {
            Ok(decision) => debug!(
                sink = %self.config.name,
                approved = decision.approved,
                "TranscriptSink already closed, not re-sending"
            ),
            Err(err) => {
                self.metrics.inc_failure_count();
                self.report(&err);
            }
        }
    }

    fn lock_buffer(&self) -> MutexGuard<'_, BufferState> {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn render(&self, event: &LogEvent) -> String {
        match panic::catch_unwind(AssertUnwindSafe(|| self.formatter.format(event))) {
            Ok(line) => line,
            Err(_) => {
                self.metrics.inc_fallback_count();
                let err = TranscriptError::formatting("formatter panicked, using fallback line");
                warn!(sink = %self.config.name, error = %err, "Formatting failed");
                Formatter::fallback(event)
            }
        }
    }

    /// Evict the oldest lines beyond the bound; returns how many were evicted
    fn enforce_bound(&self, lines: &mut VecDeque<String>) -> usize {
        let Some(max) = self.config.max_buffered_lines else {
            return 0;
        };
        let excess = lines.len().saturating_sub(max);
        lines.drain(..excess);
        excess
    }

    fn note_eviction(&self, evicted: usize) {
        self.metrics.add_dropped_count(evicted as u64);
        if !self.overflow_warned.swap(true, Ordering::Relaxed) {
            warn!(
                sink = %self.config.name,
                max = ?self.config.max_buffered_lines,
                "Transcript buffer full, evicting oldest lines"
            );
        }
    }

    /// Put an undelivered snapshot back in front of lines emitted meanwhile
    fn restore(&self, mut snapshot: VecDeque<String>) {
        let mut state = self.lock_buffer();
        let BufferState::Active(lines) = &mut *state else {
            return;
        };
        snapshot.append(lines);
        *lines = snapshot;
        let evicted = self.enforce_bound(lines);
        let len = lines.len();
        drop(state);

        self.metrics.set_buffered_lines(len);
        if evicted > 0 {
            self.note_eviction(evicted);
        }
    }

    /// Run the decision callback and delivery for one snapshot
    fn dispatch(&self, snapshot: VecDeque<String>) -> (FlushOutcome, VecDeque<String>) {
        if snapshot.is_empty() && self.config.skip_if_empty {
            debug!(sink = %self.config.name, "Nothing buffered, skipping delivery");
            return (FlushOutcome::Skipped, snapshot);
        }

        let outcome = match self.deliver(&snapshot) {
            Ok(true) => {
                self.metrics.inc_sent_count();
                self.overflow_warned.store(false, Ordering::Relaxed);
                info!(sink = %self.config.name, lines = snapshot.len(), "Transcript sent");
                FlushOutcome::Sent
            }
            Ok(false) => {
                self.metrics.inc_suppressed_count();
                debug!(
                    sink = %self.config.name,
                    lines = snapshot.len(),
                    "Delivery declined by callback, keeping transcript"
                );
                FlushOutcome::Suppressed
            }
            Err(err) => {
                self.metrics.inc_failure_count();
                self.report(&err);
                FlushOutcome::Failed
            }
        };
        (outcome, snapshot)
    }

    /// Build the message and run the decision callback against a fresh client
    fn consult(&self, lines: &VecDeque<String>) -> Result<Decision, TranscriptError> {
        let body = join_lines(lines, &self.config.line_separator);
        let mut message = OutboundMessage::new(&self.config.subject, body);
        let mut metadata = self.config.delivery.clone();
        let mut client = (self.new_client)();

        let approved = panic::catch_unwind(AssertUnwindSafe(|| {
            (self.decide)(client.as_mut(), &mut message, &mut metadata)
        }))
        .map_err(|_| TranscriptError::Other("decision callback panicked".to_string()))?;

        Ok(Decision {
            approved,
            client,
            message,
            metadata,
        })
    }

    /// Consult the callback and, if approved, connect and send
    fn deliver(&self, lines: &VecDeque<String>) -> Result<bool, TranscriptError> {
        let Decision {
            approved,
            mut client,
            message,
            metadata,
        } = self.consult(lines)?;

        if !approved {
            return Ok(false);
        }

        debug!(
            sink = %self.config.name,
            client = client.name(),
            host = %metadata.host,
            port = metadata.port,
            security = ?metadata.security,
            "Delivering transcript"
        );

        client.connect(&metadata.host, metadata.port, metadata.security)?;
        let sent = client.send(&message);
        client.disconnect();
        sent.map(|()| true)
    }

    /// Write one record to the diagnostic channel; never panics
    fn report(&self, err: &TranscriptError) {
        let record = DiagnosticRecord::from_error(&self.config.name, err);
        if panic::catch_unwind(AssertUnwindSafe(|| self.diagnostics.report(record))).is_err() {
            warn!(sink = %self.config.name, error = %err, "Diagnostic channel panicked");
        }
    }
}

impl Drop for TranscriptSink {
    fn drop(&mut self) {
        self.close();
    }
}

fn join_lines(lines: &VecDeque<String>, separator: &str) -> String {
    let mut body = String::new();
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            body.push_str(separator);
        }
        body.push_str(line);
    }
    body
}
