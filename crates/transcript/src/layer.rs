//! TranscriptLayer - routes `tracing` events into a transcript sink

use std::fmt;
use std::sync::Arc;

use serde_json::{Number, Value};
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

use contracts::{Level, LogEvent};

use crate::sink::TranscriptSink;

/// A tracing layer that appends every event to a transcript
pub struct TranscriptLayer {
    sink: Arc<TranscriptSink>,
}

impl TranscriptLayer {
    pub fn new(sink: Arc<TranscriptSink>) -> Self {
        Self { sink }
    }

    pub fn sink(&self) -> &Arc<TranscriptSink> {
        &self.sink
    }
}

/// Events from the sink itself never re-enter the transcript
fn is_internal(target: &str) -> bool {
    target == "transcript" || target.starts_with("transcript::")
}

fn map_level(level: &tracing::Level) -> Level {
    match *level {
        tracing::Level::TRACE => Level::Verbose,
        tracing::Level::DEBUG => Level::Debug,
        tracing::Level::INFO => Level::Information,
        tracing::Level::WARN => Level::Warning,
        tracing::Level::ERROR => Level::Error,
    }
}

#[derive(Default)]
struct FieldCollector {
    message: Option<String>,
    exception: Option<String>,
    properties: Vec<(String, Value)>,
}

impl FieldCollector {
    fn record_value(&mut self, field: &Field, value: Value) {
        match field.name() {
            "message" => {
                if self.message.is_none() {
                    self.message = Some(as_text(value));
                }
            }
            "error" | "exception" => {
                if self.exception.is_none() {
                    self.exception = Some(as_text(value));
                }
            }
            name => self.properties.push((name.to_string(), value)),
        }
    }
}

fn as_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

impl Visit for FieldCollector {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.record_value(field, Value::String(format!("{value:?}")));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.record_value(field, Value::String(value.to_string()));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.record_value(field, Value::Bool(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record_value(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.record_value(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        let value = Number::from_f64(value)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(value.to_string()));
        self.record_value(field, value);
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.record_value(field, Value::String(value.to_string()));
    }
}

impl<S> Layer<S> for TranscriptLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if is_internal(metadata.target()) {
            return;
        }

        let mut collector = FieldCollector::default();
        event.record(&mut collector);

        let template = collector
            .message
            .unwrap_or_else(|| metadata.name().to_string());
        let mut log_event = LogEvent::new(map_level(metadata.level()), template);
        for (key, value) in collector.properties {
            log_event = log_event.with_property(key, value);
        }
        if let Some(exception) = collector.exception {
            log_event = log_event.with_exception(exception);
        }

        self.sink.emit(&log_event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::RecordingClient;
    use tracing_subscriber::prelude::*;

    fn capture() -> Arc<TranscriptSink> {
        Arc::new(
            TranscriptSink::builder(|_, _, _| false)
                .output_template("[{Level:u3}] {Message:lj}{NewLine}{Exception}")
                .client(|| Box::new(RecordingClient::new()))
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn test_layer_captures_events() {
        let sink = capture();
        let subscriber = tracing_subscriber::registry().with(TranscriptLayer::new(Arc::clone(&sink)));

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(target: "app", "Test INF");
            tracing::warn!(target: "app", "Test WRN");
            tracing::error!(target: "app", "Test ERR");
        });

        assert_eq!(
            sink.buffered_lines(),
            vec!["[INF] Test INF\n", "[WRN] Test WRN\n", "[ERR] Test ERR\n"]
        );
    }

    #[test]
    fn test_layer_binds_fields_as_properties() {
        let sink = capture();
        let subscriber = tracing_subscriber::registry().with(TranscriptLayer::new(Arc::clone(&sink)));

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(target: "app", user = "alice", attempts = 3u64, "Login by {{user}} after {{attempts}}");
            tracing::error!(target: "app", error = "disk full", "Write failed");
        });

        let lines = sink.buffered_lines();
        assert_eq!(lines[0], "[INF] Login by alice after 3\n");
        assert_eq!(lines[1], "[ERR] Write failed\ndisk full\n");
    }

    #[test]
    fn test_layer_ignores_internal_targets() {
        let sink = capture();
        let subscriber = tracing_subscriber::registry().with(TranscriptLayer::new(Arc::clone(&sink)));

        tracing::subscriber::with_default(subscriber, || {
            tracing::error!(target: "transcript::selflog", "delivery failed");
            tracing::debug!(target: "app", "kept");
        });

        assert_eq!(sink.buffered_lines(), vec!["[DBG] kept\n"]);
    }

    #[test]
    fn test_level_mapping() {
        assert_eq!(map_level(&tracing::Level::TRACE), Level::Verbose);
        assert_eq!(map_level(&tracing::Level::INFO), Level::Information);
        assert_eq!(map_level(&tracing::Level::ERROR), Level::Error);
        assert!(is_internal("transcript::sink"));
        assert!(!is_internal("transcript_cli"));
    }
}
