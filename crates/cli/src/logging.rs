//! Logging setup
//!
//! Logs go to stderr so rendered output on stdout stays clean. With
//! `--run-log-dir` the same events are also collected into a transcript
//! that is delivered to that directory when the command finishes.

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;

use observability::{LogFormat, LogWriter, ObservabilityConfig};
use transcript::{PickupDirectoryClient, PickupDirectoryConfig, TranscriptLayer, TranscriptSink};

use crate::cli::{self, Cli};

const RUN_LOG_SUBJECT: &str = "transcript-cli run log";

/// Install the global subscriber; returns the run-log sink, if any
pub fn init(cli: &Cli) -> Result<Option<Arc<TranscriptSink>>> {
    let run_log = cli.run_log_dir.as_deref().map(run_log_sink).transpose()?;
    let layer = run_log
        .as_ref()
        .map(|sink| TranscriptLayer::new(Arc::clone(sink)));

    observability::init_with_config(observability_config(cli), layer)?;
    Ok(run_log)
}

fn observability_config(cli: &Cli) -> ObservabilityConfig {
    let default_log_level = if cli.quiet {
        "warn"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    ObservabilityConfig {
        log_format: match cli.log_format {
            cli::LogFormat::Json => LogFormat::Json,
            cli::LogFormat::Pretty => LogFormat::Pretty,
            cli::LogFormat::Compact => LogFormat::Compact,
        },
        metrics_port: None,
        default_log_level: default_log_level.to_string(),
        writer: LogWriter::Stderr,
    }
}

/// Sink for the command's own log; every flush is approved
fn run_log_sink(directory: &Path) -> Result<Arc<TranscriptSink>> {
    let directory = directory.to_path_buf();
    let sink = TranscriptSink::builder(|_, message, _| {
        message.subject = RUN_LOG_SUBJECT.to_string();
        true
    })
    .name("run_log")
    .client(move || {
        Box::new(PickupDirectoryClient::new(
            "run_log",
            PickupDirectoryConfig {
                directory: directory.clone(),
            },
        ))
    })
    .build()?;
    Ok(Arc::new(sink))
}
