//! `run` command implementation.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{info, warn};

use contracts::TranscriptConfig;
use observability::{record_flush_latency_ms, RunningStats, TranscriptSummary};
use transcript::{PickupDirectoryClient, PickupDirectoryConfig, TranscriptHandle, TranscriptSink};

use super::{input, load_config};
use crate::cli::RunArgs;

/// Execute the `run` command
pub async fn run_transcript(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");
    let config = load_config(Some(args.config.as_path()))
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)?;
    }

    let sink = build_sink(config, args)?;
    let sink_name = sink.name().to_string();
    let handle = TranscriptHandle::spawn(sink, args.queue_capacity);
    let metrics = Arc::clone(handle.metrics());

    info!(
        sink = %sink_name,
        input = %args.input,
        pickup_dir = %args.pickup_dir.display(),
        batch = args.batch,
        "Starting transcript run"
    );

    let reader = input::open_async(&args.input).await?;
    let mut summary = TranscriptSummary {
        sink: sink_name.clone(),
        ..Default::default()
    };
    let mut latency = RunningStats::default();

    let pumped = tokio::select! {
        result = pump(&handle, reader, args.batch, &mut summary, &mut latency) => result,
        _ = shutdown_signal() => {
            warn!("Received shutdown signal, closing transcript...");
            Ok(())
        }
    };

    // Close delivers whatever is still buffered
    handle.shutdown().await;

    summary.snapshot = metrics.snapshot();
    summary.flush_latency_ms = latency.summary();
    println!("\n{summary}");

    pumped?;
    info!(sink = %sink_name, "Transcript run finished");
    Ok(())
}

/// Build a sink writing into the pickup directory with the given sender and recipients
fn build_sink(config: TranscriptConfig, args: &RunArgs) -> Result<TranscriptSink> {
    let from = args.from.clone();
    let to = args.to.clone();
    let directory = args.pickup_dir.clone();

    TranscriptSink::builder(move |_, message, _| {
        if let Some(ref from) = from {
            message.from = vec![from.clone()];
        }
        message.to.extend(to.iter().cloned());
        true
    })
    .config(config)
    .client(move || {
        Box::new(PickupDirectoryClient::new(
            "pickup",
            PickupDirectoryConfig {
                directory: directory.clone(),
            },
        ))
    })
    .build()
    .context("Failed to build transcript sink")
}

/// Feed every input event to the handle, flushing every `batch` events
async fn pump(
    handle: &TranscriptHandle,
    reader: Box<dyn AsyncBufRead + Unpin + Send>,
    batch: usize,
    summary: &mut TranscriptSummary,
    latency: &mut RunningStats,
) -> Result<()> {
    let mut lines = reader.lines();
    let mut line_no = 0;
    let mut pending = 0;

    while let Some(line) = lines.next_line().await.context("Failed to read input")? {
        line_no += 1;
        let event = match input::parse_event(line_no, &line) {
            Ok(Some(event)) => event,
            Ok(None) => continue,
            Err(e) => {
                warn!(error = %e, "Skipping line");
                summary.parse_errors += 1;
                continue;
            }
        };

        summary.events_read += 1;
        if !handle.emit(event).await {
            anyhow::bail!("Transcript worker stopped unexpectedly");
        }

        pending += 1;
        if batch > 0 && pending >= batch {
            timed_flush(handle, latency).await;
            pending = 0;
        }
    }
    Ok(())
}

async fn timed_flush(handle: &TranscriptHandle, latency: &mut RunningStats) {
    let start = Instant::now();
    handle.flush().await;
    let ms = start.elapsed().as_secs_f64() * 1000.0;
    record_flush_latency_ms(handle.name(), ms);
    latency.push(ms);
}

/// Resolve on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
