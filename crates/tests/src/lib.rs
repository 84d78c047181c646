//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 配置 -> sink -> 投递的完整链路
//! - 并发 emit 与 flush 的交错
//! - 失败投递的保留与诊断

#[cfg(test)]
mod contract_tests {
    use contracts::{DeliveryMetadata, SecurityMode, TranscriptConfig, DEFAULT_SUBJECT};

    #[test]
    fn test_contract_defaults() {
        let config = TranscriptConfig::default();
        assert_eq!(config.subject, DEFAULT_SUBJECT);
        assert_eq!(
            config.delivery,
            DeliveryMetadata {
                host: String::new(),
                port: 25,
                security: SecurityMode::Auto,
            }
        );
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::any::Any;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{mpsc, Arc, Mutex};
    use std::thread;
    use std::time::Duration;

    use chrono::DateTime;
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{
        DeliveryClient, Level, LogEvent, OutboundMessage, SecurityMode, TranscriptError,
    };
    use tempfile::tempdir;
    use tracing_subscriber::prelude::*;
    use transcript::{
        MemoryDiagnostics, PickupDirectoryClient, PickupDirectoryConfig, RecordingClient,
        RecordingConfig, TranscriptHandle, TranscriptLayer, TranscriptSink,
    };

    /// Captured callback arguments
    #[derive(Default)]
    struct Captured {
        calls: usize,
        subject: Option<String>,
        body: Option<String>,
    }

    /// INF/WRN/ERR through `tracing`, declined by the callback, inspected at close
    #[test]
    fn test_e2e_tracing_events_reach_callback() {
        let captured = Arc::new(Mutex::new(Captured::default()));
        let seen = Arc::clone(&captured);

        let sink = Arc::new(
            TranscriptSink::builder(move |_, message, _| {
                let mut seen = seen.lock().unwrap();
                seen.calls += 1;
                seen.subject = Some(message.subject.clone());
                seen.body = Some(message.body.clone());
                false
            })
            .client(|| Box::new(RecordingClient::new()))
            .build()
            .unwrap(),
        );

        let subscriber =
            tracing_subscriber::registry().with(TranscriptLayer::new(Arc::clone(&sink)));
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(target: "app", "Test INF");
            tracing::warn!(target: "app", "Test WRN");
            tracing::error!(target: "app", "Test ERR");
        });

        sink.close();

        let captured = captured.lock().unwrap();
        assert_eq!(captured.calls, 1);
        assert_eq!(captured.subject.as_deref(), Some("Log Transcript"));
        let body = captured.body.as_deref().unwrap();
        assert!(body.contains("[INF] Test INF"));
        assert!(body.contains("[WRN] Test WRN"));
        assert!(body.contains("[ERR] Test ERR"));
        assert!(body.find("[INF]").unwrap() < body.find("[WRN]").unwrap());
        assert!(body.find("[WRN]").unwrap() < body.find("[ERR]").unwrap());
    }

    /// Loaded configuration flows into rendering and delivery metadata
    #[test]
    fn test_e2e_config_to_pickup_directory() {
        let dir = tempdir().unwrap();
        let outbox = dir.path().join("outbox");
        let config = ConfigLoader::load_from_str(
            r#"
name = "nightly"
output_template = "{Timestamp:HH:mm:ss} {Level:w3} {Message:lj}"
subject = "Nightly import"
line_separator = "\n"

[format_provider]
utc_offset_minutes = 0

[delivery]
host = "smtp.example.com"
port = 587
security = "start_tls"
"#,
            ConfigFormat::Toml,
        )
        .unwrap();

        let directory = outbox.clone();
        let sink = TranscriptSink::builder(|_, message, metadata| {
            assert_eq!(metadata.port, 587);
            assert_eq!(metadata.security, SecurityMode::StartTls);
            message.to.push("ops@example.com".into());
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
        .unwrap();

        let at = DateTime::parse_from_rfc3339("2024-03-01T09:05:07+02:00").unwrap();
        sink.emit(
            &LogEvent::new(Level::Information, "Imported {Count} rows")
                .at(at)
                .with_property("Count", 42),
        );
        sink.emit(&LogEvent::new(Level::Warning, "Slow query").at(at));
        sink.close();

        let files: Vec<_> = fs::read_dir(&outbox).unwrap().collect();
        assert_eq!(files.len(), 1);
        let content = fs::read_to_string(files[0].as_ref().unwrap().path()).unwrap();
        assert!(content.contains("Subject: Nightly import\r\n"));
        assert!(content.ends_with("07:05:07 inf Imported 42 rows\n07:05:07 wrn Slow query"));
    }

    /// A failed send keeps the lines and writes exactly one diagnostic
    #[test]
    fn test_e2e_failed_delivery_is_retained() {
        let client = RecordingClient::with_config(RecordingConfig {
            fail_connect: false,
            fail_send: true,
        });
        let diagnostics = Arc::new(MemoryDiagnostics::new());
        let factory = client.clone();

        let sink = TranscriptSink::builder(|_, _, _| true)
            .output_template("{Message}")
            .client(move || Box::new(factory.clone()))
            .diagnostics(diagnostics.clone())
            .build()
            .unwrap();

        sink.emit(&LogEvent::new(Level::Error, "first"));
        sink.flush();

        assert_eq!(sink.buffered_lines(), vec!["first"]);
        assert_eq!(diagnostics.len(), 1);
        let record = &diagnostics.records()[0];
        assert!(record.message.contains("send"));

        client.set_fail_send(false);
        sink.close();
        sink.close();
        assert_eq!(client.sent().len(), 1);
        assert_eq!(client.sent()[0].body, "first");
        assert_eq!(diagnostics.len(), 1);
    }

    /// Client whose send blocks until released, to interleave emits with delivery
    struct GatedClient {
        entered: mpsc::Sender<()>,
        release: Arc<Mutex<mpsc::Receiver<()>>>,
        bodies: Arc<Mutex<Vec<String>>>,
    }

    impl DeliveryClient for GatedClient {
        fn name(&self) -> &str {
            "gated"
        }

        fn connect(&mut self, _: &str, _: u16, _: SecurityMode) -> Result<(), TranscriptError> {
            Ok(())
        }

        fn send(&mut self, message: &OutboundMessage) -> Result<(), TranscriptError> {
            let _ = self.entered.send(());
            let _ = self.release.lock().unwrap().recv_timeout(Duration::from_secs(5));
            self.bodies.lock().unwrap().push(message.body.clone());
            Ok(())
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    /// Emits during an in-flight send are not lost and are not part of that send
    #[test]
    fn test_e2e_emit_during_send_lands_in_next_flush() {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let release_rx = Arc::new(Mutex::new(release_rx));
        let bodies = Arc::new(Mutex::new(Vec::new()));

        let client_bodies = Arc::clone(&bodies);
        let sink = Arc::new(
            TranscriptSink::builder(|_, _, _| true)
                .output_template("{Message}")
                .client(move || {
                    Box::new(GatedClient {
                        entered: entered_tx.clone(),
                        release: Arc::clone(&release_rx),
                        bodies: Arc::clone(&client_bodies),
                    })
                })
                .build()
                .unwrap(),
        );

        sink.emit(&LogEvent::new(Level::Information, "before"));

        let flusher = {
            let sink = Arc::clone(&sink);
            thread::spawn(move || sink.flush())
        };

        entered_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        // Send is in flight; emit must not block
        assert!(sink.emit(&LogEvent::new(Level::Information, "during")));
        release_tx.send(()).unwrap();
        flusher.join().unwrap();

        assert_eq!(sink.buffered_lines(), vec!["during"]);

        let closer = {
            let sink = Arc::clone(&sink);
            thread::spawn(move || sink.close())
        };
        entered_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        release_tx.send(()).unwrap();
        closer.join().unwrap();

        assert_eq!(*bodies.lock().unwrap(), vec!["before", "during"]);
    }

    /// Many producer threads, periodic flushes: every line is delivered exactly once
    #[test]
    fn test_e2e_concurrent_producers_lose_nothing() {
        let client = RecordingClient::new();
        let factory = client.clone();
        let sink = Arc::new(
            TranscriptSink::builder(|_, _, _| true)
                .output_template("{Message}")
                .client(move || Box::new(factory.clone()))
                .build()
                .unwrap(),
        );

        let producers: Vec<_> = (0..4)
            .map(|t| {
                let sink = Arc::clone(&sink);
                thread::spawn(move || {
                    for i in 0..250 {
                        sink.emit(&LogEvent::new(Level::Debug, format!("{t}-{i}")));
                    }
                })
            })
            .collect();

        let flushes = Arc::new(AtomicUsize::new(0));
        let flusher = {
            let sink = Arc::clone(&sink);
            let flushes = Arc::clone(&flushes);
            thread::spawn(move || {
                for _ in 0..20 {
                    sink.flush();
                    flushes.fetch_add(1, Ordering::Relaxed);
                    thread::sleep(Duration::from_millis(1));
                }
            })
        };

        for p in producers {
            p.join().unwrap();
        }
        flusher.join().unwrap();
        sink.close();

        let mut delivered: Vec<String> = client
            .sent()
            .iter()
            .flat_map(|m| m.body.split("\r\n").map(str::to_string).collect::<Vec<_>>())
            .filter(|l| !l.is_empty())
            .collect();
        assert_eq!(delivered.len(), 1000);

        // Each producer's lines keep their append order across transcripts
        for t in 0..4 {
            let prefix = format!("{t}-");
            let sequence: Vec<u32> = delivered
                .iter()
                .filter_map(|l| l.strip_prefix(&prefix))
                .map(|i| i.parse().unwrap())
                .collect();
            assert_eq!(sequence, (0..250).collect::<Vec<u32>>());
        }

        delivered.sort();
        delivered.dedup();
        assert_eq!(delivered.len(), 1000);
        assert_eq!(flushes.load(Ordering::Relaxed), 20);
    }

    /// Async mailbox: queued events are flushed, shutdown performs the final close
    #[tokio::test]
    async fn test_e2e_async_handle() {
        let client = RecordingClient::new();
        let factory = client.clone();
        let sink = TranscriptSink::builder(|_, _, _| true)
            .output_template("[{Level:u3}] {Message}")
            .client(move || Box::new(factory.clone()))
            .build()
            .unwrap();

        let handle = TranscriptHandle::spawn(sink, 64);
        assert!(handle.try_emit(LogEvent::new(Level::Information, "one")));
        handle.flush().await;
        assert!(handle.try_emit(LogEvent::new(Level::Fatal, "two")));
        let metrics = Arc::clone(handle.metrics());
        handle.shutdown().await;

        let bodies: Vec<String> = client.sent().into_iter().map(|m| m.body).collect();
        assert_eq!(bodies, vec!["[INF] one", "[FTL] two"]);
        assert_eq!(metrics.snapshot().sent_count, 2);
    }

    /// Run summary built from live sink metrics
    #[test]
    fn test_e2e_summary_from_metrics() {
        let sink = TranscriptSink::builder(|_, _, _| false)
            .name("summary")
            .max_buffered_lines(Some(2))
            .client(|| Box::new(RecordingClient::new()))
            .build()
            .unwrap();

        for msg in ["a", "b", "c"] {
            sink.emit(&LogEvent::new(Level::Information, msg));
        }
        sink.flush();

        let summary = observability::TranscriptSummary {
            sink: sink.name().to_string(),
            events_read: 3,
            snapshot: sink.metrics().snapshot(),
            ..Default::default()
        };
        let text = summary.to_string();
        assert!(text.contains("=== Transcript Summary (summary) ==="));
        assert!(text.contains("Dropped: 1 evicted, 0 queue full, 0 after close"));
        assert!(text.contains("0 sent, 1 suppressed, 0 failed"));
    }
}
