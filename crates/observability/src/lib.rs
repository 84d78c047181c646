//! # Observability
//!
//! 可观测性模块：Tracing + Prometheus 指标。
//!
//! ## 功能
//!
//! - Tracing 初始化 (JSON/Pretty/Compact 格式)
//! - 可选挂载 `TranscriptLayer`，把应用日志同时写入转录
//! - Prometheus 指标导出
//! - 转录运行摘要统计
//!
//! ## 使用示例
//!
//! ```ignore
//! use observability::{init_with_config, ObservabilityConfig};
//!
//! let layer = TranscriptLayer::new(Arc::clone(&sink));
//! init_with_config(ObservabilityConfig::default(), Some(layer))?;
//! ```

pub mod metrics;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::Subscriber;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};
use transcript::TranscriptLayer;

// Re-exports
pub use crate::metrics::{
    describe_transcript_metrics, record_flush_latency_ms, RunningStats, StatsSummary,
    TranscriptSummary,
};

/// 初始化可观测性（仅 Tracing，JSON 格式）
pub fn init() -> Result<()> {
    init_with_config(ObservabilityConfig::default(), None)
}

/// 可观测性配置
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// 日志格式
    pub log_format: LogFormat,
    /// Prometheus 端口 (None = 禁用)
    pub metrics_port: Option<u16>,
    /// 默认日志级别 (RUST_LOG 优先)
    pub default_log_level: String,
    /// 日志输出目标
    pub writer: LogWriter,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Json,
            metrics_port: None,
            default_log_level: "info".to_string(),
            writer: LogWriter::Stdout,
        }
    }
}

/// 日志格式
#[derive(Debug, Clone, Copy, Default)]
pub enum LogFormat {
    /// JSON 结构化日志
    #[default]
    Json,
    /// 人类可读格式
    Pretty,
    /// 紧凑单行格式
    Compact,
}

/// 日志输出目标
#[derive(Debug, Clone, Copy, Default)]
pub enum LogWriter {
    #[default]
    Stdout,
    /// 标准输出留给命令结果时使用
    Stderr,
}

impl LogWriter {
    fn make_writer(self) -> BoxMakeWriter {
        match self {
            LogWriter::Stdout => BoxMakeWriter::new(std::io::stdout),
            LogWriter::Stderr => BoxMakeWriter::new(std::io::stderr),
        }
    }
}

/// 构建 subscriber 但不安装
///
/// 过滤器作用于所有层，`transcript` 只收到通过过滤的事件。
pub fn build_subscriber(
    config: &ObservabilityConfig,
    transcript: Option<TranscriptLayer>,
) -> impl Subscriber + Send + Sync + 'static {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_log_level));

    let writer = config.writer.make_writer();
    let fmt_layer = match config.log_format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(writer)
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        LogFormat::Pretty => fmt::layer().pretty().with_writer(writer).boxed(),
        LogFormat::Compact => fmt::layer().compact().with_writer(writer).boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(transcript)
}

/// 使用自定义配置初始化
///
/// `transcript` 不为空时，事件同时进入该转录 sink。
pub fn init_with_config(
    config: ObservabilityConfig,
    transcript: Option<TranscriptLayer>,
) -> Result<()> {
    // 1. Initialize Tracing
    build_subscriber(&config, transcript)
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    // 2. Initialize Prometheus Exporter (if enabled)
    if let Some(port) = config.metrics_port {
        init_metrics_only(port)?;
    }

    tracing::info!(
        log_format = ?config.log_format,
        metrics_port = ?config.metrics_port,
        "Observability initialized"
    );

    Ok(())
}

/// 仅初始化 Prometheus 指标（不初始化 Tracing）
///
/// 用于 Tracing 已由其他模块初始化的场景。
pub fn init_metrics_only(port: u16) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .context("Failed to install Prometheus recorder")?;

    describe_transcript_metrics();
    tracing::info!(port = port, "Prometheus metrics endpoint initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use transcript::{RecordingClient, TranscriptSink};

    #[test]
    fn test_default_config() {
        let config = ObservabilityConfig::default();
        assert_eq!(config.metrics_port, None);
        assert_eq!(config.default_log_level, "info");
        assert!(matches!(config.log_format, LogFormat::Json));
    }

    #[test]
    fn test_subscriber_feeds_transcript_layer() {
        let sink = Arc::new(
            TranscriptSink::builder(|_, _, _| false)
                .output_template("[{Level:u3}] {Message:lj}")
                .client(|| Box::new(RecordingClient::new()))
                .build()
                .unwrap(),
        );
        let config = ObservabilityConfig {
            log_format: LogFormat::Compact,
            writer: LogWriter::Stderr,
            ..Default::default()
        };
        let subscriber = build_subscriber(&config, Some(TranscriptLayer::new(Arc::clone(&sink))));

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(target: "app", "disk almost full");
        });

        assert_eq!(sink.buffered_lines(), vec!["[WRN] disk almost full"]);
    }

    #[test]
    fn test_subscriber_without_transcript() {
        let subscriber = build_subscriber(&ObservabilityConfig::default(), None);
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(target: "app", "plain logging still works");
        });
    }
}
