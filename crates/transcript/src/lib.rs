//! # Transcript
//!
//! 日志转录模块。
//!
//! 负责：
//! - 将渲染后的 `LogEvent` 按顺序缓存
//! - flush 时由回调决定是否投递，并组装为一条消息发送
//! - 投递失败不丢行，写入诊断通道

pub mod delivery;
pub mod diagnostics;
pub mod handle;
pub mod layer;
pub mod metrics;
pub mod sink;

pub use contracts::{
    DeliveryClient, DeliveryMetadata, LogEvent, OutboundMessage, TranscriptConfig,
    TranscriptError,
};
pub use delivery::{
    LogClient, PickupDirectoryClient, PickupDirectoryConfig, RecordingClient, RecordingConfig,
};
pub use diagnostics::{MemoryDiagnostics, SELFLOG_TARGET, TracingDiagnostics};
pub use handle::TranscriptHandle;
pub use layer::TranscriptLayer;
pub use crate::metrics::{MetricsSnapshot, TranscriptMetrics};
pub use sink::{ClientFactory, DecisionCallback, TranscriptSink, TranscriptSinkBuilder};
