//! 转录指标模块
//!
//! 指标描述注册、flush 延迟记录，以及一次运行的摘要统计。

use metrics::{describe_counter, describe_gauge, describe_histogram, histogram, Unit};
use transcript::MetricsSnapshot;

/// 注册转录指标描述
///
/// 计数本身由 `TranscriptMetrics` 写入，这里只补充 HELP 文本。
pub fn describe_transcript_metrics() {
    describe_gauge!(
        "transcript_buffered_lines",
        Unit::Count,
        "Lines currently buffered"
    );
    describe_counter!(
        "transcript_events_emitted_total",
        Unit::Count,
        "Events appended to a transcript"
    );
    describe_counter!(
        "transcript_format_fallbacks_total",
        Unit::Count,
        "Events rendered with the fallback line"
    );
    describe_counter!(
        "transcript_events_rejected_total",
        Unit::Count,
        "Events refused after close"
    );
    describe_counter!(
        "transcript_lines_evicted_total",
        Unit::Count,
        "Lines evicted by the buffer bound"
    );
    describe_counter!(
        "transcript_queue_dropped_total",
        Unit::Count,
        "Events dropped because the mailbox was full"
    );
    describe_counter!(
        "transcript_flushes_total",
        Unit::Count,
        "Flush outcomes by status"
    );
    describe_histogram!(
        "transcript_flush_latency_ms",
        Unit::Milliseconds,
        "Wall time of a flush"
    );
}

/// 记录单次 flush 耗时
pub fn record_flush_latency_ms(sink_name: &str, latency_ms: f64) {
    histogram!(
        "transcript_flush_latency_ms",
        "sink" => sink_name.to_string()
    )
    .record(latency_ms);
}

/// 一次运行的摘要
#[derive(Debug, Clone, Default)]
pub struct TranscriptSummary {
    pub sink: String,
    pub events_read: u64,
    pub parse_errors: u64,
    pub snapshot: MetricsSnapshot,
    pub flush_latency_ms: StatsSummary,
}

impl TranscriptSummary {
    /// 投递成功率 (百分比)
    pub fn delivery_rate(&self) -> f64 {
        let s = &self.snapshot;
        let attempts = s.sent_count + s.suppressed_count + s.failure_count;
        if attempts > 0 {
            s.sent_count as f64 / attempts as f64 * 100.0
        } else {
            0.0
        }
    }
}

impl std::fmt::Display for TranscriptSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = &self.snapshot;
        writeln!(f, "=== Transcript Summary ({}) ===", self.sink)?;
        writeln!(f, "Events read: {}", self.events_read)?;
        if self.parse_errors > 0 {
            writeln!(f, "Unparseable lines: {}", self.parse_errors)?;
        }
        writeln!(f, "Events emitted: {}", s.emitted_count)?;
        writeln!(f, "Fallback renders: {}", s.fallback_count)?;
        writeln!(
            f,
            "Dropped: {} evicted, {} queue full, {} after close",
            s.dropped_count, s.queue_dropped_count, s.rejected_count
        )?;
        writeln!(
            f,
            "Transcripts: {} sent, {} suppressed, {} failed ({:.2}% delivered)",
            s.sent_count,
            s.suppressed_count,
            s.failure_count,
            self.delivery_rate()
        )?;
        writeln!(f, "Flush latency (ms): {}", self.flush_latency_ms)?;
        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
            return;
        }

        self.min = self.min.min(value);
        self.max = self.max.max(value);
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 样本方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn summary(&self) -> StatsSummary {
        StatsSummary::from(self)
    }
}
