//! 采集指标收集模块
//!
//! 通过 `metrics` facade 记录缓冲区与 worker 指标；
//! 未安装 recorder 时所有调用均为空操作。

use std::collections::HashMap;

use metrics::{counter, gauge, histogram};

/// 记录一次成功写入缓冲区的批次
pub fn record_batch_inserted(source: &str, records: usize, buffer_len: usize) {
    counter!("acq_records_inserted_total", "source" => source.to_string())
        .increment(records as u64);
    gauge!("acq_buffer_len").set(buffer_len as f64);
}

/// 记录一次因缓冲区满被丢弃的批次
pub fn record_batch_dropped(source: &str, records: usize) {
    counter!("acq_batches_dropped_total", "source" => source.to_string()).increment(1);
    counter!("acq_records_dropped_total", "source" => source.to_string())
        .increment(records as u64);
}

/// 记录一次 drain
pub fn record_drain(drained: usize, remaining: usize) {
    counter!("acq_drain_calls_total").increment(1);
    counter!("acq_records_drained_total").increment(drained as u64);
    histogram!("acq_drain_size").record(drained as f64);
    gauge!("acq_buffer_len").set(remaining as f64);
}

/// 记录 worker 状态 (状态机序号)
pub fn record_worker_state(source: &str, state_code: u8) {
    gauge!("acq_worker_state", "source" => source.to_string()).set(state_code as f64);
}

/// 记录一次超出采样周期的轮询
pub fn record_cycle_overrun(source: &str, overrun_ms: f64) {
    counter!("acq_cycle_overrun_total", "source" => source.to_string()).increment(1);
    histogram!("acq_cycle_overrun_ms", "source" => source.to_string()).record(overrun_ms);
}

/// Drain 统计聚合器
///
/// 在内存中聚合每次 drain 的结果，便于输出会话摘要。
#[derive(Debug, Clone, Default)]
pub struct DrainStatsAggregator {
    /// drain 调用次数
    pub drain_calls: u64,

    /// 空 drain 次数
    pub empty_drains: u64,

    /// 取出的记录总数
    pub total_records: u64,

    /// 每次 drain 的记录数统计
    pub batch_stats: RunningStats,

    /// 各数据源取出的记录数
    pub per_source: HashMap<String, u64>,
}

impl DrainStatsAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一次 drain，`sources` 为每条记录的来源 label
    pub fn update<'a>(&mut self, sources: impl IntoIterator<Item = &'a str>) {
        let mut count = 0u64;
        for source in sources {
            count += 1;
            *self.per_source.entry(source.to_string()).or_insert(0) += 1;
        }

        self.drain_calls += 1;
        self.total_records += count;
        if count == 0 {
            self.empty_drains += 1;
        }
        self.batch_stats.push(count as f64);
    }

    /// 生成摘要报告
    pub fn summary(&self) -> DrainSummary {
        DrainSummary {
            drain_calls: self.drain_calls,
            empty_drains: self.empty_drains,
            total_records: self.total_records,
            batch_size: StatsSummary::from(&self.batch_stats),
            per_source: self.per_source.clone(),
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Drain 摘要
#[derive(Debug, Clone, Default)]
pub struct DrainSummary {
    pub drain_calls: u64,
    pub empty_drains: u64,
    pub total_records: u64,
    pub batch_size: StatsSummary,
    pub per_source: HashMap<String, u64>,
}

impl std::fmt::Display for DrainSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Drain Summary ===")?;
        writeln!(f, "Drain calls: {} ({} empty)", self.drain_calls, self.empty_drains)?;
        writeln!(f, "Records drained: {}", self.total_records)?;
        writeln!(f, "Records per drain: {}", self.batch_size)?;

        if !self.per_source.is_empty() {
            let mut sources: Vec<_> = self.per_source.iter().collect();
            sources.sort();
            writeln!(f, "Records per source:")?;
            for (source, count) in sources {
                writeln!(f, "  {}: {}", source, count)?;
            }
        }

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
                "min={:.1}, max={:.1}, mean={:.2}, std={:.2} (n={})",
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
    /// 添加新值
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

    /// 样本数量
    pub fn count(&self) -> u64 {
        self.count
    }

    /// 均值
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

    /// 标准差
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
