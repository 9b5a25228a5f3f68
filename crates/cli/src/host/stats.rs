//! Run statistics.

use std::time::Duration;

use acquisition::{BufferStats, WorkerReport};
use contracts::Record;
use observability::DrainStatsAggregator;

/// Statistics of one `run` invocation
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    /// Sessions that were started and stopped
    pub sessions_completed: u32,

    /// Stopped early by Ctrl+C / SIGTERM
    pub interrupted: bool,

    /// Wall time of all sessions
    pub duration: Duration,

    /// Aggregated drain results
    pub drains: DrainStatsAggregator,

    /// Reports of every joined worker, all sessions
    pub workers: Vec<WorkerReport>,

    /// Buffer counters at the end of each session
    pub buffers: Vec<BufferStats>,
}

impl RunStats {
    pub fn record_drain(&mut self, records: &[Record]) {
        self.drains
            .update(records.iter().map(|record| record.source_key()));
    }

    pub fn record_session(&mut self, reports: Vec<WorkerReport>, buffer: BufferStats) {
        self.sessions_completed += 1;
        self.workers.extend(reports);
        self.buffers.push(buffer);
    }

    /// Drained records per second
    pub fn records_per_sec(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.drains.total_records as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Records lost to backpressure, all sessions
    pub fn dropped_records(&self) -> u64 {
        self.buffers.iter().map(|b| b.dropped_records).sum()
    }

    pub fn failed_workers(&self) -> usize {
        self.workers.iter().filter(|w| w.exit.is_failure()).count()
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n=== Acquisition Statistics ===\n");

        println!("Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Sessions: {}", self.sessions_completed);
        println!("   ├─ Records drained: {}", self.drains.total_records);
        println!("   ├─ Records/s: {:.2}", self.records_per_sec());
        println!("   ├─ Records dropped (buffer full): {}", self.dropped_records());
        println!("   └─ Interrupted: {}", self.interrupted);

        for (index, buffer) in self.buffers.iter().enumerate() {
            println!("\nSession {} buffer", index + 1);
            println!("   ├─ Inserted: {}", buffer.inserted_records);
            println!(
                "   ├─ Dropped: {} batches / {} records ({:.2}%)",
                buffer.dropped_batches,
                buffer.dropped_records,
                buffer.drop_rate()
            );
            println!("   └─ Left at stop: {}/{}", buffer.len, buffer.max_entries);
        }

        if !self.workers.is_empty() {
            println!("\nWorkers");
            for report in &self.workers {
                println!(
                    "   ├─ {}: {} cycles, {} records, {} overruns, exit {:?}",
                    report.label,
                    report.cycles,
                    report.records_collected,
                    report.overruns,
                    report.exit
                );
            }
        }

        println!("\n{}", self.drains.summary());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use acquisition::WorkerExit;
    use contracts::{RecordPayload, Timestamp};

    fn report(label: &str, exit: WorkerExit) -> WorkerReport {
        WorkerReport {
            label: label.into(),
            cycles: 10,
            records_collected: 10,
            batches_inserted: 10,
            batches_dropped: 0,
            records_dropped: 0,
            overruns: 0,
            exit,
        }
    }

    #[test]
    fn test_record_drain_counts_sources() {
        let mut stats = RunStats::default();
        let records = vec![
            Record::new(Timestamp::from_nanos(1), "imu", RecordPayload::Empty),
            Record::new(Timestamp::from_nanos(2), "gps", RecordPayload::Empty),
            Record::new(Timestamp::from_nanos(3), "imu", RecordPayload::Empty),
        ];
        stats.record_drain(&records);
        stats.record_drain(&[]);

        let summary = stats.drains.summary();
        assert_eq!(summary.drain_calls, 2);
        assert_eq!(summary.empty_drains, 1);
        assert_eq!(summary.total_records, 3);
        assert_eq!(summary.per_source.get("imu"), Some(&2));
    }

    #[test]
    fn test_session_totals() {
        let mut stats = RunStats::default();
        stats.record_session(
            vec![report("a", WorkerExit::Cancelled)],
            BufferStats {
                dropped_records: 4,
                ..Default::default()
            },
        );
        stats.record_session(
            vec![report("a", WorkerExit::InitFailed("missing".into()))],
            BufferStats {
                dropped_records: 1,
                ..Default::default()
            },
        );

        assert_eq!(stats.sessions_completed, 2);
        assert_eq!(stats.dropped_records(), 5);
        assert_eq!(stats.failed_workers(), 1);
    }

    #[test]
    fn test_records_per_sec() {
        let mut stats = RunStats::default();
        assert_eq!(stats.records_per_sec(), 0.0);

        stats.drains.total_records = 50;
        stats.duration = Duration::from_secs(2);
        assert!((stats.records_per_sec() - 25.0).abs() < 1e-9);
    }
}
