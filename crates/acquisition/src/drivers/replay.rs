//! Replay Source - 从 JSONL 录制文件回放记录
//!
//! 每行一条记录：`{"timestamp": <秒, f64>, "payload": "<文本>"}`。
//! 每次 poll 按文件顺序输出 `records_per_poll` 条记录。

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use contracts::{DataSource, ParamValue, Record, RecordPayload, SourceConfig, SourceError, Timestamp};
use serde::Deserialize;
use tracing::{debug, info};

use super::typed;

/// JSONL 中的一行
#[derive(Debug, Clone, Deserialize)]
struct ReplayLine {
    timestamp: f64,
    #[serde(default)]
    payload: Option<String>,
}

/// Replay 配置
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayConfig {
    /// 录制文件路径
    pub path: PathBuf,
    /// 每次 poll 输出的记录数
    pub records_per_poll: usize,
    /// 到达文件末尾后从头回放
    pub loop_playback: bool,
}

impl ReplayConfig {
    /// 从 source section 读取参数
    ///
    /// # Errors
    /// 缺少 `path` 或参数类型错误时返回 `SourceError::Config`。
    pub fn from_section(config: &SourceConfig) -> Result<Self, SourceError> {
        let path = config
            .param_str("path")
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| SourceError::config(&config.label, "replay source needs a 'path' parameter"))?;

        Ok(Self {
            path: PathBuf::from(path),
            records_per_poll: typed(config, "records_per_poll", ParamValue::as_u64)?
                .map_or(1, |n| n.max(1) as usize),
            loop_playback: typed(config, "loop_playback", ParamValue::as_bool)?.unwrap_or(false),
        })
    }
}

/// Replay Source
#[derive(Debug, Default)]
pub struct ReplaySource {
    label: String,
    rate_hz: f64,
    config: Option<ReplayConfig>,
    lines: Vec<ReplayLine>,
    cursor: usize,
    /// 已完成的回放轮数（循环回放时用于平移时间戳）
    pass: u64,
    pending: Vec<Record>,
}

impl ReplaySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// 是否已回放到文件末尾（非循环模式）
    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.lines.len()
    }

    fn load(path: &Path, label: &str) -> Result<Vec<ReplayLine>, SourceError> {
        let file = File::open(path).map_err(|e| {
            SourceError::init(label, format!("cannot open replay file {}: {e}", path.display()))
        })?;

        let mut lines = Vec::new();
        for (number, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| SourceError::init(label, e.to_string()))?;
            if line.trim().is_empty() {
                continue;
            }
            let parsed: ReplayLine = serde_json::from_str(&line).map_err(|e| {
                SourceError::init(label, format!("{}:{}: {e}", path.display(), number + 1))
            })?;
            lines.push(parsed);
        }
        Ok(lines)
    }

    /// 循环回放时每轮平移的时间跨度
    fn pass_span(&self) -> u64 {
        match (self.lines.first(), self.lines.last()) {
            (Some(first), Some(last)) => {
                let first = Timestamp::from_secs_f64(first.timestamp).as_nanos();
                let last = Timestamp::from_secs_f64(last.timestamp).as_nanos();
                last.saturating_sub(first) + 1
            }
            _ => 0,
        }
    }
}

impl DataSource for ReplaySource {
    fn configure(&mut self, config: &SourceConfig) -> Result<(), SourceError> {
        self.label = config.label.clone();
        self.rate_hz = config.poll_rate_hz;
        self.config = Some(ReplayConfig::from_section(config)?);
        Ok(())
    }

    fn initialize(&mut self) -> Result<(), SourceError> {
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| SourceError::init(&self.label, "replay source used before configure"))?;

        self.lines = Self::load(&config.path, &self.label)?;
        self.cursor = 0;
        self.pass = 0;

        info!(
            label = %self.label,
            path = %config.path.display(),
            records = self.lines.len(),
            "loaded replay file"
        );
        Ok(())
    }

    fn poll(&mut self) -> Result<(), SourceError> {
        let Some(config) = &self.config else {
            return Ok(());
        };
        if self.lines.is_empty() {
            return Ok(());
        }

        for _ in 0..config.records_per_poll {
            if self.cursor >= self.lines.len() {
                if !config.loop_playback {
                    break;
                }
                self.cursor = 0;
                self.pass += 1;
                debug!(label = %self.label, pass = self.pass, "looping replay");
            }

            let line = &self.lines[self.cursor];
            let offset = self.pass.saturating_mul(self.pass_span());
            let timestamp = Timestamp::from_nanos(
                Timestamp::from_secs_f64(line.timestamp)
                    .as_nanos()
                    .saturating_add(offset),
            );
            let payload = line
                .payload
                .clone()
                .map_or(RecordPayload::Empty, RecordPayload::Text);

            self.pending.push(Record::new(timestamp, self.label.as_str(), payload));
            self.cursor += 1;
        }
        Ok(())
    }

    fn collect_new_records(&mut self) -> Vec<Record> {
        std::mem::take(&mut self.pending)
    }

    fn poll_rate_hz(&self) -> f64 {
        self.rate_hz
    }

    fn shutdown(&mut self) {
        debug!(label = %self.label, replayed = self.cursor, "replay source stopped");
        self.lines.clear();
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_jsonl(lines: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::with_suffix(".jsonl").unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
        file
    }

    fn section(path: &Path) -> SourceConfig {
        SourceConfig::new("gps", "replay", 10.0).with_param("path", path.to_string_lossy().into_owned())
    }

    #[test]
    fn test_missing_path_is_config_error() {
        let err = ReplayConfig::from_section(&SourceConfig::new("gps", "replay", 1.0)).unwrap_err();
        assert!(matches!(err, SourceError::Config { .. }));
    }

    #[test]
    fn test_missing_file_is_init_error() {
        let mut source = ReplaySource::new();
        source
            .configure(&section(Path::new("/nonexistent/replay.jsonl")))
            .unwrap();
        assert!(matches!(source.initialize(), Err(SourceError::Init { .. })));
    }

    #[test]
    fn test_malformed_line_is_init_error() {
        let file = write_jsonl(&[r#"{"timestamp": 1.0}"#, "not json"]);
        let mut source = ReplaySource::new();
        source.configure(&section(file.path())).unwrap();

        let err = source.initialize().unwrap_err();
        assert!(err.to_string().contains(":2:"));
    }

    #[test]
    fn test_replays_in_file_order() {
        let file = write_jsonl(&[
            r#"{"timestamp": 1.5, "payload": "a"}"#,
            "",
            r#"{"timestamp": 2.0, "payload": "b"}"#,
            r#"{"timestamp": 2.5}"#,
        ]);
        let mut source = ReplaySource::new();
        source
            .configure(&section(file.path()).with_param("records_per_poll", 2i64))
            .unwrap();
        source.initialize().unwrap();

        source.poll().unwrap();
        let first = source.collect_new_records();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].timestamp(), Timestamp::from_secs_f64(1.5));
        assert_eq!(first[0].payload(), &RecordPayload::Text("a".into()));
        assert_eq!(first[1].source_key(), "gps");

        source.poll().unwrap();
        let second = source.collect_new_records();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].payload(), &RecordPayload::Empty);
        assert!(source.is_exhausted());

        source.poll().unwrap();
        assert!(source.collect_new_records().is_empty());
    }

    #[test]
    fn test_loop_playback_keeps_timestamps_increasing() {
        let file = write_jsonl(&[
            r#"{"timestamp": 1.0, "payload": "a"}"#,
            r#"{"timestamp": 2.0, "payload": "b"}"#,
        ]);
        let mut source = ReplaySource::new();
        source
            .configure(
                &section(file.path())
                    .with_param("records_per_poll", 5i64)
                    .with_param("loop_playback", true),
            )
            .unwrap();
        source.initialize().unwrap();
        source.poll().unwrap();

        let records = source.collect_new_records();
        assert_eq!(records.len(), 5);
        for pair in records.windows(2) {
            assert!(pair[0].timestamp() < pair[1].timestamp());
        }
        assert_eq!(records[2].payload(), &RecordPayload::Text("a".into()));
    }
}
