//! Mock source
//!
//! Generates synthetic records on every poll. Used for tests and for
//! running the grabber without hardware.

use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use bytes::Bytes;
use contracts::{DataSource, ParamValue, Record, RecordPayload, SourceConfig, SourceError, Timestamp};
use tracing::{debug, trace};

use super::typed;

/// Mock source parameters
#[derive(Debug, Clone, PartialEq)]
pub struct MockSourceConfig {
    /// Records produced per poll
    pub records_per_poll: u64,
    /// Inline payload size (bytes), 0 = empty payload
    pub payload_bytes: u64,
    /// Fail with a device error on this poll (1-based)
    pub fail_after_polls: Option<u64>,
    /// Fail `initialize` as if the device were missing
    pub fail_init: bool,
    /// Simulated device latency per poll
    pub poll_delay: Duration,
    /// Reference payloads under the external storage directory
    pub external_payloads: bool,
}

impl Default for MockSourceConfig {
    fn default() -> Self {
        Self {
            records_per_poll: 1,
            payload_bytes: 16,
            fail_after_polls: None,
            fail_init: false,
            poll_delay: Duration::ZERO,
            external_payloads: false,
        }
    }
}

impl MockSourceConfig {
    /// Read mock parameters from a source section
    ///
    /// # Errors
    /// `SourceError::Config` if a parameter has the wrong type.
    pub fn from_section(config: &SourceConfig) -> Result<Self, SourceError> {
        let defaults = Self::default();
        let label = config.label.as_str();

        Ok(Self {
            records_per_poll: typed(config, "records_per_poll", ParamValue::as_u64)?
                .unwrap_or(defaults.records_per_poll),
            payload_bytes: typed(config, "payload_bytes", ParamValue::as_u64)?
                .unwrap_or(defaults.payload_bytes),
            fail_after_polls: typed(config, "fail_after_polls", ParamValue::as_u64)?
                .filter(|&n| n > 0),
            fail_init: typed(config, "fail_init", ParamValue::as_bool)?.unwrap_or(false),
            poll_delay: typed(config, "poll_delay_ms", ParamValue::as_u64)?
                .map(Duration::from_millis)
                .unwrap_or(defaults.poll_delay),
            external_payloads: typed(config, "external_payloads", ParamValue::as_bool)?
                .unwrap_or(false),
        })
        .inspect(|parsed| trace!(label = %label, config = ?parsed, "mock parameters"))
    }
}

/// Synthetic data source
#[derive(Debug, Default)]
pub struct MockSource {
    label: String,
    rate_hz: f64,
    config: MockSourceConfig,
    external_dir: Option<PathBuf>,
    polls: u64,
    sequence: u64,
    pending: Vec<Record>,
    initialized: bool,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Polls performed so far
    pub fn polls(&self) -> u64 {
        self.polls
    }

    fn next_payload(&self) -> RecordPayload {
        if self.config.external_payloads {
            if let Some(dir) = &self.external_dir {
                return RecordPayload::External(
                    dir.join(format!("{}_{:06}.bin", self.label, self.sequence)),
                );
            }
        }

        match self.config.payload_bytes {
            0 => RecordPayload::Empty,
            n => RecordPayload::Bytes(Bytes::from(vec![(self.sequence % 256) as u8; n as usize])),
        }
    }
}

impl DataSource for MockSource {
    fn configure(&mut self, config: &SourceConfig) -> Result<(), SourceError> {
        self.label = config.label.clone();
        self.rate_hz = config.poll_rate_hz;
        self.config = MockSourceConfig::from_section(config)?;
        Ok(())
    }

    fn set_external_storage_path(&mut self, path: &Path) {
        self.external_dir = Some(path.to_path_buf());
    }

    fn initialize(&mut self) -> Result<(), SourceError> {
        if self.config.fail_init {
            return Err(SourceError::init(&self.label, "mock device not found"));
        }
        self.initialized = true;
        debug!(
            label = %self.label,
            records_per_poll = self.config.records_per_poll,
            "mock source initialized"
        );
        Ok(())
    }

    fn poll(&mut self) -> Result<(), SourceError> {
        if !self.initialized {
            return Err(SourceError::device(&self.label, "polled before initialize"));
        }
        self.polls += 1;
        if self.config.fail_after_polls == Some(self.polls) {
            return Err(SourceError::device(
                &self.label,
                format!("mock device failed on poll {}", self.polls),
            ));
        }

        if !self.config.poll_delay.is_zero() {
            thread::sleep(self.config.poll_delay);
        }

        let timestamp = Timestamp::now();
        for _ in 0..self.config.records_per_poll {
            self.sequence += 1;
            let payload = self.next_payload();
            self.pending.push(Record::new(timestamp, self.label.as_str(), payload));
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
        self.initialized = false;
        self.pending.clear();
        debug!(label = %self.label, polls = self.polls, "mock source stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured(config: SourceConfig) -> MockSource {
        let mut source = MockSource::new();
        source.configure(&config).unwrap();
        source
    }

    #[test]
    fn test_defaults() {
        let parsed = MockSourceConfig::from_section(&SourceConfig::new("m", "mock", 5.0)).unwrap();
        assert_eq!(parsed, MockSourceConfig::default());
    }

    #[test]
    fn test_parameters_are_read() {
        let config = SourceConfig::new("m", "mock", 5.0)
            .with_param("records_per_poll", 3i64)
            .with_param("payload_bytes", 0i64)
            .with_param("fail_after_polls", 7i64)
            .with_param("fail_init", "yes")
            .with_param("poll_delay_ms", 20i64);
        let parsed = MockSourceConfig::from_section(&config).unwrap();

        assert_eq!(parsed.records_per_poll, 3);
        assert_eq!(parsed.payload_bytes, 0);
        assert_eq!(parsed.fail_after_polls, Some(7));
        assert!(parsed.fail_init);
        assert_eq!(parsed.poll_delay, Duration::from_millis(20));
    }

    #[test]
    fn test_mistyped_parameter_is_config_error() {
        let config = SourceConfig::new("m", "mock", 5.0).with_param("records_per_poll", "many");
        let err = MockSourceConfig::from_section(&config).unwrap_err();
        assert!(matches!(err, SourceError::Config { .. }));
        assert!(err.to_string().contains("records_per_poll"));
    }

    #[test]
    fn test_poll_produces_records() {
        let mut source = configured(
            SourceConfig::new("imu", "mock", 100.0)
                .with_param("records_per_poll", 4i64)
                .with_param("payload_bytes", 8i64),
        );
        source.initialize().unwrap();
        source.poll().unwrap();

        let records = source.collect_new_records();
        assert_eq!(records.len(), 4);
        assert!(records.iter().all(|r| r.source_key() == "imu"));
        assert!(records.iter().all(|r| r.payload().len() == 8));
        assert!(source.collect_new_records().is_empty());
        assert_eq!(source.poll_rate_hz(), 100.0);
    }

    #[test]
    fn test_fail_init() {
        let mut source = configured(SourceConfig::new("m", "mock", 1.0).with_param("fail_init", true));
        assert!(matches!(source.initialize(), Err(SourceError::Init { .. })));
    }

    #[test]
    fn test_poll_requires_initialize() {
        let mut source = configured(SourceConfig::new("m", "mock", 1.0));
        assert!(matches!(source.poll(), Err(SourceError::Device { .. })));
        assert_eq!(source.polls(), 0);

        source.initialize().unwrap();
        assert!(source.poll().is_ok());

        source.shutdown();
        assert!(source.poll().is_err());
    }

    #[test]
    fn test_fail_after_polls() {
        let mut source =
            configured(SourceConfig::new("m", "mock", 1.0).with_param("fail_after_polls", 2i64));
        source.initialize().unwrap();
        assert!(source.poll().is_ok());
        assert!(matches!(source.poll(), Err(SourceError::Device { .. })));
        assert_eq!(source.polls(), 2);
    }

    #[test]
    fn test_external_payloads_use_storage_dir() {
        let mut source = configured(
            SourceConfig::new("cam", "mock", 1.0).with_param("external_payloads", true),
        );
        source.set_external_storage_path(Path::new("/data/run_Images"));
        source.initialize().unwrap();
        source.poll().unwrap();

        let records = source.collect_new_records();
        assert_eq!(
            records[0].payload(),
            &RecordPayload::External(PathBuf::from("/data/run_Images/cam_000001.bin"))
        );
    }

    #[test]
    fn test_external_payloads_without_dir_stay_inline() {
        let mut source = configured(
            SourceConfig::new("cam", "mock", 1.0).with_param("external_payloads", true),
        );
        source.initialize().unwrap();
        source.poll().unwrap();
        assert!(matches!(
            source.collect_new_records()[0].payload(),
            RecordPayload::Bytes(_)
        ));
    }
}
