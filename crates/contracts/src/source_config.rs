//! AcquisitionConfig - Config Loader output
//!
//! Global settings plus the ordered list of source sections.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::SourceError;

/// Reserved name of the global settings section
pub const GLOBAL_SECTION_NAME: &str = "global";

/// Complete acquisition configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AcquisitionConfig {
    /// Global settings
    pub global: GlobalSettings,

    /// Source sections, in file order
    pub sources: Vec<SourceConfig>,
}

impl AcquisitionConfig {
    /// Sources a controller would actually launch
    pub fn active_sources(&self) -> impl Iterator<Item = &SourceConfig> {
        self.sources.iter().filter(|source| source.is_launchable())
    }
}

/// Global settings section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalSettings {
    /// Prefix for session output names
    pub rawlog_prefix: String,

    /// Delay between two worker launches (ms)
    #[serde(rename = "time_between_launches")]
    pub launch_stagger_ms: u64,

    /// Shared buffer capacity (entries)
    pub max_entries: usize,

    /// Pause between raising the cancellation flag and joining workers (ms)
    pub shutdown_grace_ms: u64,

    /// Hand sources an external storage directory for large payloads
    pub external_storage: bool,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            rawlog_prefix: "dataset".to_string(),
            launch_stagger_ms: 300,
            max_entries: 50,
            shutdown_grace_ms: 300,
            external_storage: true,
        }
    }
}

impl GlobalSettings {
    /// Launch stagger as a `Duration`
    pub fn launch_stagger(&self) -> Duration {
        Duration::from_millis(self.launch_stagger_ms)
    }

    /// Shutdown grace interval as a `Duration`
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

/// Driver-specific parameter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl ParamValue {
    /// Numeric view (integers widen to f64)
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            Self::Text(s) => s.trim().parse().ok(),
            Self::Bool(_) => None,
        }
    }

    /// Non-negative integer view
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Integer(v) => u64::try_from(*v).ok(),
            Self::Float(v) if *v >= 0.0 && v.fract() == 0.0 => Some(*v as u64),
            Self::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Boolean view (accepts "true"/"false"/"1"/"0" text)
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            Self::Integer(v) => Some(*v != 0),
            Self::Text(s) => match s.trim().to_lowercase().as_str() {
                "true" | "yes" | "1" => Some(true),
                "false" | "no" | "0" => Some(false),
                _ => None,
            },
            Self::Float(_) => None,
        }
    }

    /// Text view
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// One source section
///
/// The label is the section name and is filled in by the loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Unique identifier (section name)
    #[serde(skip)]
    pub label: String,

    /// Source implementation to instantiate
    #[serde(rename = "driver", default)]
    pub driver_kind: String,

    /// Polling rate (Hz), must be > 0
    #[serde(rename = "process_rate", default)]
    pub poll_rate_hz: f64,

    /// Skip this section at start
    #[serde(rename = "grabber_ignore", alias = "rawlog-grabber-ignore", default)]
    pub ignore: bool,

    /// Driver-specific parameters
    #[serde(flatten)]
    pub params: BTreeMap<String, ParamValue>,
}

impl SourceConfig {
    /// Create a source section
    pub fn new(label: impl Into<String>, driver_kind: impl Into<String>, poll_rate_hz: f64) -> Self {
        Self {
            label: label.into(),
            driver_kind: driver_kind.into(),
            poll_rate_hz,
            ignore: false,
            params: BTreeMap::new(),
        }
    }

    /// Add a driver parameter
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Mark the section as ignored
    pub fn ignored(mut self) -> Self {
        self.ignore = true;
        self
    }

    /// Whether a controller should spawn a worker for this section
    pub fn is_launchable(&self) -> bool {
        !self.ignore && !self.label.is_empty() && self.label != GLOBAL_SECTION_NAME
    }

    /// Raw parameter lookup
    pub fn param(&self, key: &str) -> Option<&ParamValue> {
        self.params.get(key)
    }

    pub fn param_f64(&self, key: &str) -> Option<f64> {
        self.param(key).and_then(ParamValue::as_f64)
    }

    pub fn param_u64(&self, key: &str) -> Option<u64> {
        self.param(key).and_then(ParamValue::as_u64)
    }

    pub fn param_bool(&self, key: &str) -> Option<bool> {
        self.param(key).and_then(ParamValue::as_bool)
    }

    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.param(key).and_then(ParamValue::as_str)
    }

    /// Per-source sanity check
    ///
    /// # Errors
    /// `SourceError::Config` when the driver is missing or the rate is not > 0.
    pub fn check(&self) -> Result<(), SourceError> {
        if self.driver_kind.trim().is_empty() {
            return Err(SourceError::config(&self.label, "driver must be set"));
        }
        if !(self.poll_rate_hz.is_finite() && self.poll_rate_hz > 0.0) {
            return Err(SourceError::config(
                &self.label,
                format!(
                    "process_rate must be set to a valid value (>0 Hz), got {}",
                    self.poll_rate_hz
                ),
            ));
        }
        Ok(())
    }
}
