//! Record - Source output
//!
//! Immutable unit of acquired data.

use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Acquisition timestamp (nanoseconds since the UNIX epoch)
///
/// Used as the ordering key of the shared buffer. Not unique.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Create from raw nanoseconds
    pub const fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    /// Create from fractional seconds (negative values clamp to zero)
    pub fn from_secs_f64(secs: f64) -> Self {
        if secs <= 0.0 || !secs.is_finite() {
            return Self(0);
        }
        Self((secs * 1e9).round() as u64)
    }

    /// Current wall-clock time
    pub fn now() -> Self {
        let since_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO);
        Self(since_epoch.as_nanos() as u64)
    }

    /// Raw nanoseconds
    pub const fn as_nanos(self) -> u64 {
        self.0
    }

    /// Fractional seconds
    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / 1e9
    }

    /// Timestamp shifted forward by `delta`
    pub fn saturating_add(self, delta: Duration) -> Self {
        Self(self.0.saturating_add(delta.as_nanos() as u64))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}", self.0 / 1_000_000_000, self.0 % 1_000_000_000)
    }
}

/// Opaque record payload
///
/// The controller never inspects the payload, it only moves it around.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordPayload {
    /// No payload
    #[default]
    Empty,

    /// Raw bytes (zero-copy)
    Bytes(Bytes),

    /// Textual payload
    Text(String),

    /// Large payload stored outside the buffer
    External(PathBuf),
}

impl RecordPayload {
    /// Payload size in bytes (external payloads count as zero)
    pub fn len(&self) -> usize {
        match self {
            Self::Empty | Self::External(_) => 0,
            Self::Bytes(bytes) => bytes.len(),
            Self::Text(text) => text.len(),
        }
    }

    /// Whether the payload carries no inline data
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Acquired record
///
/// Immutable after construction; cloning is cheap because byte payloads
/// are reference counted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    timestamp: Timestamp,
    source_key: String,
    payload: RecordPayload,
}

impl Record {
    /// Create a new record
    pub fn new(timestamp: Timestamp, source_key: impl Into<String>, payload: RecordPayload) -> Self {
        Self {
            timestamp,
            source_key: source_key.into(),
            payload,
        }
    }

    /// Acquisition time
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// Label of the source that produced the record
    pub fn source_key(&self) -> &str {
        &self.source_key
    }

    /// Source-defined payload
    pub fn payload(&self) -> &RecordPayload {
        &self.payload
    }

    /// Consume the record, returning its payload
    pub fn into_payload(self) -> RecordPayload {
        self.payload
    }
}
