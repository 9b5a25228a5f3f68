//! DataSource trait - polled data provider abstraction
//!
//! Decouples the acquisition workers from concrete device drivers.
//! Mock, replay and hardware drivers all implement the same pull API.

use std::path::Path;

use crate::{Record, SourceConfig, SourceError};

/// Polled data source
///
/// A worker drives the source through a fixed sequence:
/// `configure` → `set_external_storage_path` → `initialize` →
/// (`poll` → `collect_new_records`)* → `shutdown`.
///
/// The source is owned by exactly one worker thread, so methods take
/// `&mut self` and implementations need no interior locking.
///
/// # Example
///
/// ```ignore
/// let mut source: Box<dyn DataSource> = registry.create("mock")?;
/// source.configure(&config)?;
/// source.initialize()?;
/// source.poll()?;
/// let records = source.collect_new_records();
/// source.shutdown();
/// ```
pub trait DataSource: Send {
    /// Load common and driver-specific parameters
    fn configure(&mut self, config: &SourceConfig) -> Result<(), SourceError>;

    /// Directory for payloads too large to keep inline
    ///
    /// Only meaningful for sources with large external payloads.
    fn set_external_storage_path(&mut self, _path: &Path) {}

    /// Open the device
    fn initialize(&mut self) -> Result<(), SourceError>;

    /// Advance internal state (may talk to the device)
    fn poll(&mut self) -> Result<(), SourceError>;

    /// Take the records produced since the last call
    fn collect_new_records(&mut self) -> Vec<Record>;

    /// Configured polling rate (Hz)
    fn poll_rate_hz(&self) -> f64;

    /// Release the device
    fn shutdown(&mut self);
}
