//! Built-in source drivers
//!
//! - `mock`: synthetic records, no hardware needed
//! - `replay`: plays back a JSONL recording

use contracts::{ParamValue, SourceConfig, SourceError};

pub mod mock;
pub mod replay;

pub use mock::{MockSource, MockSourceConfig};
pub use replay::{ReplayConfig, ReplaySource};

/// Driver kind of [`MockSource`]
pub const MOCK_DRIVER: &str = "mock";

/// Driver kind of [`ReplaySource`]
pub const REPLAY_DRIVER: &str = "replay";

/// Typed parameter lookup, `None` when absent, error when mistyped
pub(crate) fn typed<T>(
    config: &SourceConfig,
    key: &str,
    view: impl Fn(&ParamValue) -> Option<T>,
) -> Result<Option<T>, SourceError> {
    match config.param(key) {
        None => Ok(None),
        Some(value) => view(value).map(Some).ok_or_else(|| {
            SourceError::config(&config.label, format!("invalid value for '{key}': {value:?}"))
        }),
    }
}
