//! # Contracts
//!
//! Frozen interface contracts shared by every acquisition crate.
//! Business crates depend on this crate only, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - `Timestamp` is wall-clock acquisition time in nanoseconds since the UNIX epoch
//! - Several records may carry the same timestamp (multi-map semantics)

mod data_source;
mod error;
mod record;
mod source_config;

pub use data_source::DataSource;
pub use error::*;
pub use record::*;
pub use source_config::*;
