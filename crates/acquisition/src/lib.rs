//! # Acquisition
//!
//! Multi-source acquisition core.
//!
//! Responsibilities:
//! - One polling worker thread per configured source, paced to its rate
//! - Single bounded shared buffer, batches dropped when it is full
//! - Drain of the oldest half for external delivery
//! - Cooperative cancellation: stop, or any running-phase fault, ends all workers
//!
//! ## Usage Example
//!
//! ```ignore
//! use acquisition::{Controller, SourceRegistry};
//!
//! let mut controller = Controller::new(SourceRegistry::default());
//! controller.start_from_path(Path::new("configs/grabber.toml"))?;
//!
//! while keep_running() {
//!     let records = controller.drain();
//!     // deliver records
//! }
//!
//! let reports = controller.stop();
//! ```

mod buffer;
mod cancel;
mod controller;
pub mod drivers;
mod error;
mod metrics;
mod pacing;
mod registry;
mod session;
mod worker;

// Re-exports
pub use buffer::{InsertOutcome, SharedBuffer};
pub use cancel::CancellationFlag;
pub use controller::Controller;
pub use error::{AcquisitionError, Result};
pub use metrics::{BufferCounters, BufferStats};
pub use pacing::{CycleTiming, Pacer};
pub use registry::{SourceFactory, SourceRegistry};
pub use session::{strip_invalid_file_chars, SessionNaming};
pub use worker::{Worker, WorkerContext, WorkerExit, WorkerHandle, WorkerReport, WorkerState};
