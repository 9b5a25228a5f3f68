//! Host driver loop: start / drain / stop rounds around one controller.

mod driver;
mod stats;

pub use driver::{HostConfig, HostLoop};
pub use stats::RunStats;
