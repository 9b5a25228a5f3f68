//! Shared cancellation flag

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Session-wide cancellation flag
///
/// `true` means every worker must exit. Raised by `Controller::stop` or by
/// a worker hitting a running-phase fault; cleared only when a new session
/// starts. Workers observe it once per poll cycle, nobody blocks on it.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask all workers to exit
    pub fn raise(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Reset for a fresh session
    pub fn clear(&self) {
        self.0.store(false, Ordering::Release);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}
