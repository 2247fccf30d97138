//! Cooperative cancellation for playback workers

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag a worker polls at its safe points
///
/// Cancelling never interrupts a frame in progress; the worker notices at
/// the top of its next iteration or right after its next lock acquisition.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
