use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// One-shot cancellation signal
///
/// Cloning shares the underlying flag. Once set it stays set for the lifetime
/// of the run; `cancel` may be called any number of times from any thread.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    inner: Arc<AtomicBool>,
}

impl CancelFlag {
    /// Creates a new, unset flag
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation
    pub fn cancel(&self) {
        self.inner.store(true, Ordering::SeqCst);
    }

    /// Returns true once cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.inner.load(Ordering::SeqCst)
    }
}
