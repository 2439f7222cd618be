//! Cooperative cancellation token.
//!
//! Shared between the scheduler and every polling loop inside tasks. The
//! token is checked before each task, before each inter-task delay, and at
//! every poll iteration, so stop latency is bounded by the poll interval of
//! whatever loop is currently running.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Safe to call from any thread, any number of times.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let token = CancelToken::new();
        let other = token.clone();
        assert!(!other.is_cancelled());

        token.cancel();
        assert!(other.is_cancelled());
    }
}
