//! A minimal cooperative cancellation signal shared between the orchestrator and the
//! CPU-bound routing worker pools. Workers poll it between units of work; nothing here
//! preempts a running thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self { flag: Arc::new(AtomicBool::new(false)) }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_canceled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_uncanceled_and_propagates_through_clones() {
        let tok = CancellationToken::new();
        let clone = tok.clone();
        assert!(!tok.is_canceled());
        clone.cancel();
        assert!(tok.is_canceled());
    }
}
