/*!
 * Cooperative cancellation checked between candidates
 */

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared stop request; clones observe the same flag
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
