//! Active viewer accounting
//!
//! The count is for reporting only. Each session holds a [`ViewerGuard`];
//! dropping it is the only way to leave, so the count is released exactly
//! once however the session ends.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Shared count of active viewer sessions
#[derive(Debug, Clone, Default)]
pub struct ViewerCount {
    count: Arc<AtomicUsize>,
}

impl ViewerCount {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current number of viewers
    pub fn get(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }

    /// Register a viewer; the returned guard unregisters it on drop
    pub fn enter(&self) -> ViewerGuard {
        self.count.fetch_add(1, Ordering::Relaxed);
        ViewerGuard {
            count: Arc::clone(&self.count),
        }
    }
}

/// Scope of one viewer; decrements the count when dropped
#[derive(Debug)]
pub struct ViewerGuard {
    count: Arc<AtomicUsize>,
}

impl Drop for ViewerGuard {
    fn drop(&mut self) {
        self.count.fetch_sub(1, Ordering::Relaxed);
    }
}
