//! Shared submission guard.
//!
//! Vulkan requires external synchronization on a queue. Inside the frame loop
//! only the dispatcher and the overlay touch the selected queue, both on the
//! calling thread, so by default the guard does nothing. Applications that
//! also submit from other threads pass a shared guard instead.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

/// Mutual exclusion around submissions to the selected queue.
#[derive(Clone, Default)]
pub struct SubmissionGuard {
    queue_lock: Option<Arc<Mutex<()>>>,
}

impl SubmissionGuard {
    /// A guard that never blocks: the queue is used from one thread only.
    pub fn unguarded() -> Self {
        Self::default()
    }

    /// A guard backed by a lock the caller shares with its other submitters.
    pub fn shared(lock: Arc<Mutex<()>>) -> Self {
        Self {
            queue_lock: Some(lock),
        }
    }

    /// Whether this guard actually excludes anything.
    pub fn is_shared(&self) -> bool {
        self.queue_lock.is_some()
    }

    /// Hold the queue until the returned value is dropped.
    pub fn lock(&self) -> Option<MutexGuard<'_, ()>> {
        self.queue_lock.as_ref().map(|lock| lock.lock())
    }
}
