//! Wake primitives connecting the dispatch queue to a main loop.

use std::time::Duration;

use parking_lot::{Condvar, Mutex};

/// The main loop's wake/notify mechanism.
///
/// `wake` must be callable from any thread and idempotent: a duplicate
/// wake is a harmless no-op, while a missed wake would starve pending
/// tasks. Implementations therefore latch the wake until the loop
/// observes it.
pub trait MainLoopWaker: Send + Sync {
    /// Signal the main loop that work may be pending.
    fn wake(&self);
}

/// Condvar-backed waker for loops without their own event source.
///
/// The consumer parks in [`CondvarWaker::wait`]; producers latch a pending
/// flag and notify. Used by headless main loops and tests.
#[derive(Default)]
pub struct CondvarWaker {
    pending: Mutex<bool>,
    condvar: Condvar,
}

impl CondvarWaker {
    /// Create a waker with no pending wake.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Park until a wake arrives or `timeout` elapses.
    ///
    /// Returns `true` and consumes the latched wake if one was observed.
    /// A wake issued before the call is not lost: the latch is checked
    /// before parking.
    pub fn wait(&self, timeout: Duration) -> bool {
        let mut pending = self.pending.lock();
        if !*pending {
            self.condvar.wait_for(&mut pending, timeout);
        }
        std::mem::take(&mut *pending)
    }
}

impl MainLoopWaker for CondvarWaker {
    fn wake(&self) {
        *self.pending.lock() = true;
        self.condvar.notify_one();
    }
}
