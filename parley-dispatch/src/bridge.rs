//! Couples the dispatch queue to the main loop's wake primitive.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use crate::queue::DispatchQueue;
use crate::waker::MainLoopWaker;

/// Delivers tasks from any thread to the main loop.
///
/// Exactly one `Bridge` exists per application instance: bootstrap
/// constructs it once and its lifetime equals the application's. Producers
/// call [`Bridge::post`]; the main loop calls [`Bridge::drain`] on each
/// wake and runs every pending task serially before returning to its event
/// source.
pub struct Bridge {
    queue: DispatchQueue,
    waker: Arc<dyn MainLoopWaker>,
}

impl Bridge {
    /// Create a bridge wired to the given wake primitive.
    #[must_use]
    pub fn new(waker: Arc<dyn MainLoopWaker>) -> Self {
        Self {
            queue: DispatchQueue::new(),
            waker,
        }
    }

    /// Schedule `task` to run on the main thread.
    ///
    /// Callable from any thread, including the main thread itself. Returns
    /// as soon as the task is enqueued; the caller never waits for
    /// execution. The wake is issued unconditionally rather than only on
    /// the empty-to-non-empty transition: duplicate wakes are no-ops for
    /// every [`MainLoopWaker`], a missed wake is impossible.
    pub fn post(&self, task: impl FnOnce() + Send + 'static) {
        self.queue.enqueue(Box::new(task));
        self.waker.wake();
    }

    /// Run every pending task serially and return how many ran.
    ///
    /// Must only be called from the thread that owns the main loop. Pop
    /// and invocation are inseparable: a popped task always runs before
    /// the next pop. The queue lock is not held across invocation, so a
    /// task may post more work; tasks posted mid-drain run in this same
    /// call's continuation, in submission order.
    ///
    /// A panicking task is logged and skipped; it never halts delivery of
    /// subsequent tasks and is never re-entered.
    pub fn drain(&self) -> usize {
        let mut ran = 0;
        while let Some(task) = self.queue.drain_one() {
            if let Err(payload) = catch_unwind(AssertUnwindSafe(task)) {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(ToString::to_string)
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "non-string panic payload".to_string());
                tracing::error!(error = %message, "dispatched task panicked; draining continues");
            }
            ran += 1;
        }
        ran
    }

    /// Number of tasks waiting to run.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}
