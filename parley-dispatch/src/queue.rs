//! FIFO holding structure for pending main-thread tasks.

use std::collections::VecDeque;

use parking_lot::Mutex;

/// A deferred, single-invocation unit of work destined for the main thread.
///
/// Tasks capture everything they need by move; once enqueued they hold no
/// aliases back into the producer's state. Ownership transfers to the
/// executing call frame on drain and the task is discarded after the call.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Ordered, thread-safe sequence of pending [`Task`]s.
///
/// Any thread may enqueue, including the main thread itself; exactly one
/// thread (the main loop) is expected to drain. The critical section is a
/// single push or pop on the inner deque, so `enqueue` never blocks the
/// caller beyond that.
///
/// Ordering: submissions from a single producer thread are never
/// reordered. When two producers race, the internal lock picks either
/// interleaving.
#[derive(Default)]
pub struct DispatchQueue {
    inner: Mutex<VecDeque<Task>>,
}

impl DispatchQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(VecDeque::new()),
        }
    }

    /// Append a task to the back of the queue.
    ///
    /// Cannot fail: the queue is unbounded.
    pub fn enqueue(&self, task: Task) {
        self.inner.lock().push_back(task);
    }

    /// Remove and return the oldest pending task.
    ///
    /// `None` means "no work available", not an error. The lock is
    /// released before the caller invokes the task, so a running task may
    /// enqueue more work without deadlocking.
    #[must_use]
    pub fn drain_one(&self) -> Option<Task> {
        self.inner.lock().pop_front()
    }

    /// Number of tasks currently pending.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Whether no tasks are pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}
