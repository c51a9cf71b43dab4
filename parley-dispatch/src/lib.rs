//! Cross-thread task dispatch core for Parley.
//!
//! A background reactor thread schedules units of work onto a
//! single-threaded main loop through a [`Bridge`]: an unbounded FIFO
//! [`DispatchQueue`] coupled to the loop's wake primitive. Producers never
//! block, the consumer drains serially, and per-producer submission order
//! is preserved.
//!
//! The crate is event-loop agnostic: the main loop supplies its wake
//! mechanism through the [`MainLoopWaker`] trait, so the same bridge
//! drives a ratatui poll loop in production and a condvar-parked loop in
//! tests.

pub mod bridge;
pub mod queue;
pub mod waker;

pub use bridge::Bridge;
pub use queue::{DispatchQueue, Task};
pub use waker::{CondvarWaker, MainLoopWaker};
