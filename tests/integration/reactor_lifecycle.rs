//! Integration tests for the background reactor thread.
//!
//! Covers the start/stop/join contract, the startup liveness probe, and
//! best-effort delivery of tasks already on the bridge when the reactor
//! stops.
//!
//! Verification command: `cargo test --test reactor_lifecycle`

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use parley::reactor::Reactor;
use parley_dispatch::{Bridge, CondvarWaker, MainLoopWaker};

fn bridge_with_waker() -> (Arc<Bridge>, Arc<CondvarWaker>) {
    let waker = Arc::new(CondvarWaker::new());
    let bridge = Arc::new(Bridge::new(Arc::clone(&waker) as Arc<dyn MainLoopWaker>));
    (bridge, waker)
}

/// Drain until `done` or a 10 second deadline.
fn drain_until(bridge: &Bridge, waker: &CondvarWaker, done: impl Fn(usize) -> bool) -> usize {
    let deadline = Instant::now() + Duration::from_secs(10);
    let mut total = 0;
    while !done(total) {
        assert!(Instant::now() < deadline, "timed out after {total} tasks");
        waker.wait(Duration::from_millis(20));
        total += bridge.drain();
    }
    total
}

#[test]
fn reactor_results_arrive_in_submission_order() {
    let (bridge, waker) = bridge_with_waker();
    let mut reactor = Reactor::spawn(Arc::clone(&bridge)).unwrap();
    let log = Arc::new(Mutex::new(Vec::new()));

    let task_bridge = Arc::clone(&bridge);
    let task_log = Arc::clone(&log);
    reactor.handle().spawn(async move {
        for seq in 0..10 {
            let log = Arc::clone(&task_log);
            task_bridge.post(move || log.lock().push(seq));
            // Yield between posts so ordering does not ride on batching.
            tokio::task::yield_now().await;
        }
    });

    // The startup liveness probe also rides the bridge; count it.
    drain_until(&bridge, &waker, |_| log.lock().len() >= 10);
    assert_eq!(*log.lock(), (0..10).collect::<Vec<_>>());

    reactor.stop();
    reactor.join();
}

#[test]
fn tasks_on_the_bridge_survive_reactor_shutdown() {
    let (bridge, _waker) = bridge_with_waker();
    let mut reactor = Reactor::spawn(Arc::clone(&bridge)).unwrap();

    let posted = Arc::new(AtomicBool::new(false));
    let ran = Arc::new(AtomicBool::new(false));

    let task_bridge = Arc::clone(&bridge);
    let task_posted = Arc::clone(&posted);
    let task_ran = Arc::clone(&ran);
    reactor.handle().spawn(async move {
        task_bridge.post(move || task_ran.store(true, Ordering::SeqCst));
        task_posted.store(true, Ordering::SeqCst);
    });

    let deadline = Instant::now() + Duration::from_secs(10);
    while !posted.load(Ordering::SeqCst) {
        assert!(Instant::now() < deadline, "reactor never posted");
        std::thread::sleep(Duration::from_millis(5));
    }

    // Stop first, drain after: stopping only halts production.
    reactor.stop();
    reactor.join();
    assert!(bridge.drain() >= 1);
    assert!(ran.load(Ordering::SeqCst));
}

#[test]
fn stop_and_join_terminate_the_thread_promptly() {
    let (bridge, _waker) = bridge_with_waker();
    let mut reactor = Reactor::spawn(bridge).unwrap();

    let start = Instant::now();
    reactor.stop();
    reactor.join();
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[test]
fn dropping_the_reactor_stops_it() {
    let (bridge, _waker) = bridge_with_waker();
    let reactor = Reactor::spawn(bridge).unwrap();

    let start = Instant::now();
    drop(reactor);
    assert!(start.elapsed() < Duration::from_secs(5));
}
