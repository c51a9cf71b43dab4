//! Background I/O reactor.
//!
//! Owns the one dedicated thread that runs asynchronous I/O for the
//! client. The thread hosts a single-threaded tokio runtime; results are
//! handed back to the main loop exclusively through [`Bridge::post`], so
//! the reactor never touches main-thread-owned state. The reactor's
//! internal async concurrency is private; the bridge sees one producer
//! thread.

use std::io;
use std::sync::Arc;
use std::sync::mpsc;
use std::thread;

use tokio::runtime::Handle;
use tokio::sync::Notify;

use parley_dispatch::Bridge;

/// Errors from reactor startup.
#[derive(Debug, thiserror::Error)]
pub enum ReactorError {
    /// The OS thread could not be spawned.
    #[error("failed to spawn reactor thread: {0}")]
    Spawn(#[source] io::Error),

    /// The tokio runtime could not be built on the reactor thread.
    #[error("failed to build reactor runtime: {0}")]
    Runtime(#[source] io::Error),

    /// The reactor thread exited before handing back its runtime handle.
    #[error("reactor thread exited during startup")]
    Startup,
}

/// Clone-able handle for submitting async work onto the reactor runtime.
#[derive(Clone)]
pub struct ReactorHandle {
    inner: Handle,
}

impl ReactorHandle {
    /// Submit a future to run on the reactor thread.
    ///
    /// Stopping the reactor only prevents new production; tasks the
    /// bridge already holds stay drainable.
    pub fn spawn<F>(&self, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.inner.spawn(future);
    }
}

/// The dedicated background I/O thread.
///
/// Exactly one reactor exists per application instance; bootstrap spawns
/// it after authentication and joins it after the main loop exits.
pub struct Reactor {
    handle: Handle,
    shutdown: Arc<Notify>,
    thread: Option<thread::JoinHandle<()>>,
}

impl Reactor {
    /// Spawn the reactor thread and its runtime.
    ///
    /// On startup the reactor posts a liveness probe through the bridge,
    /// proving cross-thread delivery end to end before any real work is
    /// produced.
    ///
    /// # Errors
    ///
    /// Returns [`ReactorError`] if the thread or its runtime cannot be
    /// created.
    pub fn spawn(bridge: Arc<Bridge>) -> Result<Self, ReactorError> {
        let shutdown = Arc::new(Notify::new());
        let (handle_tx, handle_rx) = mpsc::channel();

        let thread_shutdown = Arc::clone(&shutdown);
        let thread = thread::Builder::new()
            .name("parley-reactor".to_string())
            .spawn(move || run_reactor(&bridge, &thread_shutdown, &handle_tx))
            .map_err(ReactorError::Spawn)?;

        match handle_rx.recv() {
            Ok(Ok(handle)) => Ok(Self {
                handle,
                shutdown,
                thread: Some(thread),
            }),
            Ok(Err(error)) => {
                let _ = thread.join();
                Err(ReactorError::Runtime(error))
            }
            Err(_) => {
                let _ = thread.join();
                Err(ReactorError::Startup)
            }
        }
    }

    /// Handle for submitting async work.
    #[must_use]
    pub fn handle(&self) -> ReactorHandle {
        ReactorHandle {
            inner: self.handle.clone(),
        }
    }

    /// Request loop termination. Idempotent.
    ///
    /// Tasks the bridge already holds stay drainable; only new production
    /// stops.
    pub fn stop(&self) {
        self.shutdown.notify_one();
    }

    /// Block until the reactor thread has exited.
    pub fn join(&mut self) {
        if let Some(thread) = self.thread.take()
            && thread.join().is_err()
        {
            tracing::error!("reactor thread panicked outside its loop");
        }
    }
}

impl Drop for Reactor {
    fn drop(&mut self) {
        self.stop();
        self.join();
    }
}

/// Body of the reactor thread: build the runtime, hand the handle back,
/// park on the shutdown signal.
fn run_reactor(
    bridge: &Arc<Bridge>,
    shutdown: &Arc<Notify>,
    handle_tx: &mpsc::Sender<Result<Handle, io::Error>>,
) {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(error) => {
            let _ = handle_tx.send(Err(error));
            return;
        }
    };
    let _ = handle_tx.send(Ok(runtime.handle().clone()));

    let probe_bridge = Arc::clone(bridge);
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        runtime.block_on(async move {
            probe_bridge.post(|| {
                tracing::debug!("reactor liveness probe delivered on the main thread");
            });
            shutdown.notified().await;
        });
    }));

    // A panic here is fatal to this thread only: the main loop keeps
    // running, but background I/O is lost. Never silent.
    match result {
        Ok(()) => tracing::info!("reactor stopped"),
        Err(_) => tracing::error!("reactor loop panicked; background I/O is lost"),
    }
}
