//! Main window: terminal lifecycle and the drain-draw-poll loop.
//!
//! The window is the consumer side of the dispatch bridge. Each tick
//! drains every pending task (serially, on this thread), draws a frame,
//! then polls for terminal input with a bounded timeout. Its wake
//! primitive is a latched flag: the poll timeout bounds wake latency, the
//! flag survives until the loop consumes it.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};

use parley_dispatch::{Bridge, MainLoopWaker};

use crate::app::App;
use crate::bootstrap::MainLoop;
use crate::reactor::ReactorHandle;
use crate::ui;

/// Latched-flag waker for a poll-based event loop.
///
/// `wake` stores a flag the loop checks and clears each tick. Duplicate
/// wakes collapse; a wake between ticks is observed on the next tick at
/// the latest.
#[derive(Default)]
pub struct FlagWaker(AtomicBool);

impl FlagWaker {
    /// Create a waker with no pending wake.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume the pending wake, if any.
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }
}

impl MainLoopWaker for FlagWaker {
    fn wake(&self) {
        self.0.store(true, Ordering::Release);
    }
}

/// The chat window and its event loop.
pub struct MainWindow {
    app: App,
    waker: Arc<FlagWaker>,
    poll_timeout: Duration,
}

impl MainWindow {
    /// Create a window with the default poll timeout.
    #[must_use]
    pub fn new() -> Self {
        Self {
            app: App::new(),
            waker: Arc::new(FlagWaker::new()),
            poll_timeout: Duration::from_millis(50),
        }
    }

    /// Override the input poll timeout.
    #[must_use]
    pub const fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    /// Terminal setup and restore around the event loop.
    fn run_terminal(&mut self, bridge: &Arc<Bridge>, reactor: &ReactorHandle) -> io::Result<i32> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.event_loop(&mut terminal, bridge, reactor);

        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;
        result
    }

    /// The drain-draw-poll loop.
    fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
        bridge: &Arc<Bridge>,
        reactor: &ReactorHandle,
    ) -> io::Result<i32> {
        self.app.log.push_system("Signed in. Type a message; Esc quits.");

        loop {
            // Consume the wake and drain before drawing, so a frame never
            // shows stale state.
            self.waker.take();
            self.app.drained_total += bridge.drain();
            self.app.pending_tasks = bridge.pending();

            terminal.draw(|frame| ui::draw(frame, &self.app))?;

            if event::poll(self.poll_timeout)?
                && let Event::Key(key) = event::read()?
            {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if let Some(text) = self.app.handle_key_event(key) {
                    self.submit_message(bridge, reactor, text);
                }
            }

            if self.app.should_quit {
                return Ok(0);
            }
        }
    }

    /// Hand a typed message to the reactor.
    ///
    /// The echo peer stands in for protocol traffic: the reply rides the
    /// bridge back onto this thread like any real I/O result would.
    fn submit_message(&self, bridge: &Arc<Bridge>, reactor: &ReactorHandle, text: String) {
        self.app.log.push_chat("You", &text);
        let log = self.app.log.clone();
        let bridge = Arc::clone(bridge);
        reactor.spawn(async move {
            tokio::time::sleep(Duration::from_millis(120)).await;
            bridge.post(move || log.push_chat("echo", &text));
        });
    }
}

impl Default for MainWindow {
    fn default() -> Self {
        Self::new()
    }
}

impl MainLoop for MainWindow {
    fn waker(&self) -> Arc<dyn MainLoopWaker> {
        Arc::clone(&self.waker) as Arc<dyn MainLoopWaker>
    }

    fn run(&mut self, bridge: Arc<Bridge>, reactor: ReactorHandle) -> i32 {
        match self.run_terminal(&bridge, &reactor) {
            Ok(code) => code,
            Err(error) => {
                tracing::error!(%error, "main loop terminated by an I/O error");
                1
            }
        }
    }
}
