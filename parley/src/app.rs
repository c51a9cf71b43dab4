//! Application state and key handling for the main window.

use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use parking_lot::Mutex;

/// Sender name used for system lines.
pub const SYSTEM_SENDER: &str = "system";

/// A message for display in the chat panel.
#[derive(Debug, Clone)]
pub struct DisplayMessage {
    /// Sender's display name.
    pub sender: String,
    /// Message content.
    pub content: String,
    /// Formatted timestamp (e.g., "14:23").
    pub timestamp: String,
}

/// Shared, append-only message log.
///
/// Dispatched tasks capture a clone and append when they execute. Every
/// task runs on the UI thread, so the lock is uncontended by construction;
/// it exists because a `Send` task cannot borrow the window's state.
#[derive(Clone, Default)]
pub struct MessageLog {
    inner: Arc<Mutex<Vec<DisplayMessage>>>,
}

impl MessageLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chat line from `sender`.
    pub fn push_chat(&self, sender: &str, content: &str) {
        self.inner.lock().push(DisplayMessage {
            sender: sender.to_string(),
            content: content.to_string(),
            timestamp: chrono::Local::now().format("%H:%M").to_string(),
        });
    }

    /// Append a system line.
    pub fn push_system(&self, content: &str) {
        self.push_chat(SYSTEM_SENDER, content);
    }

    /// Copy of the current messages, for rendering.
    #[must_use]
    pub fn snapshot(&self) -> Vec<DisplayMessage> {
        self.inner.lock().clone()
    }

    /// Number of messages logged so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Whether the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

/// Main window state.
pub struct App {
    /// Current text input.
    pub input: String,
    /// Cursor position in input (character index).
    pub cursor_position: usize,
    /// Message log shared with dispatched tasks.
    pub log: MessageLog,
    /// Whether the window should quit.
    pub should_quit: bool,
    /// Tasks run by the bridge since startup.
    pub drained_total: usize,
    /// Tasks still pending on the bridge after the last drain.
    pub pending_tasks: usize,
}

impl App {
    /// Create an empty window state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            input: String::new(),
            cursor_position: 0,
            log: MessageLog::new(),
            should_quit: false,
            drained_total: 0,
            pending_tasks: 0,
        }
    }

    /// Handle a key press.
    ///
    /// Returns the submitted message text when Enter is pressed on a
    /// non-empty input; the caller decides where it goes.
    pub fn handle_key_event(&mut self, key: KeyEvent) -> Option<String> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return None;
        }
        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Enter => {
                if !self.input.is_empty() {
                    let text = std::mem::take(&mut self.input);
                    self.cursor_position = 0;
                    return Some(text);
                }
            }
            KeyCode::Char(c) => {
                self.input.insert(self.cursor_position, c);
                self.cursor_position += c.len_utf8();
            }
            KeyCode::Backspace => {
                if self.cursor_position > 0 {
                    let prev = floor_char_boundary(&self.input, self.cursor_position - 1);
                    self.input.remove(prev);
                    self.cursor_position = prev;
                }
            }
            KeyCode::Left => {
                if self.cursor_position > 0 {
                    self.cursor_position = floor_char_boundary(&self.input, self.cursor_position - 1);
                }
            }
            KeyCode::Right => {
                if self.cursor_position < self.input.len() {
                    let mut next = self.cursor_position + 1;
                    while !self.input.is_char_boundary(next) {
                        next += 1;
                    }
                    self.cursor_position = next;
                }
            }
            _ => {}
        }
        None
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

/// Largest char boundary at or below `index`.
fn floor_char_boundary(s: &str, mut index: usize) -> usize {
    while index > 0 && !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}
