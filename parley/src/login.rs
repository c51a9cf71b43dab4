//! Interactive sign-in prompt.
//!
//! Bootstrap drives authentication through the [`LoginPrompt`] trait: a
//! modal interaction that either accepts a key/certificate path pair or is
//! cancelled. The production implementation is a small two-field terminal
//! form; tests substitute scripted fakes.

use std::io;
use std::path::PathBuf;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::credentials::CredentialPaths;
use crate::ui::theme;

/// Result of a modal sign-in interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// The user chose a key and certificate path.
    Accepted {
        /// Chosen private key file.
        key: PathBuf,
        /// Chosen certificate file.
        cert: PathBuf,
    },
    /// The user backed out of signing in.
    Cancelled,
}

/// A modal sign-in interaction, synchronous from bootstrap's perspective.
pub trait LoginPrompt {
    /// Run the prompt to completion.
    ///
    /// `initial` pre-fills the form with the currently resolved paths.
    /// User cancellation is the [`LoginOutcome::Cancelled`] outcome, not
    /// an error.
    ///
    /// # Errors
    ///
    /// Returns an I/O error only if the terminal interaction itself
    /// fails.
    fn prompt(&mut self, initial: &CredentialPaths) -> io::Result<LoginOutcome>;
}

/// Which form field has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Key,
    Cert,
}

/// Editable state of the sign-in form.
struct LoginForm {
    key: String,
    cert: String,
    focus: Field,
}

impl LoginForm {
    fn field_mut(&mut self) -> &mut String {
        match self.focus {
            Field::Key => &mut self.key,
            Field::Cert => &mut self.cert,
        }
    }

    fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Field::Key => Field::Cert,
            Field::Cert => Field::Key,
        };
    }
}

/// Full-screen terminal sign-in form.
///
/// Owns its own terminal session: raw mode and the alternate screen are
/// entered for the duration of the prompt and restored before returning,
/// so the main window can set up the terminal afresh afterwards.
#[derive(Default)]
pub struct TerminalLoginPrompt;

impl LoginPrompt for TerminalLoginPrompt {
    fn prompt(&mut self, initial: &CredentialPaths) -> io::Result<LoginOutcome> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let outcome = run_form(&mut terminal, initial);

        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;
        outcome
    }
}

/// Event loop of the form itself.
fn run_form(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    initial: &CredentialPaths,
) -> io::Result<LoginOutcome> {
    let mut form = LoginForm {
        key: initial.key.display().to_string(),
        cert: initial.cert.display().to_string(),
        focus: Field::Key,
    };

    loop {
        terminal.draw(|frame| draw_form(frame, &form))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
                return Ok(LoginOutcome::Cancelled);
            }
            match key.code {
                KeyCode::Esc => return Ok(LoginOutcome::Cancelled),
                KeyCode::Enter => {
                    return Ok(LoginOutcome::Accepted {
                        key: PathBuf::from(form.key),
                        cert: PathBuf::from(form.cert),
                    });
                }
                KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                    form.toggle_focus();
                }
                KeyCode::Backspace => {
                    form.field_mut().pop();
                }
                KeyCode::Char(c) => form.field_mut().push(c),
                _ => {}
            }
        }
    }
}

/// Render the two path fields and the help line, centered.
fn draw_form(frame: &mut Frame, form: &LoginForm) {
    let area = centered_rect(frame.area(), 70, 9);

    let outer = Block::default().title("Parley — Sign in").borders(Borders::ALL);
    let inner = outer.inner(area);
    frame.render_widget(outer, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .split(inner);

    render_field(frame, rows[0], "Key file", &form.key, form.focus == Field::Key);
    render_field(
        frame,
        rows[1],
        "Certificate file",
        &form.cert,
        form.focus == Field::Cert,
    );

    let help = Line::from(Span::styled(
        "Enter: sign in | Tab: switch field | Esc: cancel",
        theme::dimmed(),
    ));
    frame.render_widget(Paragraph::new(help), rows[2]);
}

/// Render one path input box.
fn render_field(frame: &mut Frame, area: Rect, title: &str, value: &str, focused: bool) {
    let mut display = value.to_string();
    if focused {
        display.push('█');
    }
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(if focused {
            theme::highlighted()
        } else {
            theme::normal()
        });
    frame.render_widget(Paragraph::new(display).block(block), area);
}

/// Center a `width` x `height` rectangle inside `area`, clamped to fit.
fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
