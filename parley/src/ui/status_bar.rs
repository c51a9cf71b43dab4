//! Status bar rendering.

use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
};

use super::theme;
use crate::app::App;

/// Render the status bar at the bottom of the screen.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let status_line = Line::from(vec![
        Span::styled("Parley v0.1.0", theme::bold()),
        Span::raw(" | "),
        Span::styled("●", theme::normal().fg(theme::SUCCESS)),
        Span::raw(format!(
            " tasks run: {} ({} pending)",
            app.drained_total, app.pending_tasks
        )),
        Span::raw(" | "),
        Span::styled("Enter: send | Esc: quit", theme::dimmed()),
    ]);

    frame.render_widget(Paragraph::new(status_line).style(theme::status_bar_bg()), area);
}
