//! Chat panel rendering (message list + input box).

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
};

use super::theme;
use crate::app::{App, SYSTEM_SENDER};

/// Render the chat panel (messages + input box).
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(3)])
        .split(area);

    render_messages(frame, chunks[0], app);
    render_input(frame, chunks[1], app);
}

/// Render the message list, pinned to the newest messages.
fn render_messages(frame: &mut Frame, area: Rect, app: &App) {
    let messages = app.log.snapshot();
    let visible = usize::from(area.height.saturating_sub(2));
    let skip = messages.len().saturating_sub(visible);

    let items: Vec<ListItem> = messages
        .iter()
        .skip(skip)
        .map(|msg| {
            let line = if msg.sender == SYSTEM_SENDER {
                Line::from(vec![
                    Span::styled(&msg.timestamp, theme::dimmed()),
                    Span::raw(" "),
                    Span::styled(&msg.content, theme::system_message()),
                ])
            } else {
                Line::from(vec![
                    Span::styled(&msg.timestamp, theme::dimmed()),
                    Span::raw(" "),
                    Span::styled(&msg.sender, theme::normal().fg(theme::sender_color(&msg.sender))),
                    Span::raw(": "),
                    Span::styled(&msg.content, theme::normal()),
                ])
            };
            ListItem::new(line)
        })
        .collect();

    let block = Block::default().title("Chat").borders(Borders::ALL);
    frame.render_widget(List::new(items).block(block), area);
}

/// Render the input box with a block cursor.
fn render_input(frame: &mut Frame, area: Rect, app: &App) {
    let mut display = app.input.clone();
    if app.cursor_position >= display.len() {
        display.push('█');
    } else {
        display.insert(app.cursor_position, '█');
    }

    let block = Block::default()
        .title("Input")
        .borders(Borders::ALL)
        .border_style(theme::highlighted());
    frame.render_widget(Paragraph::new(display).block(block), area);
}
