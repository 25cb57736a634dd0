use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::tui::app::{App, Mode};
use crate::util::unicode::{display_width, truncate_to_width};

/// Render the status row (bottom of screen)
pub fn render_status_row(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let width = area.width as usize;

    let mut spans: Vec<Span> = Vec::new();
    if let Some(status) = &app.status {
        let color = if status.is_error {
            app.theme.red
        } else {
            app.theme.green
        };
        spans.push(Span::styled(
            truncate_to_width(&format!(" {}", status.text), width),
            Style::default().fg(color).bg(bg),
        ));
    }

    // Right-aligned position and key hint
    let hint = match app.mode {
        Mode::Navigate => match app.sync.row() {
            Some(row) => format!("{}/{}  ? help ", row + 1, app.rows.len()),
            None => "? help ".to_string(),
        },
        Mode::Prompt => "editing ".to_string(),
        Mode::Confirm => "y/n ".to_string(),
    };
    let used: usize = spans.iter().map(|s| display_width(&s.content)).sum();
    let hint_width = display_width(&hint);
    if used + hint_width < width {
        spans.push(Span::styled(
            " ".repeat(width - used - hint_width),
            Style::default().bg(bg),
        ));
        spans.push(Span::styled(hint, Style::default().fg(app.theme.dim).bg(bg)));
    }

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(bg));
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::render::test_helpers::{TERM_W, app_with_sample, render_to_string};

    #[test]
    fn shows_notice_and_position() {
        let (_dir, mut app) = app_with_sample();
        app.set_error("already at top level");
        let out = render_to_string(TERM_W, 1, |frame, area| {
            render_status_row(frame, &app, area)
        });
        assert!(out.starts_with(" already at top level"));
        assert!(out.ends_with("1/4  ? help"));
    }
}
