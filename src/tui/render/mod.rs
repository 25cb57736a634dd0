pub mod board_view;
pub mod confirm_popup;
pub mod help_overlay;
pub mod outline_view;
pub mod prompt_popup;
pub mod status_row;
pub mod tab_bar;

#[cfg(test)]
pub mod test_helpers;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::widgets::Block;

use super::app::{App, Mode, View};

/// Main render function: dispatches to sub-renderers
pub fn render(frame: &mut Frame, app: &mut App) {
    let area = frame.area();

    // Background fill
    let bg_style = Style::default().bg(app.theme.background);
    frame.render_widget(Block::default().style(bg_style), area);

    // Layout: tab bar (2 rows) | content | status row (1 row)
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // tab bar + separator
            Constraint::Min(1),    // content area
            Constraint::Length(1), // status row
        ])
        .split(area);

    tab_bar::render_tab_bar(frame, app, chunks[0]);

    match app.view {
        View::Outline => outline_view::render_outline_view(frame, app, chunks[1]),
        View::Board => board_view::render_board_view(frame, app, chunks[1]),
    }

    // Modals render on top of the content
    match app.mode {
        Mode::Prompt => prompt_popup::render_prompt_popup(frame, app, chunks[1]),
        Mode::Confirm => confirm_popup::render_confirm_popup(frame, app, chunks[1]),
        Mode::Navigate => {}
    }

    if app.show_help {
        help_overlay::render_help_overlay(frame, app, frame.area());
    }

    status_row::render_status_row(frame, app, chunks[2]);
}

/// Adjust `scroll` so that `cursor` lies inside a window of `height` rows
pub(super) fn scroll_into_view(scroll: &mut usize, cursor: usize, height: usize) {
    if height == 0 {
        return;
    }
    if cursor < *scroll {
        *scroll = cursor;
    } else if cursor >= *scroll + height {
        *scroll = cursor + 1 - height;
    }
}

/// A rectangle of fixed size centered in `area`, clipped to it
pub(super) fn centered_rect_fixed(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    use super::test_helpers::{app_with_sample, render_to_string};

    #[test]
    fn full_frame_renders_each_view() {
        let (_dir, mut app) = app_with_sample();
        let out = render_to_string(120, 30, |frame, _| render(frame, &mut app));
        assert!(out.contains("Outline"));
        assert!(out.contains("B Beginning"));
        assert!(out.contains("1/4"));

        app.view = View::Board;
        let out = render_to_string(120, 30, |frame, _| render(frame, &mut app));
        assert!(out.contains("Subplot"));
        assert!(out.contains("ship wrecks"));
    }

    #[test]
    fn prompt_draws_over_content() {
        let (_dir, mut app) = app_with_sample();
        app.begin_add_child();
        let out = render_to_string(120, 30, |frame, _| render(frame, &mut app));
        assert!(out.contains("New chapter"));
        assert!(out.contains("editing"));
    }

    #[test]
    fn scroll_follows_cursor() {
        let mut scroll = 0;
        scroll_into_view(&mut scroll, 3, 5);
        assert_eq!(scroll, 0);
        scroll_into_view(&mut scroll, 7, 5);
        assert_eq!(scroll, 3);
        scroll_into_view(&mut scroll, 1, 5);
        assert_eq!(scroll, 1);
    }

    #[test]
    fn centered_rect_is_clipped() {
        let area = Rect::new(0, 0, 20, 10);
        assert_eq!(centered_rect_fixed(10, 4, area), Rect::new(5, 3, 10, 4));
        assert_eq!(centered_rect_fixed(30, 12, area), Rect::new(0, 0, 20, 10));
    }
}
