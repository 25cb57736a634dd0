use ratatui::Frame;
use ratatui::layout::{Position, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::tui::app::App;
use crate::util::unicode::{byte_offset_to_display_col, display_width, truncate_to_width};

const LABEL_WIDTH: usize = 11;

/// Render the title prompt, or the five-field milestone prompt
pub fn render_prompt_popup(frame: &mut Frame, app: &App, area: Rect) {
    let Some(prompt) = &app.prompt else {
        return;
    };

    let bg = app.theme.background;
    let header_style = Style::default()
        .fg(app.theme.highlight)
        .bg(bg)
        .add_modifier(Modifier::BOLD);
    let label_style = Style::default().fg(app.theme.dim).bg(bg);
    let focus_label = Style::default().fg(app.theme.highlight).bg(bg);
    let value_style = Style::default().fg(app.theme.text_bright).bg(bg);
    let dim_style = Style::default().fg(app.theme.dim).bg(bg);

    let popup_w: u16 = 60.min(area.width.saturating_sub(2));
    // inside the border, after the label
    let value_w = (popup_w as usize).saturating_sub(LABEL_WIDTH + 4);

    let mut lines: Vec<Line> = Vec::new();
    lines.push(Line::from(Span::styled(format!(" {}", prompt.heading), header_style)));
    lines.push(Line::from(""));

    let mut cursor_at: Option<(usize, usize)> = None;
    for (i, field) in prompt.fields.iter().enumerate() {
        let focused = i == prompt.focus;
        let cursor_col = byte_offset_to_display_col(&field.value, field.cursor);
        let (start, offset) = scroll_start(&field.value, cursor_col, value_w);
        if focused {
            cursor_at = Some((lines.len(), LABEL_WIDTH + 1 + cursor_col - offset));
        }
        let shown = truncate_to_width(&field.value[start..], value_w);
        lines.push(Line::from(vec![
            Span::styled(
                format!(" {:<width$} ", field.label, width = LABEL_WIDTH - 1),
                if focused { focus_label } else { label_style },
            ),
            Span::styled(shown, value_style),
        ]));
    }

    lines.push(Line::from(""));
    let hints = if prompt.is_milestone() {
        " Tab next field  Ctrl-S save  Esc cancel"
    } else {
        " Enter save  Esc cancel"
    };
    lines.push(Line::from(Span::styled(hints, dim_style)));

    let popup_h = (lines.len() as u16) + 2;
    let overlay_area = super::centered_rect_fixed(popup_w, popup_h, area);
    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.highlight).bg(bg))
        .style(Style::default().bg(bg));
    frame.render_widget(Paragraph::new(lines).block(block), overlay_area);

    if let Some((line, col)) = cursor_at {
        let x = overlay_area.x + 1 + col as u16;
        let y = overlay_area.y + 1 + line as u16;
        if x < overlay_area.right() && y < overlay_area.bottom() {
            frame.set_cursor_position(Position::new(x, y));
        }
    }
}

/// First byte to show, and its display column, so that the cursor column
/// stays inside `width`
fn scroll_start(value: &str, cursor_col: usize, width: usize) -> (usize, usize) {
    if cursor_col < width {
        return (0, 0);
    }
    let skip = cursor_col + 1 - width;
    for (idx, _) in value.char_indices() {
        let col = display_width(&value[..idx]);
        if col >= skip {
            return (idx, col);
        }
    }
    (value.len(), display_width(value))
}
