use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::tui::app::App;

/// Render the y/n delete confirmation
pub fn render_confirm_popup(frame: &mut Frame, app: &App, area: Rect) {
    let Some(confirm) = &app.confirm else {
        return;
    };

    let bg = app.theme.background;
    let red = app.theme.red;
    let text_style = Style::default().fg(app.theme.text_bright).bg(bg);
    let key_style = Style::default()
        .fg(app.theme.highlight)
        .bg(bg)
        .add_modifier(Modifier::BOLD);
    let dim_style = Style::default().fg(app.theme.dim).bg(bg);

    let lines = vec![
        Line::from(Span::styled(format!(" {}", confirm.message), text_style)),
        Line::from(""),
        Line::from(vec![
            Span::styled(" ", dim_style),
            Span::styled("y", key_style),
            Span::styled(" delete  ", dim_style),
            Span::styled("n", key_style),
            Span::styled(" keep", dim_style),
        ]),
    ];

    let popup_w: u16 = 50.min(area.width.saturating_sub(2));
    let inner_w = popup_w.saturating_sub(2).max(1) as usize;
    let message_rows = (confirm.message.chars().count() + 1).div_ceil(inner_w);
    let popup_h = (message_rows + 2 + 2) as u16;
    let overlay_area = super::centered_rect_fixed(popup_w, popup_h, area);
    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(red).bg(bg))
        .style(Style::default().bg(bg));
    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, overlay_area);
}
