use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::model::outline::Level;
use crate::ops::board::BoardRow;
use crate::tui::app::App;
use crate::tui::wrap::wrap_to_lines;
use crate::util::unicode::fit_to_width;

use super::scroll_into_view;

/// Width of the outline label column
pub const LABEL_WIDTH: usize = 32;
/// Widest a note column gets
pub const NOTE_WIDTH: usize = 36;
/// Narrowest a note column gets before the grid is clipped on the right
pub const MIN_NOTE_WIDTH: usize = 10;

const HEADERS: [&str; 5] = ["Outline", "Plot", "Subplot", "Character", "Theme"];
const SEP: &str = " \u{2502} ";

/// Column widths for a given area width: the label column, then four notes
pub fn column_widths(width: usize) -> [usize; 5] {
    let seps = SEP.chars().count() * 4;
    let left = width.saturating_sub(LABEL_WIDTH + seps + 1);
    let note = (left / 4).clamp(MIN_NOTE_WIDTH, NOTE_WIDTH);
    [LABEL_WIDTH, note, note, note, note]
}

/// Wrap every cell of a row to its column. The label keeps its depth
/// indent on every line.
fn wrap_cells(row: &BoardRow, widths: &[usize; 5], lines: usize) -> Vec<Vec<String>> {
    let indent = "  ".repeat(row.depth.saturating_sub(1));
    let label: Vec<String> = wrap_to_lines(&row.title, widths[0].saturating_sub(indent.len()), lines)
        .into_iter()
        .map(|l| if l.is_empty() { l } else { format!("{indent}{l}") })
        .collect();
    let mut out = vec![label];
    for (text, w) in [&row.plot, &row.subplot, &row.character, &row.theme]
        .into_iter()
        .zip(&widths[1..])
    {
        out.push(wrap_to_lines(text, *w, lines));
    }
    out
}

/// Render the board: one fixed-height band per outline item
pub fn render_board_view(frame: &mut Frame, app: &mut App, area: Rect) {
    let bg = app.theme.background;
    let widths = column_widths(area.width as usize);
    let band = app.board_lines.max(1);
    // header + rule take two lines
    let visible = (area.height as usize).saturating_sub(2) / band;
    if let Some(row) = app.sync.row() {
        scroll_into_view(&mut app.board_scroll, row, visible);
    }

    let header_style = Style::default()
        .fg(app.theme.text_bright)
        .bg(bg)
        .add_modifier(Modifier::BOLD);
    let dim = Style::default().fg(app.theme.dim).bg(bg);

    let mut lines: Vec<Line> = Vec::new();
    let header: Vec<String> = HEADERS.iter().map(|h| h.to_string()).collect();
    lines.push(grid_line(&header, &widths, header_style, dim));
    let rule: Vec<String> = widths.iter().map(|w| "\u{2500}".repeat(*w)).collect();
    lines.push(Line::from(Span::styled(
        format!(" {}", rule.join("\u{2500}\u{253C}\u{2500}")),
        dim,
    )));

    for (i, row) in app.rows.iter().enumerate().skip(app.board_scroll).take(visible) {
        let selected = app.sync.row() == Some(i);
        let row_bg = if selected { app.theme.selection_bg } else { bg };
        let wrapped = wrap_cells(row, &widths, band);

        let label_style = Style::default()
            .fg(app.theme.level_color(row.level))
            .bg(row_bg)
            .add_modifier(if row.level == Level::Beat {
                Modifier::BOLD
            } else {
                Modifier::empty()
            });
        let text_style = Style::default()
            .fg(if selected {
                app.theme.text_bright
            } else {
                app.theme.text
            })
            .bg(row_bg);
        let sep_style = Style::default().fg(app.theme.dim).bg(row_bg);

        for line_no in 0..band {
            let mut spans = vec![Span::styled(" ", Style::default().bg(row_bg))];
            for (col, column) in wrapped.iter().enumerate() {
                if col > 0 {
                    spans.push(Span::styled(SEP, sep_style));
                }
                let text = column.get(line_no).map(String::as_str).unwrap_or("");
                let style = if col == 0 { label_style } else { text_style };
                spans.push(Span::styled(fit_to_width(text, widths[col]), style));
            }
            lines.push(Line::from(spans));
        }
    }

    frame.render_widget(Paragraph::new(lines).style(Style::default().bg(bg)), area);
}

fn grid_line<'a>(texts: &[String], widths: &[usize; 5], style: Style, sep: Style) -> Line<'a> {
    let mut spans = vec![Span::styled(" ", style)];
    for (col, (text, w)) in texts.iter().zip(widths.iter()).enumerate() {
        if col > 0 {
            spans.push(Span::styled(SEP, sep));
        }
        spans.push(Span::styled(fit_to_width(text, *w), style));
    }
    Line::from(spans)
}
