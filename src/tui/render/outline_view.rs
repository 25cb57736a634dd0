use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::model::outline::Level;
use crate::tui::app::{App, TreeRow};
use crate::util::unicode::{display_width, truncate_to_width};

use super::scroll_into_view;

/// Render the outline as a collapsible tree
pub fn render_outline_view(frame: &mut Frame, app: &mut App, area: Rect) {
    let rows = app.tree_rows();
    let cursor = app.tree_cursor(&rows);
    let height = area.height as usize;
    if let Some(cursor) = cursor {
        scroll_into_view(&mut app.outline_scroll, cursor, height);
    }

    let bg = app.theme.background;
    let width = area.width as usize;
    let mut lines: Vec<Line> = Vec::new();

    if rows.is_empty() {
        lines.push(Line::from(Span::styled(
            " empty outline: press a to add a beat",
            Style::default().fg(app.theme.dim).bg(bg),
        )));
    }

    for (i, row) in rows.iter().enumerate().skip(app.outline_scroll).take(height) {
        lines.push(tree_line(app, row, cursor == Some(i), width));
    }

    frame.render_widget(Paragraph::new(lines).style(Style::default().bg(bg)), area);
}

fn tree_line<'a>(app: &App, row: &TreeRow, selected: bool, width: usize) -> Line<'a> {
    let bg = if selected {
        app.theme.selection_bg
    } else {
        app.theme.background
    };
    let dim = Style::default().fg(app.theme.dim).bg(bg);

    // Guides for each ancestor, then the branch into this row
    let mut guide = String::from(" ");
    for &last in row.ancestor_last.iter().skip(1) {
        guide.push_str(if last { "   " } else { "\u{2502}  " });
    }
    if row.depth > 1 {
        guide.push_str(if row.is_last_sibling {
            "\u{2514}\u{2500} "
        } else {
            "\u{251C}\u{2500} "
        });
    }

    let expander = match (row.has_children, row.is_expanded) {
        (true, true) => "\u{25BE} ",
        (true, false) => "\u{25B8} ",
        (false, _) => "  ",
    };

    let Some(item) = app.outline.find(row.id.as_str()) else {
        return Line::from("");
    };
    let level = item.level();
    let marker = match level {
        Level::Beat => "B",
        Level::Chapter => "C",
        Level::Milestone => "M",
    };

    let mut title_style = Style::default()
        .fg(if selected {
            app.theme.text_bright
        } else {
            app.theme.text
        })
        .bg(bg);
    if level == Level::Beat {
        title_style = title_style.add_modifier(Modifier::BOLD);
    }

    let prefix_width = display_width(&guide) + display_width(expander) + 2;
    let mut spans = vec![
        Span::styled(guide, dim),
        Span::styled(expander.to_string(), dim),
        Span::styled(
            format!("{} ", marker),
            Style::default().fg(app.theme.level_color(level)).bg(bg),
        ),
    ];

    let title = truncate_to_width(&item.title, width.saturating_sub(prefix_width));
    let mut used = prefix_width + display_width(&title);
    spans.push(Span::styled(title, title_style));

    // Collapsed milestones and chapters show a hint of what is inside
    if row.has_children && !row.is_expanded {
        let count = crate::model::outline::Outline {
            items: item.children.clone(),
        }
        .len();
        let hint = format!("  (+{})", count);
        if used + display_width(&hint) <= width {
            used += display_width(&hint);
            spans.push(Span::styled(hint, dim));
        }
    } else if let Some(notes) = item.notes()
        && !notes.plot.is_empty()
        && used + 4 < width
    {
        let preview = truncate_to_width(&notes.plot, width - used - 3);
        used += 3 + display_width(&preview);
        spans.push(Span::styled(format!("   {}", preview), dim));
    }

    if selected && used < width {
        spans.push(Span::styled(" ".repeat(width - used), Style::default().bg(bg)));
    }
    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::render::test_helpers::{TERM_H, TERM_W, app_with_sample, render_to_string};

    #[test]
    fn draws_tree_with_guides() {
        let (_dir, mut app) = app_with_sample();
        let out = render_to_string(TERM_W, TERM_H, |frame, area| {
            render_outline_view(frame, &mut app, area)
        });
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines[0].contains("\u{25BE} B Beginning"));
        assert!(lines[1].contains("\u{2514}\u{2500} \u{25BE} C Arrival"));
        assert!(lines[2].contains("M Storm"));
        assert!(lines[2].contains("ship wrecks"));
        assert!(lines[3].contains("B Middle"));
    }

    #[test]
    fn collapsed_item_hides_children() {
        let (_dir, mut app) = app_with_sample();
        app.collapsed.insert("b1".into());
        let out = render_to_string(TERM_W, TERM_H, |frame, area| {
            render_outline_view(frame, &mut app, area)
        });
        assert!(out.contains("\u{25B8} B Beginning  (+2)"));
        assert!(!out.contains("Arrival"));
    }

    #[test]
    fn scrolls_to_keep_cursor_visible() {
        let (_dir, mut app) = app_with_sample();
        app.select("b2");
        let out = render_to_string(TERM_W, 2, |frame, area| {
            render_outline_view(frame, &mut app, area)
        });
        assert_eq!(app.outline_scroll, 2);
        assert!(out.contains("Middle"));
        assert!(!out.contains("Beginning"));
    }
}
