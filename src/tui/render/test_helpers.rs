use ratatui::Terminal;
use ratatui::backend::TestBackend;
use ratatui::layout::Rect;
use tempfile::TempDir;

use crate::io::outline_io::OutlineStore;
use crate::model::UiConfig;
use crate::model::outline::{ItemId, ItemKind, MilestoneNotes, Outline, OutlineItem};
use crate::tui::app::App;

pub const TERM_W: u16 = 80;
pub const TERM_H: u16 = 24;

/// Render into an in-memory buffer and return plain text (no styles).
pub fn render_to_string<F>(w: u16, h: u16, f: F) -> String
where
    F: FnOnce(&mut ratatui::Frame, Rect),
{
    let backend = TestBackend::new(w, h);
    let mut terminal = Terminal::new(backend).unwrap();
    terminal
        .draw(|frame| {
            let area = frame.area();
            f(frame, area);
        })
        .unwrap();

    let buf = terminal.backend().buffer().clone();
    let w = buf.area.width as usize;
    let lines: Vec<String> = buf
        .content
        .chunks(w)
        .map(|row| {
            let s: String = row.iter().map(|cell| cell.symbol()).collect();
            s.trim_end().to_string()
        })
        .collect();

    // Trim trailing blank lines
    let end = lines
        .iter()
        .rposition(|l| !l.is_empty())
        .map_or(0, |i| i + 1);
    lines[..end].join("\n")
}

fn item(id: &str, title: &str, kind: ItemKind, children: Vec<OutlineItem>) -> OutlineItem {
    OutlineItem {
        id: ItemId::from(id),
        title: title.into(),
        kind,
        children,
    }
}

/// Beginning > Arrival > Storm, then Middle
pub fn sample_outline() -> Outline {
    let storm = item(
        "m1",
        "Storm",
        ItemKind::Milestone(MilestoneNotes {
            plot: "ship wrecks".into(),
            ..Default::default()
        }),
        vec![],
    );
    let arrival = item("c1", "Arrival", ItemKind::Chapter, vec![storm]);
    Outline {
        items: vec![
            item("b1", "Beginning", ItemKind::Beat, vec![arrival]),
            item("b2", "Middle", ItemKind::Beat, vec![]),
        ],
    }
}

/// An App over `sample_outline()` whose store lives in a fresh temp dir.
/// Keep the TempDir alive for as long as the App.
pub fn app_with_sample() -> (TempDir, App) {
    let dir = TempDir::new().unwrap();
    let mut app = App::new(
        OutlineStore::new(dir.path()),
        sample_outline(),
        &UiConfig::default(),
    );
    app.jump_to_top();
    (dir, app)
}
