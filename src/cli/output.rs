use serde::Serialize;

use crate::model::outline::{Level, MilestoneNotes, OutlineItem};
use crate::ops::board::BoardRow;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct ItemJson {
    pub id: String,
    pub title: String,
    pub kind: Level,
    pub depth: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<MilestoneNotes>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ItemJson>,
}

#[derive(Serialize)]
pub struct CreatedJson {
    pub id: String,
    pub kind: Level,
}

pub fn item_to_json(item: &OutlineItem, depth: usize) -> ItemJson {
    ItemJson {
        id: item.id.to_string(),
        title: item.title.clone(),
        kind: item.level(),
        depth,
        notes: item.notes().cloned(),
        children: item
            .children
            .iter()
            .map(|c| item_to_json(c, depth + 1))
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

/// Format a single item as a one-line summary
pub fn format_item_line(item: &OutlineItem) -> String {
    format!("[{}] {} ({})", level_char(item.level()), item.title, item.id)
}

fn level_char(level: Level) -> char {
    match level {
        Level::Beat => 'B',
        Level::Chapter => 'C',
        Level::Milestone => 'M',
    }
}

/// Format an item with its children, indented
pub fn format_item_tree(item: &OutlineItem, indent: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let prefix = "  ".repeat(indent);
    lines.push(format!("{}{}", prefix, format_item_line(item)));
    for child in &item.children {
        lines.extend(format_item_tree(child, indent + 1));
    }
    lines
}

/// Format detailed item view: header, notes, then the subtree
pub fn format_item_detail(item: &OutlineItem) -> Vec<String> {
    let mut lines = vec![format_item_line(item)];
    lines.push(format!("kind: {}", item.level()));
    if let Some(notes) = item.notes() {
        for (label, value) in note_fields(notes) {
            if !value.is_empty() {
                lines.push(format!("{}: {}", label, value));
            }
        }
    }
    if !item.children.is_empty() {
        lines.push(String::new());
        for child in &item.children {
            lines.extend(format_item_tree(child, 1));
        }
    }
    lines
}

fn note_fields(notes: &MilestoneNotes) -> [(&'static str, &str); 4] {
    [
        ("plot", notes.plot.as_str()),
        ("subplot", notes.subplot.as_str()),
        ("character", notes.character.as_str()),
        ("theme", notes.theme.as_str()),
    ]
}

/// Format one board row as tab-separated columns
pub fn format_board_row(row: &BoardRow) -> String {
    let label = format!("{}{}", "  ".repeat(row.depth - 1), row.title);
    [
        row.id.as_str(),
        label.as_str(),
        row.plot.as_str(),
        row.subplot.as_str(),
        row.character.as_str(),
        row.theme.as_str(),
    ]
    .iter()
    .map(|cell| cell.replace(['\t', '\n'], " "))
    .collect::<Vec<_>>()
    .join("\t")
}
