use serde::Serialize;

use crate::model::outline::{ItemId, Level, Outline};

/// One row of the board: an outline item plus its milestone notes.
/// Notes are blank for beats and chapters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardRow {
    pub id: ItemId,
    pub depth: usize,
    pub level: Level,
    pub title: String,
    pub plot: String,
    pub subplot: String,
    pub character: String,
    pub theme: String,
}

/// Flatten the outline into board rows, in document order
pub fn rows(outline: &Outline) -> Vec<BoardRow> {
    let mut rows = Vec::new();
    outline.for_each(&mut |item, depth| {
        let notes = item.notes().cloned().unwrap_or_default();
        rows.push(BoardRow {
            id: item.id.clone(),
            depth,
            level: item.level(),
            title: item.title.clone(),
            plot: notes.plot,
            subplot: notes.subplot,
            character: notes.character,
            theme: notes.theme,
        });
    });
    rows
}

pub fn row_index_of(rows: &[BoardRow], id: &str) -> Option<usize> {
    rows.iter().position(|r| r.id == id)
}

pub fn id_at(rows: &[BoardRow], index: usize) -> Option<&ItemId> {
    rows.get(index).map(|r| &r.id)
}

/// Keeps the tree selection and the highlighted board row pointing at the
/// same item. Selecting what is already selected changes nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardSync {
    selected: Option<ItemId>,
    row: Option<usize>,
}

impl BoardSync {
    pub fn selected(&self) -> Option<&ItemId> {
        self.selected.as_ref()
    }

    pub fn row(&self) -> Option<usize> {
        self.row
    }

    /// Select a tree item. Returns true if anything changed.
    pub fn select_node(&mut self, rows: &[BoardRow], id: &str) -> bool {
        let row = row_index_of(rows, id);
        if row.is_none() {
            return false;
        }
        if self.selected.as_ref().is_some_and(|s| s == id) && self.row == row {
            return false;
        }
        self.selected = Some(ItemId::from(id));
        self.row = row;
        true
    }

    /// Select a board row. Returns true if anything changed.
    pub fn select_row(&mut self, rows: &[BoardRow], index: usize) -> bool {
        let Some(id) = id_at(rows, index) else {
            return false;
        };
        if self.row == Some(index) && self.selected.as_ref() == Some(id) {
            return false;
        }
        self.selected = Some(id.clone());
        self.row = Some(index);
        true
    }

    /// Re-derive the row after the rows were rebuilt. If the selected item is
    /// gone, fall back to the row at the old index (clamped), or nothing.
    pub fn refresh(&mut self, rows: &[BoardRow]) {
        if let Some(id) = &self.selected
            && let Some(row) = row_index_of(rows, id.as_str())
        {
            self.row = Some(row);
            return;
        }
        if rows.is_empty() {
            self.selected = None;
            self.row = None;
            return;
        }
        let index = self.row.unwrap_or(0).min(rows.len() - 1);
        self.row = Some(index);
        self.selected = Some(rows[index].id.clone());
    }
}
