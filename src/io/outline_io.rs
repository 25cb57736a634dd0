use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::io::recovery::{self, RecoveryCategory, RecoveryEntry};
use crate::model::outline::{
    ItemId, ItemKind, Level, MAX_DEPTH, MilestoneNotes, Outline, OutlineItem,
};

/// File name of the outline inside a project directory
pub const OUTLINE_FILE: &str = "outline.json";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("could not write {path}: {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not serialize outline: {0}")]
    SerializeError(#[from] serde_json::Error),
}

/// One node as stored on disk. Every field is optional on read so that
/// hand-edited or older documents still load.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
    /// Informational; recomputed from depth on load
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub children: Vec<ItemRecord>,
    #[serde(default)]
    pub plot: String,
    #[serde(default)]
    pub subplot: String,
    #[serde(default)]
    pub character: String,
    #[serde(default)]
    pub theme: String,
}

impl ItemRecord {
    pub fn from_item(item: &OutlineItem) -> Self {
        let notes = item.notes().cloned().unwrap_or_default();
        ItemRecord {
            id: Some(item.id.to_string()),
            title: item.title.clone(),
            kind: Some(item.level().as_str().to_string()),
            children: item.children.iter().map(ItemRecord::from_item).collect(),
            plot: notes.plot,
            subplot: notes.subplot,
            character: notes.character,
            theme: notes.theme,
        }
    }
}

/// What hydration had to repair while turning records into an outline
#[derive(Debug, Default)]
pub struct HydrateReport {
    /// Records that were missing an id or reused one
    pub regenerated_ids: usize,
    /// Records with a blank title, given a placeholder
    pub untitled: usize,
    /// Records nested past MAX_DEPTH, with their subtrees
    pub dropped: Vec<ItemRecord>,
}

/// Turn stored records into an outline, repairing what can be repaired.
/// Kinds are recomputed from depth; the stored `kind` is advisory only.
pub fn hydrate(records: Vec<ItemRecord>) -> (Outline, HydrateReport) {
    let mut seen = HashSet::new();
    let mut report = HydrateReport::default();
    let items = hydrate_list(records, 1, &mut seen, &mut report);
    (Outline { items }, report)
}

fn hydrate_list(
    records: Vec<ItemRecord>,
    depth: usize,
    seen: &mut HashSet<String>,
    report: &mut HydrateReport,
) -> Vec<OutlineItem> {
    let Some(level) = Level::from_depth(depth) else {
        report.dropped.extend(records);
        return Vec::new();
    };

    let mut items = Vec::with_capacity(records.len());
    for record in records {
        let id = match record.id.filter(|id| !id.is_empty()) {
            Some(id) if seen.insert(id.clone()) => ItemId::from(id),
            _ => {
                report.regenerated_ids += 1;
                let id = ItemId::generate();
                seen.insert(id.to_string());
                id
            }
        };
        let notes = MilestoneNotes {
            plot: record.plot,
            subplot: record.subplot,
            character: record.character,
            theme: record.theme,
        };
        let title = if record.title.trim().is_empty() {
            report.untitled += 1;
            format!("Untitled {}", level)
        } else {
            record.title
        };
        items.push(OutlineItem {
            id,
            title,
            kind: ItemKind::for_level(level, notes),
            children: hydrate_list(record.children, depth + 1, seen, report),
        });
    }
    items
}

/// Records for the whole outline, in document order
pub fn to_records(outline: &Outline) -> Vec<ItemRecord> {
    outline.items.iter().map(ItemRecord::from_item).collect()
}

/// Pretty JSON for the whole outline
pub fn serialize_outline(outline: &Outline) -> Result<String, serde_json::Error> {
    let mut json = serde_json::to_string_pretty(&to_records(outline))?;
    json.push('\n');
    Ok(json)
}

/// Pretty JSON for one subtree, used for recovery entries
pub fn serialize_item(item: &OutlineItem) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&ItemRecord::from_item(item))
}

/// Loads and saves the outline of one project directory
#[derive(Debug, Clone)]
pub struct OutlineStore {
    base: PathBuf,
}

impl OutlineStore {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        OutlineStore { base: base.into() }
    }

    /// The project directory this store writes into
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Always `<base>/outline.json`
    pub fn path(&self) -> PathBuf {
        self.base.join(OUTLINE_FILE)
    }

    /// Read the outline back. A missing file and an unreadable one are both
    /// `None`; unreadable content is copied to the recovery log first.
    pub fn load(&self) -> Option<Outline> {
        let bytes = match fs::read(self.path()) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                self.log_unreadable(e.to_string(), String::new());
                return None;
            }
        };
        let content = match String::from_utf8(bytes) {
            Ok(content) => content,
            Err(e) => {
                let body = String::from_utf8_lossy(e.as_bytes()).into_owned();
                self.log_unreadable(e.to_string(), body);
                return None;
            }
        };

        let records: Vec<ItemRecord> = match serde_json::from_str(&content) {
            Ok(records) => records,
            Err(e) => {
                self.log_unreadable(e.to_string(), content);
                return None;
            }
        };

        let (outline, report) = hydrate(records);
        if !report.dropped.is_empty() {
            let body = serde_json::to_string_pretty(&report.dropped).unwrap_or_default();
            recovery::log_recovery(
                &self.base,
                RecoveryEntry::now(
                    RecoveryCategory::Parser,
                    format!("dropped items nested deeper than {}", MAX_DEPTH),
                )
                .field("Source", OUTLINE_FILE)
                .field("Count", report.dropped.len().to_string())
                .body(body),
            );
        }
        Some(outline)
    }

    fn log_unreadable(&self, error: String, body: String) {
        recovery::log_recovery(
            &self.base,
            RecoveryEntry::now(RecoveryCategory::Parser, "unreadable outline")
                .field("Source", OUTLINE_FILE)
                .field("Error", error)
                .body(body),
        );
    }

    /// `load()`, or the three default beats when there is nothing usable
    pub fn load_or_seed(&self) -> Outline {
        self.load().unwrap_or_else(Outline::seeded)
    }

    /// Write the whole outline atomically. On failure the document is kept
    /// in the recovery log and the error is returned.
    pub fn save(&self, outline: &Outline) -> Result<(), StoreError> {
        let content = serialize_outline(outline)?;
        let path = self.path();
        if let Err(e) = recovery::atomic_write(&path, content.as_bytes()) {
            recovery::log_recovery(
                &self.base,
                RecoveryEntry::now(RecoveryCategory::Write, "outline write failed")
                    .field("Target", OUTLINE_FILE)
                    .field("Error", e.to_string())
                    .body(content),
            );
            return Err(StoreError::WriteError { path, source: e });
        }
        Ok(())
    }
}
