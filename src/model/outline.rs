use std::fmt;

use serde::{Deserialize, Serialize};

/// Deepest level an outline item may live at (1 = beat).
pub const MAX_DEPTH: usize = 3;

/// Titles used when an outline is created from scratch
pub const SEED_BEATS: [&str; 3] = ["Beginning", "Middle", "End"];

/// Stable identifier of an outline item. Assigned once, never reassigned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Generate a fresh random id
    pub fn generate() -> Self {
        ItemId(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        ItemId(s.to_string())
    }
}

impl From<String> for ItemId {
    fn from(s: String) -> Self {
        ItemId(s)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for ItemId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ItemId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// The level of an item, a pure function of its depth
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Beat,
    Chapter,
    Milestone,
}

impl Level {
    /// depth 1 → beat, 2 → chapter, 3 → milestone, anything else is undefined
    pub fn from_depth(depth: usize) -> Option<Level> {
        match depth {
            1 => Some(Level::Beat),
            2 => Some(Level::Chapter),
            3 => Some(Level::Milestone),
            _ => None,
        }
    }

    pub fn depth(self) -> usize {
        match self {
            Level::Beat => 1,
            Level::Chapter => 2,
            Level::Milestone => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Level::Beat => "beat",
            Level::Chapter => "chapter",
            Level::Milestone => "milestone",
        }
    }

    pub fn parse_level(s: &str) -> Option<Level> {
        match s {
            "beat" => Some(Level::Beat),
            "chapter" => Some(Level::Chapter),
            "milestone" => Some(Level::Milestone),
            _ => None,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Free-text story notes carried by milestones
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneNotes {
    pub plot: String,
    pub subplot: String,
    pub character: String,
    pub theme: String,
}

impl MilestoneNotes {
    pub fn is_empty(&self) -> bool {
        self.plot.is_empty()
            && self.subplot.is_empty()
            && self.character.is_empty()
            && self.theme.is_empty()
    }

    /// Strip trailing whitespace from every field
    pub fn trimmed(self) -> Self {
        MilestoneNotes {
            plot: self.plot.trim_end().to_string(),
            subplot: self.subplot.trim_end().to_string(),
            character: self.character.trim_end().to_string(),
            theme: self.theme.trim_end().to_string(),
        }
    }
}

/// What an item is. Only milestones carry notes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemKind {
    Beat,
    Chapter,
    Milestone(MilestoneNotes),
}

impl ItemKind {
    pub fn level(&self) -> Level {
        match self {
            ItemKind::Beat => Level::Beat,
            ItemKind::Chapter => Level::Chapter,
            ItemKind::Milestone(_) => Level::Milestone,
        }
    }

    /// Build the kind for `level`. Notes survive only on milestones.
    pub fn for_level(level: Level, notes: MilestoneNotes) -> ItemKind {
        match level {
            Level::Beat => ItemKind::Beat,
            Level::Chapter => ItemKind::Chapter,
            Level::Milestone => ItemKind::Milestone(notes),
        }
    }

    pub fn notes(&self) -> Option<&MilestoneNotes> {
        match self {
            ItemKind::Milestone(notes) => Some(notes),
            _ => None,
        }
    }
}

/// A node of the outline tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineItem {
    pub id: ItemId,
    pub title: String,
    pub kind: ItemKind,
    /// Children in document order
    pub children: Vec<OutlineItem>,
}

impl OutlineItem {
    /// Create a childless item with a fresh id
    pub fn new(title: impl Into<String>, level: Level, notes: MilestoneNotes) -> Self {
        OutlineItem {
            id: ItemId::generate(),
            title: title.into(),
            kind: ItemKind::for_level(level, notes),
            children: Vec::new(),
        }
    }

    pub fn level(&self) -> Level {
        self.kind.level()
    }

    pub fn notes(&self) -> Option<&MilestoneNotes> {
        self.kind.notes()
    }

    /// Number of levels in this subtree (1 for a leaf)
    pub fn height(&self) -> usize {
        1 + self.children.iter().map(|c| c.height()).max().unwrap_or(0)
    }

    /// Recompute kinds for this subtree as if it were attached at `depth`.
    /// Milestone notes are dropped from items that stop being milestones.
    /// Callers must check the subtree fits under MAX_DEPTH first.
    pub fn relevel(&mut self, depth: usize) {
        if let Some(level) = Level::from_depth(depth)
            && level != self.level()
        {
            let notes = match std::mem::replace(&mut self.kind, ItemKind::Beat) {
                ItemKind::Milestone(notes) => notes,
                _ => MilestoneNotes::default(),
            };
            self.kind = ItemKind::for_level(level, notes);
        }
        for child in &mut self.children {
            child.relevel(depth + 1);
        }
    }
}

/// The whole outline: the implicit root's ordered list of beats
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outline {
    pub items: Vec<OutlineItem>,
}

impl Outline {
    /// The default outline for a new project: three empty beats
    pub fn seeded() -> Self {
        Outline {
            items: SEED_BEATS
                .iter()
                .map(|title| OutlineItem::new(*title, Level::Beat, MilestoneNotes::default()))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of items at every depth
    pub fn len(&self) -> usize {
        let mut count = 0;
        self.for_each(&mut |_, _| count += 1);
        count
    }

    /// Find an item by id anywhere in the tree
    pub fn find(&self, id: &str) -> Option<&OutlineItem> {
        let path = self.path_of(id)?;
        self.get(&path)
    }

    /// Find an item by id, mutable
    pub fn find_mut(&mut self, id: &str) -> Option<&mut OutlineItem> {
        let path = self.path_of(id)?;
        self.get_mut(&path)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.path_of(id).is_some()
    }

    /// Index path from the root to the item (one index per depth)
    pub fn path_of(&self, id: &str) -> Option<Vec<usize>> {
        fn walk(items: &[OutlineItem], id: &str, path: &mut Vec<usize>) -> bool {
            for (i, item) in items.iter().enumerate() {
                path.push(i);
                if item.id == id || walk(&item.children, id, path) {
                    return true;
                }
                path.pop();
            }
            false
        }
        let mut path = Vec::new();
        walk(&self.items, id, &mut path).then_some(path)
    }

    /// Depth of the item (1 for top-level beats)
    pub fn depth_of(&self, id: &str) -> Option<usize> {
        self.path_of(id).map(|p| p.len())
    }

    /// Id of the item's parent, or None for top-level items
    pub fn parent_id(&self, id: &str) -> Option<ItemId> {
        let path = self.path_of(id)?;
        let parent_path = &path[..path.len() - 1];
        if parent_path.is_empty() {
            return None;
        }
        self.get(parent_path).map(|p| p.id.clone())
    }

    pub fn get(&self, path: &[usize]) -> Option<&OutlineItem> {
        let (first, rest) = path.split_first()?;
        let mut item = self.items.get(*first)?;
        for &i in rest {
            item = item.children.get(i)?;
        }
        Some(item)
    }

    pub fn get_mut(&mut self, path: &[usize]) -> Option<&mut OutlineItem> {
        let (first, rest) = path.split_first()?;
        let mut item = self.items.get_mut(*first)?;
        for &i in rest {
            item = item.children.get_mut(i)?;
        }
        Some(item)
    }

    /// The sibling list containing `path`'s last index
    pub fn siblings(&self, path: &[usize]) -> Option<&Vec<OutlineItem>> {
        match path.split_last() {
            Some((_, [])) => Some(&self.items),
            Some((_, parent)) => self.get(parent).map(|p| &p.children),
            None => None,
        }
    }

    /// Children list of the item with `parent` id, or the root list for None
    pub fn children_mut(&mut self, parent: Option<&str>) -> Option<&mut Vec<OutlineItem>> {
        match parent {
            None => Some(&mut self.items),
            Some(id) => self.find_mut(id).map(|p| &mut p.children),
        }
    }

    /// Detach the subtree at `path` and hand back ownership of it
    pub fn remove_at(&mut self, path: &[usize]) -> Option<OutlineItem> {
        let (&last, parent) = path.split_last()?;
        let list = if parent.is_empty() {
            &mut self.items
        } else {
            &mut self.get_mut(parent)?.children
        };
        (last < list.len()).then(|| list.remove(last))
    }

    /// Visit every item in document order along with its depth
    pub fn for_each(&self, f: &mut dyn FnMut(&OutlineItem, usize)) {
        fn walk(items: &[OutlineItem], depth: usize, f: &mut dyn FnMut(&OutlineItem, usize)) {
            for item in items {
                f(item, depth);
                walk(&item.children, depth + 1, f);
            }
        }
        walk(&self.items, 1, f);
    }

    /// All ids in document order
    pub fn ids(&self) -> Vec<ItemId> {
        let mut ids = Vec::new();
        self.for_each(&mut |item, _| ids.push(item.id.clone()));
        ids
    }
}
