use crate::model::outline::{
    ItemId, ItemKind, Level, MAX_DEPTH, MilestoneNotes, Outline, OutlineItem,
};

/// Error type for structural outline operations.
/// Every variant means the outline was left untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OutlineError {
    #[error("title cannot be empty")]
    EmptyTitle,
    #[error("item not found: {0}")]
    NotFound(String),
    #[error("cannot go deeper: maximum depth ({}) reached", MAX_DEPTH)]
    MaxDepth,
    #[error("only milestones have notes: {0}")]
    NotAMilestone(String),
    #[error("nothing above to indent under")]
    NoPreviousSibling,
    #[error("already at top level")]
    AlreadyTopLevel,
    #[error("cannot move any further")]
    AtBoundary,
}

/// Where a relocated subtree lands in its new sibling list
enum Slot {
    First,
    Last,
    At(usize),
}

fn clean_title(title: &str) -> Result<String, OutlineError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(OutlineError::EmptyTitle);
    }
    Ok(title.to_string())
}

fn path_or_missing(outline: &Outline, id: &str) -> Result<Vec<usize>, OutlineError> {
    outline
        .path_of(id)
        .ok_or_else(|| OutlineError::NotFound(id.to_string()))
}

/// Relevel `item` for `depth` and insert it under `parent` (None = top level).
fn reattach(
    outline: &mut Outline,
    parent: Option<&ItemId>,
    slot: Slot,
    mut item: OutlineItem,
    depth: usize,
) -> Result<(), OutlineError> {
    item.relevel(depth);
    let list = outline
        .children_mut(parent.map(ItemId::as_str))
        .ok_or_else(|| OutlineError::NotFound(parent.map(|p| p.to_string()).unwrap_or_default()))?;
    match slot {
        Slot::First => list.insert(0, item),
        Slot::Last => list.push(item),
        Slot::At(i) => {
            let i = i.min(list.len());
            list.insert(i, item);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Adding, renaming, deleting
// ---------------------------------------------------------------------------

/// Level a new child of `parent_id` would get, or MaxDepth
pub fn child_level(outline: &Outline, parent_id: &str) -> Result<Level, OutlineError> {
    let depth = outline
        .depth_of(parent_id)
        .ok_or_else(|| OutlineError::NotFound(parent_id.to_string()))?;
    Level::from_depth(depth + 1).ok_or(OutlineError::MaxDepth)
}

/// Level a new sibling of `selected` would get (a beat when nothing is selected)
pub fn sibling_level(outline: &Outline, selected: Option<&str>) -> Result<Level, OutlineError> {
    let depth = match selected {
        None => 1,
        Some(id) => outline
            .depth_of(id)
            .ok_or_else(|| OutlineError::NotFound(id.to_string()))?,
    };
    Level::from_depth(depth).ok_or(OutlineError::MaxDepth)
}

/// Append a new item as the last child of the selected item's parent.
/// With no selection the item becomes a new top-level beat.
/// `notes` are kept only if the new item is a milestone.
pub fn add_sibling(
    outline: &mut Outline,
    selected: Option<&str>,
    title: &str,
    notes: MilestoneNotes,
) -> Result<ItemId, OutlineError> {
    let level = sibling_level(outline, selected)?;
    let title = clean_title(title)?;
    let parent = selected.and_then(|id| outline.parent_id(id));

    let item = OutlineItem::new(title, level, notes.trimmed());
    let id = item.id.clone();
    reattach(outline, parent.as_ref(), Slot::Last, item, level.depth())?;
    Ok(id)
}

/// Append a new item as the last child of `parent_id`.
pub fn add_child(
    outline: &mut Outline,
    parent_id: &str,
    title: &str,
    notes: MilestoneNotes,
) -> Result<ItemId, OutlineError> {
    let level = child_level(outline, parent_id)?;
    let title = clean_title(title)?;

    let item = OutlineItem::new(title, level, notes.trimmed());
    let id = item.id.clone();
    let parent = ItemId::from(parent_id);
    reattach(outline, Some(&parent), Slot::Last, item, level.depth())?;
    Ok(id)
}

pub fn rename(outline: &mut Outline, id: &str, title: &str) -> Result<(), OutlineError> {
    let title = clean_title(title)?;
    let item = outline
        .find_mut(id)
        .ok_or_else(|| OutlineError::NotFound(id.to_string()))?;
    item.title = title;
    Ok(())
}

/// Replace a milestone's notes
pub fn set_notes(outline: &mut Outline, id: &str, notes: MilestoneNotes) -> Result<(), OutlineError> {
    let item = outline
        .find_mut(id)
        .ok_or_else(|| OutlineError::NotFound(id.to_string()))?;
    match &mut item.kind {
        ItemKind::Milestone(current) => {
            *current = notes.trimmed();
            Ok(())
        }
        _ => Err(OutlineError::NotAMilestone(id.to_string())),
    }
}

/// Remove an item and its whole subtree. Returns what was removed.
pub fn delete(outline: &mut Outline, id: &str) -> Result<OutlineItem, OutlineError> {
    let path = path_or_missing(outline, id)?;
    outline
        .remove_at(&path)
        .ok_or_else(|| OutlineError::NotFound(id.to_string()))
}

// ---------------------------------------------------------------------------
// Structural moves
// ---------------------------------------------------------------------------

/// Make the item the last child of its previous sibling.
pub fn indent(outline: &mut Outline, id: &str) -> Result<(), OutlineError> {
    let path = path_or_missing(outline, id)?;
    let index = path[path.len() - 1];
    if index == 0 {
        return Err(OutlineError::NoPreviousSibling);
    }
    let new_depth = path.len() + 1;
    let (prev_id, height) = {
        let siblings = outline
            .siblings(&path)
            .ok_or_else(|| OutlineError::NotFound(id.to_string()))?;
        (siblings[index - 1].id.clone(), siblings[index].height())
    };
    if new_depth + height - 1 > MAX_DEPTH {
        return Err(OutlineError::MaxDepth);
    }

    let item = outline
        .remove_at(&path)
        .ok_or_else(|| OutlineError::NotFound(id.to_string()))?;
    reattach(outline, Some(&prev_id), Slot::Last, item, new_depth)
}

/// Make the item a child of its grandparent, placed right after its former parent.
pub fn outdent(outline: &mut Outline, id: &str) -> Result<(), OutlineError> {
    let path = path_or_missing(outline, id)?;
    if path.len() < 2 {
        return Err(OutlineError::AlreadyTopLevel);
    }
    let parent_id = outline
        .parent_id(id)
        .ok_or_else(|| OutlineError::NotFound(id.to_string()))?;
    let grandparent = outline.parent_id(parent_id.as_str());

    let item = outline
        .remove_at(&path)
        .ok_or_else(|| OutlineError::NotFound(id.to_string()))?;
    let parent_index = outline
        .path_of(parent_id.as_str())
        .and_then(|p| p.last().copied())
        .unwrap_or(0);
    reattach(
        outline,
        grandparent.as_ref(),
        Slot::At(parent_index + 1),
        item,
        path.len() - 1,
    )
}

/// Swap with the previous sibling, or hop to the end of the parent's previous sibling.
pub fn move_up(outline: &mut Outline, id: &str) -> Result<(), OutlineError> {
    let path = path_or_missing(outline, id)?;
    let index = path[path.len() - 1];
    let parent = outline.parent_id(id);

    if index > 0 {
        let list = outline
            .children_mut(parent.as_ref().map(ItemId::as_str))
            .ok_or_else(|| OutlineError::NotFound(id.to_string()))?;
        list.swap(index - 1, index);
        return Ok(());
    }

    let Some(parent_id) = parent else {
        return Err(OutlineError::AtBoundary);
    };
    let parent_path = &path[..path.len() - 1];
    let parent_index = parent_path[parent_path.len() - 1];
    if parent_index == 0 {
        return Err(OutlineError::AtBoundary);
    }
    let target = outline
        .siblings(parent_path)
        .map(|s| s[parent_index - 1].id.clone())
        .ok_or_else(|| OutlineError::NotFound(parent_id.to_string()))?;

    let item = outline
        .remove_at(&path)
        .ok_or_else(|| OutlineError::NotFound(id.to_string()))?;
    reattach(outline, Some(&target), Slot::Last, item, path.len())
}

/// Swap with the next sibling, or hop to the start of the parent's next sibling.
pub fn move_down(outline: &mut Outline, id: &str) -> Result<(), OutlineError> {
    let path = path_or_missing(outline, id)?;
    let index = path[path.len() - 1];
    let parent = outline.parent_id(id);
    let sibling_count = outline.siblings(&path).map(|s| s.len()).unwrap_or(0);

    if index + 1 < sibling_count {
        let list = outline
            .children_mut(parent.as_ref().map(ItemId::as_str))
            .ok_or_else(|| OutlineError::NotFound(id.to_string()))?;
        list.swap(index, index + 1);
        return Ok(());
    }

    if parent.is_none() {
        return Err(OutlineError::AtBoundary);
    }
    let parent_path = &path[..path.len() - 1];
    let parent_index = parent_path[parent_path.len() - 1];
    let target = outline
        .siblings(parent_path)
        .and_then(|s| s.get(parent_index + 1))
        .map(|uncle| uncle.id.clone());
    let Some(target) = target else {
        return Err(OutlineError::AtBoundary);
    };

    let item = outline
        .remove_at(&path)
        .ok_or_else(|| OutlineError::NotFound(id.to_string()))?;
    reattach(outline, Some(&target), Slot::First, item, path.len())
}
