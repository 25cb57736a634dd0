use std::collections::HashSet;
use std::io;
use std::path::Path;
use std::time::Duration;

use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use crate::io::lock::ProjectLock;
use crate::io::outline_io::{self, OutlineStore};
use crate::io::recovery;
use crate::io::settings_io;
use crate::io::watcher::OutlineWatcher;
use crate::model::UiConfig;
use crate::model::outline::{ItemId, Level, MilestoneNotes, Outline};
use crate::ops::board::{self, BoardRow, BoardSync};
use crate::ops::outline_ops::{self, OutlineError};
use crate::util::unicode;

use super::input;
use super::render;
use super::theme::Theme;

/// Wrapped lines per board row unless settings say otherwise
pub const DEFAULT_BOARD_LINES: usize = 3;

/// Which view is currently displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Outline,
    Board,
}

impl View {
    fn as_str(self) -> &'static str {
        match self {
            View::Outline => "outline",
            View::Board => "board",
        }
    }
}

/// Current interaction mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Navigate,
    Prompt,
    Confirm,
}

/// What a prompt does once confirmed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptAction {
    AddSibling { selected: Option<ItemId> },
    AddChild { parent: ItemId },
    Edit { id: ItemId },
}

/// One single-line input field of a prompt
#[derive(Debug, Clone)]
pub struct PromptField {
    pub label: &'static str,
    pub value: String,
    /// Byte offset of the cursor in `value`
    pub cursor: usize,
}

impl PromptField {
    fn new(label: &'static str, value: impl Into<String>) -> Self {
        let value = value.into();
        let cursor = value.len();
        PromptField {
            label,
            value,
            cursor,
        }
    }

    pub fn insert(&mut self, c: char) {
        self.value.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    pub fn backspace(&mut self) {
        if let Some(prev) = unicode::prev_grapheme_boundary(&self.value, self.cursor) {
            self.value.replace_range(prev..self.cursor, "");
            self.cursor = prev;
        }
    }

    pub fn delete(&mut self) {
        if let Some(next) = unicode::next_grapheme_boundary(&self.value, self.cursor) {
            self.value.replace_range(self.cursor..next, "");
        }
    }

    pub fn left(&mut self) {
        if let Some(prev) = unicode::prev_grapheme_boundary(&self.value, self.cursor) {
            self.cursor = prev;
        }
    }

    pub fn right(&mut self) {
        if let Some(next) = unicode::next_grapheme_boundary(&self.value, self.cursor) {
            self.cursor = next;
        }
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.value.len();
    }
}

/// A pending text prompt. Milestones get the title plus four note fields.
#[derive(Debug, Clone)]
pub struct PromptState {
    pub action: PromptAction,
    pub heading: String,
    pub fields: Vec<PromptField>,
    pub focus: usize,
}

impl PromptState {
    fn new(action: PromptAction, heading: String, level: Level, title: &str, notes: &MilestoneNotes) -> Self {
        let mut fields = vec![PromptField::new("Title", title)];
        if level == Level::Milestone {
            fields.push(PromptField::new("Plot", notes.plot.as_str()));
            fields.push(PromptField::new("Subplot", notes.subplot.as_str()));
            fields.push(PromptField::new("Character", notes.character.as_str()));
            fields.push(PromptField::new("Theme", notes.theme.as_str()));
        }
        PromptState {
            action,
            heading,
            fields,
            focus: 0,
        }
    }

    pub fn is_milestone(&self) -> bool {
        self.fields.len() > 1
    }

    pub fn focused_mut(&mut self) -> Option<&mut PromptField> {
        self.fields.get_mut(self.focus)
    }

    pub fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % self.fields.len();
    }

    pub fn focus_prev(&mut self) {
        self.focus = (self.focus + self.fields.len() - 1) % self.fields.len();
    }

    fn value(&self, index: usize) -> String {
        self.fields
            .get(index)
            .map(|f| f.value.clone())
            .unwrap_or_default()
    }

    fn notes(&self) -> MilestoneNotes {
        MilestoneNotes {
            plot: self.value(1),
            subplot: self.value(2),
            character: self.value(3),
            theme: self.value(4),
        }
    }
}

/// A pending delete waiting for y/n
#[derive(Debug, Clone)]
pub struct ConfirmState {
    pub id: ItemId,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
}

/// A visible row of the outline tree view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeRow {
    pub id: ItemId,
    pub depth: usize,
    pub has_children: bool,
    pub is_expanded: bool,
    /// For drawing tree guides: whether each ancestor is the last sibling
    pub ancestor_last: Vec<bool>,
    pub is_last_sibling: bool,
}

/// Main application state
pub struct App {
    pub store: OutlineStore,
    pub outline: Outline,
    /// Board projection, rebuilt after every change
    pub rows: Vec<BoardRow>,
    pub sync: BoardSync,
    pub view: View,
    pub mode: Mode,
    pub collapsed: HashSet<String>,
    pub prompt: Option<PromptState>,
    pub confirm: Option<ConfirmState>,
    pub status: Option<StatusMessage>,
    pub show_help: bool,
    pub should_quit: bool,
    pub theme: Theme,
    pub board_lines: usize,
    pub outline_scroll: usize,
    pub board_scroll: usize,
    /// The file changed on disk while a prompt or confirm was open
    pub pending_reload: bool,
}

impl App {
    pub fn new(store: OutlineStore, outline: Outline, ui: &UiConfig) -> Self {
        let mut app = App {
            store,
            outline,
            rows: Vec::new(),
            sync: BoardSync::default(),
            view: View::Outline,
            mode: Mode::Navigate,
            collapsed: HashSet::new(),
            prompt: None,
            confirm: None,
            status: None,
            show_help: false,
            should_quit: false,
            theme: Theme::from_config(ui),
            board_lines: ui.board_lines.unwrap_or(DEFAULT_BOARD_LINES).max(1),
            outline_scroll: 0,
            board_scroll: 0,
            pending_reload: false,
        };
        app.refresh();
        app
    }

    pub fn selected_id(&self) -> Option<&ItemId> {
        self.sync.selected()
    }

    /// Rebuild the board rows and keep the selection on the same item
    pub fn refresh(&mut self) {
        self.rows = board::rows(&self.outline);
        self.sync.refresh(&self.rows);
        let live: HashSet<String> = self.rows.iter().map(|r| r.id.to_string()).collect();
        self.collapsed.retain(|id| live.contains(id));
        self.keep_selection_visible();
    }

    /// If the selection sits under a collapsed item, move it to the
    /// outermost collapsed ancestor, which is the row the tree shows.
    fn keep_selection_visible(&mut self) {
        let Some(id) = self.selected_id().cloned() else {
            return;
        };
        let mut ancestors = Vec::new();
        let mut parent = self.outline.parent_id(id.as_str());
        while let Some(p) = parent {
            parent = self.outline.parent_id(p.as_str());
            ancestors.push(p);
        }
        if let Some(shown) = ancestors
            .iter()
            .rev()
            .find(|a| self.collapsed.contains(a.as_str()))
        {
            self.sync.select_node(&self.rows, shown.as_str());
        }
    }

    /// Select an item by id, expanding its ancestors so the tree shows it
    pub fn select(&mut self, id: &str) {
        let mut parent = self.outline.parent_id(id);
        while let Some(p) = parent {
            self.collapsed.remove(p.as_str());
            parent = self.outline.parent_id(p.as_str());
        }
        self.sync.select_node(&self.rows, id);
    }

    pub fn set_status(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            is_error: false,
        });
    }

    pub fn set_error(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            is_error: true,
        });
    }

    // -----------------------------------------------------------------------
    // Tree view rows
    // -----------------------------------------------------------------------

    /// Rows of the tree view, skipping children of collapsed items
    pub fn tree_rows(&self) -> Vec<TreeRow> {
        fn walk(
            items: &[crate::model::outline::OutlineItem],
            depth: usize,
            collapsed: &HashSet<String>,
            ancestor_last: &[bool],
            out: &mut Vec<TreeRow>,
        ) {
            let count = items.len();
            for (i, item) in items.iter().enumerate() {
                let is_last = i + 1 == count;
                let has_children = !item.children.is_empty();
                let is_expanded = has_children && !collapsed.contains(item.id.as_str());
                out.push(TreeRow {
                    id: item.id.clone(),
                    depth,
                    has_children,
                    is_expanded,
                    ancestor_last: ancestor_last.to_vec(),
                    is_last_sibling: is_last,
                });
                if is_expanded {
                    let mut next = ancestor_last.to_vec();
                    next.push(is_last);
                    walk(&item.children, depth + 1, collapsed, &next, out);
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.outline.items, 1, &self.collapsed, &[], &mut out);
        out
    }

    /// Cursor position in the tree view
    pub fn tree_cursor(&self, rows: &[TreeRow]) -> Option<usize> {
        let id = self.selected_id()?;
        rows.iter().position(|r| &r.id == id)
    }

    /// Move the cursor by `delta` rows in the current view
    pub fn move_cursor(&mut self, delta: isize) {
        match self.view {
            View::Outline => {
                let rows = self.tree_rows();
                if rows.is_empty() {
                    return;
                }
                let current = self.tree_cursor(&rows).unwrap_or(0);
                let next = current.saturating_add_signed(delta).min(rows.len() - 1);
                let id = rows[next].id.clone();
                self.sync.select_node(&self.rows, id.as_str());
            }
            View::Board => {
                if self.rows.is_empty() {
                    return;
                }
                let current = self.sync.row().unwrap_or(0);
                let next = current.saturating_add_signed(delta).min(self.rows.len() - 1);
                self.sync.select_row(&self.rows, next);
            }
        }
    }

    pub fn jump_to_top(&mut self) {
        if let Some(first) = self.rows.first().map(|r| r.id.clone()) {
            self.sync.select_node(&self.rows, first.as_str());
        }
    }

    pub fn jump_to_bottom(&mut self) {
        let last = match self.view {
            View::Outline => self.tree_rows().last().map(|r| r.id.clone()),
            View::Board => self.rows.last().map(|r| r.id.clone()),
        };
        if let Some(id) = last {
            self.sync.select_node(&self.rows, id.as_str());
        }
    }

    /// Collapse the selected item, or step out to its parent
    pub fn collapse_or_parent(&mut self) {
        let Some(id) = self.selected_id().cloned() else {
            return;
        };
        let has_children = self
            .outline
            .find(id.as_str())
            .is_some_and(|i| !i.children.is_empty());
        if has_children && !self.collapsed.contains(id.as_str()) {
            self.collapsed.insert(id.to_string());
        } else if let Some(parent) = self.outline.parent_id(id.as_str()) {
            self.sync.select_node(&self.rows, parent.as_str());
        }
    }

    pub fn expand(&mut self) {
        if let Some(id) = self.selected_id() {
            let id = id.to_string();
            self.collapsed.remove(&id);
        }
    }

    pub fn expand_all(&mut self) {
        self.collapsed.clear();
    }

    pub fn collapse_all(&mut self) {
        let mut ids = HashSet::new();
        self.outline.for_each(&mut |item, _| {
            if !item.children.is_empty() {
                ids.insert(item.id.to_string());
            }
        });
        self.collapsed = ids;
        self.keep_selection_visible();
    }

    pub fn toggle_view(&mut self) {
        self.view = match self.view {
            View::Outline => View::Board,
            View::Board => View::Outline,
        };
    }

    // -----------------------------------------------------------------------
    // Commands that open a prompt or confirm dialog
    // -----------------------------------------------------------------------

    pub fn begin_add_sibling(&mut self) {
        let selected = self.selected_id().cloned();
        match outline_ops::sibling_level(&self.outline, selected.as_ref().map(ItemId::as_str)) {
            Ok(level) => self.open_prompt(
                PromptAction::AddSibling { selected },
                format!("New {}", level),
                level,
                "",
                &MilestoneNotes::default(),
            ),
            Err(e) => self.set_error(e.to_string()),
        }
    }

    pub fn begin_add_child(&mut self) {
        let Some(parent) = self.selected_id().cloned() else {
            self.set_error("nothing selected");
            return;
        };
        match outline_ops::child_level(&self.outline, parent.as_str()) {
            Ok(level) => self.open_prompt(
                PromptAction::AddChild { parent },
                format!("New {}", level),
                level,
                "",
                &MilestoneNotes::default(),
            ),
            Err(e) => self.set_error(e.to_string()),
        }
    }

    /// Rename the selection; milestones also get their notes to edit
    pub fn begin_edit(&mut self) {
        let Some(id) = self.selected_id().cloned() else {
            return;
        };
        let Some(item) = self.outline.find(id.as_str()) else {
            return;
        };
        let level = item.level();
        let title = item.title.clone();
        let notes = item.notes().cloned().unwrap_or_default();
        let heading = match level {
            Level::Milestone => "Edit milestone".to_string(),
            _ => format!("Rename {}", level),
        };
        self.open_prompt(PromptAction::Edit { id }, heading, level, &title, &notes);
    }

    fn open_prompt(
        &mut self,
        action: PromptAction,
        heading: String,
        level: Level,
        title: &str,
        notes: &MilestoneNotes,
    ) {
        self.prompt = Some(PromptState::new(action, heading, level, title, notes));
        self.mode = Mode::Prompt;
    }

    pub fn cancel_prompt(&mut self) {
        self.prompt = None;
        self.mode = Mode::Navigate;
    }

    /// Apply the pending prompt. An empty title leaves the outline as it was.
    pub fn confirm_prompt(&mut self) {
        let Some(prompt) = self.prompt.take() else {
            return;
        };
        self.mode = Mode::Navigate;
        let title = prompt.value(0);
        let notes = prompt.notes();
        let is_milestone = prompt.is_milestone();

        self.apply(|outline| match &prompt.action {
            PromptAction::AddSibling { selected } => outline_ops::add_sibling(
                outline,
                selected.as_ref().map(ItemId::as_str),
                &title,
                notes,
            ),
            PromptAction::AddChild { parent } => {
                outline_ops::add_child(outline, parent.as_str(), &title, notes)
            }
            PromptAction::Edit { id } => {
                outline_ops::rename(outline, id.as_str(), &title)?;
                if is_milestone {
                    outline_ops::set_notes(outline, id.as_str(), notes)?;
                }
                Ok(id.clone())
            }
        });
    }

    pub fn begin_delete(&mut self) {
        let Some(id) = self.selected_id().cloned() else {
            return;
        };
        let Some(item) = self.outline.find(id.as_str()) else {
            return;
        };
        let below = Outline {
            items: item.children.clone(),
        }
        .len();
        let message = if below == 0 {
            format!("Delete {} \"{}\"?", item.level(), item.title)
        } else {
            format!(
                "Delete {} \"{}\" and {} item{} under it?",
                item.level(),
                item.title,
                below,
                if below == 1 { "" } else { "s" }
            )
        };
        self.confirm = Some(ConfirmState { id, message });
        self.mode = Mode::Confirm;
    }

    pub fn cancel_confirm(&mut self) {
        self.confirm = None;
        self.mode = Mode::Navigate;
    }

    pub fn confirm_delete(&mut self) {
        let Some(confirm) = self.confirm.take() else {
            return;
        };
        self.mode = Mode::Navigate;
        self.catch_up();
        match outline_ops::delete(&mut self.outline, confirm.id.as_str()) {
            Ok(removed) => {
                if let Ok(body) = outline_io::serialize_item(&removed) {
                    recovery::log_item_deletion(
                        self.store.base(),
                        removed.id.as_str(),
                        &removed.title,
                        &body,
                    );
                }
                self.refresh();
                if self.save() {
                    self.set_status(format!("deleted \"{}\"", removed.title));
                }
            }
            Err(e) => self.set_error(e.to_string()),
        }
    }

    // -----------------------------------------------------------------------
    // Structural moves
    // -----------------------------------------------------------------------

    pub fn indent(&mut self) {
        self.move_selected(outline_ops::indent);
    }

    pub fn outdent(&mut self) {
        self.move_selected(outline_ops::outdent);
    }

    pub fn move_up(&mut self) {
        self.move_selected(outline_ops::move_up);
    }

    pub fn move_down(&mut self) {
        self.move_selected(outline_ops::move_down);
    }

    fn move_selected(&mut self, op: fn(&mut Outline, &str) -> Result<(), OutlineError>) {
        let Some(id) = self.selected_id().cloned() else {
            return;
        };
        self.apply(|outline| op(outline, id.as_str()).map(|()| id.clone()));
    }

    /// Run one outline operation: on success rebuild, reselect by id and save;
    /// on failure show the notice and leave everything as it was.
    fn apply(&mut self, op: impl FnOnce(&mut Outline) -> Result<ItemId, OutlineError>) {
        self.catch_up();
        match op(&mut self.outline) {
            Ok(id) => {
                self.refresh();
                self.select(id.as_str());
                self.save();
            }
            Err(e) => self.set_error(e.to_string()),
        }
    }

    /// Save under the project lock. The edit stays in memory either way;
    /// returns false (with an error in the status row) if it did not land.
    fn save(&mut self) -> bool {
        let result = ProjectLock::acquire(self.store.base(), Duration::from_secs(2))
            .map_err(|e| e.to_string())
            .and_then(|_lock| self.store.save(&self.outline).map_err(|e| e.to_string()));
        match result {
            Ok(()) => true,
            Err(e) => {
                self.set_error(format!("save failed: {}", e));
                false
            }
        }
    }

    /// Apply a reload that was held back while a prompt or confirm was open,
    /// so the next save does not write over it.
    pub fn catch_up(&mut self) {
        if self.pending_reload {
            self.pending_reload = false;
            self.reload_from_disk();
        }
    }

    /// Pick up a change written by another process
    pub fn reload_from_disk(&mut self) {
        let Some(outline) = self.store.load() else {
            return;
        };
        if outline == self.outline {
            return;
        }
        self.outline = outline;
        self.refresh();
        self.set_status("outline reloaded (changed on disk)");
    }
}

// ---------------------------------------------------------------------------
// UI state persistence
// ---------------------------------------------------------------------------

/// Restore view, selection and collapsed items from .vesper/state.json
pub fn restore_ui_state(app: &mut App) {
    use crate::io::state::read_ui_state;

    let Some(ui_state) = read_ui_state(app.store.base()) else {
        return;
    };
    app.view = match ui_state.view.as_str() {
        "board" => View::Board,
        _ => View::Outline,
    };
    app.collapsed = ui_state.collapsed;
    app.refresh();
    if let Some(id) = ui_state.selected
        && app.outline.contains(&id)
    {
        app.sync.select_node(&app.rows, &id);
    }
}

/// Save UI state to .vesper/state.json
pub fn save_ui_state(app: &App) {
    use crate::io::state::{UiState, write_ui_state};

    let ui_state = UiState {
        view: app.view.as_str().to_string(),
        selected: app.selected_id().map(|id| id.to_string()),
        collapsed: app.collapsed.clone(),
    };
    let _ = write_ui_state(app.store.base(), &ui_state);
}

// ---------------------------------------------------------------------------
// Terminal setup and event loop
// ---------------------------------------------------------------------------

fn open_app(base: &Path) -> App {
    let settings = settings_io::read_settings();
    let store = OutlineStore::new(base);
    let existed = store.path().exists();
    let outline = store.load_or_seed();
    let mut app = App::new(store, outline, &settings.ui);
    if !existed {
        // a fresh project starts on disk right away
        app.save();
    }
    restore_ui_state(&mut app);
    if app.selected_id().is_none() {
        app.jump_to_top();
    }
    app
}

/// Run the TUI application
pub fn run(project_dir: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let base = crate::cli::handlers::project_dir(project_dir)?;
    let mut app = open_app(&base);
    settings_io::remember_project(&base);

    // Not fatal: the TUI still works, it just won't see outside edits
    let watcher = OutlineWatcher::start(&base).ok();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Install panic hook to restore terminal on panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let result = run_event_loop(&mut terminal, &mut app, watcher.as_ref());

    save_ui_state(&app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    watcher: Option<&OutlineWatcher>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut save_counter = 0u32;
    loop {
        terminal.draw(|frame| render::render(frame, app))?;

        if event::poll(Duration::from_millis(250))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            input::handle_key(app, key);
            // Debounced state save: every ~5 key presses
            save_counter += 1;
            if save_counter >= 5 {
                save_ui_state(app);
                save_counter = 0;
            }
        }

        if let Some(watcher) = watcher
            && !watcher.poll().is_empty()
        {
            app.pending_reload = true;
        }
        // External edits wait until no prompt or confirm is pending
        if app.mode == Mode::Navigate {
            app.catch_up();
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::outline::{ItemKind, OutlineItem};
    use tempfile::TempDir;

    fn item(id: &str, title: &str, level: Level, children: Vec<OutlineItem>) -> OutlineItem {
        OutlineItem {
            id: ItemId::from(id),
            title: title.into(),
            kind: ItemKind::for_level(level, MilestoneNotes::default()),
            children,
        }
    }

    fn sample() -> Outline {
        Outline {
            items: vec![
                item(
                    "b1",
                    "Beginning",
                    Level::Beat,
                    vec![item(
                        "c1",
                        "Arrival",
                        Level::Chapter,
                        vec![item("m1", "Storm", Level::Milestone, vec![])],
                    )],
                ),
                item("b2", "Middle", Level::Beat, vec![]),
            ],
        }
    }

    fn app_in(dir: &TempDir) -> App {
        let mut app = App::new(
            OutlineStore::new(dir.path()),
            sample(),
            &UiConfig::default(),
        );
        app.jump_to_top();
        app
    }

    fn type_text(app: &mut App, text: &str) {
        if let Some(field) = app.prompt.as_mut().and_then(|p| p.focused_mut()) {
            for c in text.chars() {
                field.insert(c);
            }
        }
    }

    #[test]
    fn tree_rows_respect_collapse() {
        let dir = TempDir::new().unwrap();
        let mut app = app_in(&dir);
        assert_eq!(app.tree_rows().len(), 4);
        app.collapsed.insert("c1".into());
        let ids: Vec<String> = app.tree_rows().iter().map(|r| r.id.to_string()).collect();
        assert_eq!(ids, vec!["b1", "c1", "b2"]);
    }

    #[test]
    fn cursor_moves_by_visible_rows() {
        let dir = TempDir::new().unwrap();
        let mut app = app_in(&dir);
        app.collapsed.insert("b1".into());
        app.move_cursor(1);
        assert_eq!(app.selected_id().map(ItemId::as_str), Some("b2"));
        app.move_cursor(5);
        assert_eq!(app.selected_id().map(ItemId::as_str), Some("b2"));
        app.move_cursor(-9);
        assert_eq!(app.selected_id().map(ItemId::as_str), Some("b1"));
    }

    #[test]
    fn board_cursor_keeps_tree_selection_in_sync() {
        let dir = TempDir::new().unwrap();
        let mut app = app_in(&dir);
        app.view = View::Board;
        app.move_cursor(2);
        assert_eq!(app.sync.row(), Some(2));
        app.view = View::Outline;
        let rows = app.tree_rows();
        assert_eq!(app.tree_cursor(&rows), Some(2));
    }

    #[test]
    fn add_child_prompt_saves_and_selects() {
        let dir = TempDir::new().unwrap();
        let mut app = app_in(&dir);
        app.begin_add_child();
        assert_eq!(app.mode, Mode::Prompt);
        assert_eq!(app.prompt.as_ref().map(|p| p.heading.as_str()), Some("New chapter"));
        type_text(&mut app, "Departure");
        app.confirm_prompt();

        assert_eq!(app.mode, Mode::Navigate);
        let selected = app.selected_id().cloned().unwrap();
        assert_eq!(app.outline.find(selected.as_str()).unwrap().title, "Departure");
        let saved = OutlineStore::new(dir.path()).load().unwrap();
        assert_eq!(saved, app.outline);
    }

    #[test]
    fn add_child_under_milestone_shows_notice() {
        let dir = TempDir::new().unwrap();
        let mut app = app_in(&dir);
        app.select("m1");
        app.begin_add_child();
        assert_eq!(app.mode, Mode::Navigate);
        assert!(app.prompt.is_none());
        assert!(app.status.as_ref().is_some_and(|s| s.is_error));
    }

    #[test]
    fn milestone_prompt_has_note_fields() {
        let dir = TempDir::new().unwrap();
        let mut app = app_in(&dir);
        app.select("m1");
        app.begin_edit();
        let prompt = app.prompt.as_mut().unwrap();
        assert!(prompt.is_milestone());
        assert_eq!(prompt.fields[0].value, "Storm");
        prompt.focus_next();
        type_text(&mut app, "the mast breaks");
        app.confirm_prompt();

        let m1 = app.outline.find("m1").unwrap();
        assert_eq!(m1.notes().map(|n| n.plot.as_str()), Some("the mast breaks"));
    }

    #[test]
    fn cancelled_prompt_leaves_outline_untouched() {
        let dir = TempDir::new().unwrap();
        let mut app = app_in(&dir);
        let before = app.outline.clone();
        app.begin_add_sibling();
        type_text(&mut app, "Nope");
        app.cancel_prompt();
        assert_eq!(app.outline, before);
        assert!(!dir.path().join("outline.json").exists());
    }

    #[test]
    fn empty_title_is_a_notice() {
        let dir = TempDir::new().unwrap();
        let mut app = app_in(&dir);
        let before = app.outline.clone();
        app.begin_edit();
        if let Some(field) = app.prompt.as_mut().and_then(|p| p.focused_mut()) {
            field.value.clear();
            field.cursor = 0;
        }
        app.confirm_prompt();
        assert_eq!(app.outline, before);
        assert!(app.status.as_ref().is_some_and(|s| s.is_error));
    }

    #[test]
    fn moves_keep_selection_on_item() {
        let dir = TempDir::new().unwrap();
        let mut app = app_in(&dir);
        app.select("c1");
        app.outdent();
        assert_eq!(app.selected_id().map(ItemId::as_str), Some("c1"));
        assert_eq!(app.outline.depth_of("c1"), Some(1));
        assert_eq!(app.sync.row(), Some(1));

        app.move_up();
        assert!(app.status.as_ref().is_none());
        app.move_up();
        assert_eq!(
            app.status.as_ref().map(|s| s.text.as_str()),
            Some("cannot move any further")
        );
    }

    #[test]
    fn delete_logs_subtree_to_recovery() {
        let dir = TempDir::new().unwrap();
        let mut app = app_in(&dir);
        app.select("c1");
        app.begin_delete();
        assert_eq!(app.mode, Mode::Confirm);
        assert!(
            app.confirm
                .as_ref()
                .is_some_and(|c| c.message.contains("1 item under it"))
        );
        app.confirm_delete();

        assert!(!app.outline.contains("c1"));
        assert!(!app.outline.contains("m1"));
        let entries = recovery::read_recovery_entries(dir.path(), None, None);
        assert_eq!(entries.len(), 1);
        assert!(entries[0].body.contains("Storm"));
    }

    #[test]
    fn collapse_then_step_to_parent() {
        let dir = TempDir::new().unwrap();
        let mut app = app_in(&dir);
        app.select("c1");
        app.collapse_or_parent();
        assert!(app.collapsed.contains("c1"));
        app.collapse_or_parent();
        assert_eq!(app.selected_id().map(ItemId::as_str), Some("b1"));
        app.expand_all();
        assert!(app.collapsed.is_empty());
    }

    #[test]
    fn ui_state_round_trip() {
        let dir = TempDir::new().unwrap();
        let mut app = app_in(&dir);
        app.select("m1");
        app.view = View::Board;
        app.collapsed.insert("b1".into());
        save_ui_state(&app);

        let mut restored = app_in(&dir);
        restore_ui_state(&mut restored);
        assert_eq!(restored.view, View::Board);
        assert_eq!(restored.selected_id().map(ItemId::as_str), Some("m1"));
        assert!(restored.collapsed.contains("b1"));
    }

    #[test]
    fn reload_picks_up_external_change() {
        let dir = TempDir::new().unwrap();
        let mut app = app_in(&dir);
        let mut changed = sample();
        changed.items[1].title = "Second Act".into();
        OutlineStore::new(dir.path()).save(&changed).unwrap();

        app.reload_from_disk();
        assert_eq!(app.outline.find("b2").unwrap().title, "Second Act");
        assert!(app.status.is_some());
    }

    #[test]
    fn change_during_prompt_is_merged_before_save() {
        let dir = TempDir::new().unwrap();
        let mut app = app_in(&dir);
        app.select("b1");
        app.begin_add_child();
        assert_eq!(app.mode, Mode::Prompt);

        let mut changed = sample();
        changed.items[1].title = "Second Act".into();
        OutlineStore::new(dir.path()).save(&changed).unwrap();
        app.pending_reload = true;

        type_text(&mut app, "Departure");
        app.confirm_prompt();

        assert!(!app.pending_reload);
        let saved = OutlineStore::new(dir.path()).load().unwrap();
        assert_eq!(saved.find("b2").unwrap().title, "Second Act");
        assert_eq!(saved.items[0].children.len(), 2);
        assert_eq!(saved, app.outline);
    }

    #[test]
    fn change_during_confirm_is_merged_before_delete() {
        let dir = TempDir::new().unwrap();
        let mut app = app_in(&dir);
        app.select("m1");
        app.begin_delete();

        let mut changed = sample();
        changed.items[1].title = "Second Act".into();
        OutlineStore::new(dir.path()).save(&changed).unwrap();
        app.pending_reload = true;
        app.confirm_delete();

        let saved = OutlineStore::new(dir.path()).load().unwrap();
        assert!(!saved.contains("m1"));
        assert_eq!(saved.find("b2").unwrap().title, "Second Act");
    }

    #[test]
    fn delete_never_lands_selection_under_collapsed_item() {
        let dir = TempDir::new().unwrap();
        let mut app = App::new(
            OutlineStore::new(dir.path()),
            Outline {
                items: vec![
                    item(
                        "b1",
                        "Beginning",
                        Level::Beat,
                        vec![item("c1", "Arrival", Level::Chapter, vec![])],
                    ),
                    item("b2", "Middle", Level::Beat, vec![]),
                ],
            },
            &UiConfig::default(),
        );
        app.collapsed.insert("b1".into());
        app.select("b2");

        // the last board row is now c1, hidden under b1
        app.begin_delete();
        app.confirm_delete();

        assert_eq!(app.selected_id().map(ItemId::as_str), Some("b1"));
        let rows = app.tree_rows();
        assert_eq!(app.tree_cursor(&rows), Some(0));
    }

    #[test]
    fn prompt_field_editing() {
        let mut field = PromptField::new("Title", "ab");
        field.left();
        field.insert('x');
        assert_eq!(field.value, "axb");
        field.backspace();
        field.home();
        field.delete();
        assert_eq!(field.value, "b");
        field.end();
        field.insert('!');
        assert_eq!(field.value, "b!");
    }
}
