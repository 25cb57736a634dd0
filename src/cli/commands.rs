use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "vesper", about = concat!("vesper v", env!("CARGO_PKG_VERSION"), " - story outliner"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Run against a different project directory
    #[arg(short = 'C', long = "project-dir", global = true)]
    pub project_dir: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create outline.json with the default beats
    Init(InitArgs),
    /// Print the outline as a tree
    Tree,
    /// Print the board (every item with its milestone notes)
    Board,
    /// Show one item and its subtree
    Show(IdArgs),
    /// Add an item (top-level beat unless --under or --sibling-of is given)
    Add(AddArgs),
    /// Change an item's title
    Rename(RenameArgs),
    /// Set milestone notes
    Notes(NotesArgs),
    /// Delete an item and everything under it
    Delete(IdArgs),
    /// Make an item the last child of its previous sibling
    Indent(IdArgs),
    /// Move an item up one level, right after its parent
    Outdent(IdArgs),
    /// Move an item up (hops into the previous parent when first)
    Up(IdArgs),
    /// Move an item down (hops into the next parent when last)
    Down(IdArgs),
    /// View or manage the recovery log
    Recovery(RecoveryCmd),
}

#[derive(Args)]
pub struct InitArgs {
    /// Overwrite an existing outline.json
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct IdArgs {
    /// Item ID
    pub id: String,
}

/// Milestone note fields shared by `add` and `notes`
#[derive(Args, Default)]
pub struct NoteFields {
    #[arg(long)]
    pub plot: Option<String>,
    #[arg(long)]
    pub subplot: Option<String>,
    #[arg(long)]
    pub character: Option<String>,
    #[arg(long)]
    pub theme: Option<String>,
}

impl NoteFields {
    pub fn is_empty(&self) -> bool {
        self.plot.is_none()
            && self.subplot.is_none()
            && self.character.is_none()
            && self.theme.is_none()
    }
}

#[derive(Args)]
pub struct AddArgs {
    /// Title of the new item
    pub title: String,
    /// Add as the last child of this item
    #[arg(long, conflicts_with = "sibling_of")]
    pub under: Option<String>,
    /// Add as the last sibling of this item
    #[arg(long)]
    pub sibling_of: Option<String>,
    #[command(flatten)]
    pub notes: NoteFields,
}

#[derive(Args)]
pub struct RenameArgs {
    /// Item ID
    pub id: String,
    /// New title
    pub title: String,
}

#[derive(Args)]
pub struct NotesArgs {
    /// Milestone ID
    pub id: String,
    #[command(flatten)]
    pub notes: NoteFields,
}

// ---------------------------------------------------------------------------
// Recovery log
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct RecoveryCmd {
    #[command(subcommand)]
    pub action: Option<RecoveryAction>,
    /// Maximum number of entries to show (default: 10)
    #[arg(long)]
    pub limit: Option<usize>,
    /// Show entries after this timestamp (ISO-8601)
    #[arg(long)]
    pub since: Option<String>,
}

#[derive(Subcommand)]
pub enum RecoveryAction {
    /// Remove old entries
    Prune(RecoveryPruneArgs),
    /// Print the absolute path to the recovery log
    Path,
}

#[derive(Args)]
pub struct RecoveryPruneArgs {
    /// Remove entries older than this timestamp (default: 30 days ago)
    #[arg(long)]
    pub before: Option<String>,
    /// Remove all entries
    #[arg(long)]
    pub all: bool,
}
