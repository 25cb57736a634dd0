mod init;
pub use init::cmd_init;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::lock::ProjectLock;
use crate::io::outline_io::{self, OutlineStore};
use crate::io::{recovery, settings_io};
use crate::model::outline::{Level, MilestoneNotes, Outline};
use crate::ops::board;
use crate::ops::outline_ops::{self, OutlineError};

type HandlerResult = Result<(), Box<dyn std::error::Error>>;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> HandlerResult {
    let json = cli.json;
    let Some(cmd) = cli.command else {
        return Ok(());
    };
    // Init runs before project resolution: its directory may not exist yet
    if let Commands::Init(args) = cmd {
        return cmd_init(args, cli.project_dir.as_deref());
    }
    let base = project_dir(cli.project_dir.as_deref())?;

    match cmd {
        Commands::Init(_) => Ok(()),

        // Read commands
        Commands::Tree => cmd_tree(&base, json),
        Commands::Board => cmd_board(&base, json),
        Commands::Show(args) => cmd_show(&base, args, json),

        // Write commands
        Commands::Add(args) => cmd_add(&base, args, json),
        Commands::Rename(args) => cmd_rename(&base, args),
        Commands::Notes(args) => cmd_notes(&base, args),
        Commands::Delete(args) => cmd_delete(&base, args),
        Commands::Indent(args) => cmd_move(&base, args, json, Move::Indent),
        Commands::Outdent(args) => cmd_move(&base, args, json, Move::Outdent),
        Commands::Up(args) => cmd_move(&base, args, json, Move::Up),
        Commands::Down(args) => cmd_move(&base, args, json, Move::Down),

        // Recovery log
        Commands::Recovery(args) => cmd_recovery(&base, args, json),
    }
}

/// Resolve the project directory: `-C`, then the remembered project, then cwd.
pub fn project_dir(explicit: Option<&str>) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let explicit = explicit
        .map(|dir| {
            std::fs::canonicalize(dir).map_err(|e| format!("cannot resolve -C path '{}': {}", dir, e))
        })
        .transpose()?;
    let settings = settings_io::read_settings();
    let cwd = std::env::current_dir()?;
    Ok(settings_io::resolve_project_dir(
        explicit.as_deref(),
        &settings,
        &cwd,
    ))
}

/// Open the outline at `base`. Unlike the TUI, the CLI refuses to invent a
/// project where none was initialized.
fn load_outline(store: &OutlineStore) -> Result<Outline, Box<dyn std::error::Error>> {
    if !store.path().exists() {
        return Err(format!(
            "no outline in {} (run `vesper init` first)",
            store.base().display()
        )
        .into());
    }
    Ok(store.load_or_seed())
}

/// Lock, load, apply `op`, save. Returns the saved outline and `op`'s value.
fn mutate<T>(
    base: &Path,
    op: impl FnOnce(&mut Outline) -> Result<T, OutlineError>,
) -> Result<(Outline, T), Box<dyn std::error::Error>> {
    let store = OutlineStore::new(base);
    let _lock = ProjectLock::for_write(base)?;
    let mut outline = load_outline(&store)?;
    let value = op(&mut outline)?;
    store.save(&outline)?;
    settings_io::remember_project(base);
    Ok((outline, value))
}

fn print_json<T: serde::Serialize>(value: &T) -> HandlerResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_tree(base: &Path, json: bool) -> HandlerResult {
    let outline = load_outline(&OutlineStore::new(base))?;
    if json {
        let items: Vec<ItemJson> = outline.items.iter().map(|i| item_to_json(i, 1)).collect();
        return print_json(&items);
    }
    for beat in &outline.items {
        for line in format_item_tree(beat, 0) {
            println!("{}", line);
        }
    }
    Ok(())
}

fn cmd_board(base: &Path, json: bool) -> HandlerResult {
    let outline = load_outline(&OutlineStore::new(base))?;
    let rows = board::rows(&outline);
    if json {
        return print_json(&rows);
    }
    for row in &rows {
        println!("{}", format_board_row(row));
    }
    Ok(())
}

fn cmd_show(base: &Path, args: IdArgs, json: bool) -> HandlerResult {
    let outline = load_outline(&OutlineStore::new(base))?;
    let item = outline
        .find(&args.id)
        .ok_or_else(|| OutlineError::NotFound(args.id.clone()))?;
    if json {
        let depth = outline.depth_of(&args.id).unwrap_or(1);
        return print_json(&item_to_json(item, depth));
    }
    for line in format_item_detail(item) {
        println!("{}", line);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

fn notes_from_fields(fields: &NoteFields, base: MilestoneNotes) -> MilestoneNotes {
    MilestoneNotes {
        plot: fields.plot.clone().unwrap_or(base.plot),
        subplot: fields.subplot.clone().unwrap_or(base.subplot),
        character: fields.character.clone().unwrap_or(base.character),
        theme: fields.theme.clone().unwrap_or(base.theme),
    }
}

fn cmd_add(base: &Path, args: AddArgs, json: bool) -> HandlerResult {
    let notes = notes_from_fields(&args.notes, MilestoneNotes::default());
    let (outline, id) = mutate(base, |outline| match (&args.under, &args.sibling_of) {
        (Some(parent), _) => outline_ops::add_child(outline, parent, &args.title, notes),
        (None, sibling) => {
            outline_ops::add_sibling(outline, sibling.as_deref(), &args.title, notes)
        }
    })?;

    let level = outline
        .find(id.as_str())
        .map(|item| item.level())
        .ok_or_else(|| OutlineError::NotFound(id.to_string()))?;
    if !args.notes.is_empty() && level != Level::Milestone {
        eprintln!("note: notes ignored, new item is a {}", level);
    }

    if json {
        return print_json(&CreatedJson {
            id: id.to_string(),
            kind: level,
        });
    }
    println!("{}", id);
    Ok(())
}

fn cmd_rename(base: &Path, args: RenameArgs) -> HandlerResult {
    mutate(base, |outline| outline_ops::rename(outline, &args.id, &args.title))?;
    println!("{} renamed", args.id);
    Ok(())
}

fn cmd_notes(base: &Path, args: NotesArgs) -> HandlerResult {
    if args.notes.is_empty() {
        return Err("nothing to set: pass --plot, --subplot, --character or --theme".into());
    }
    mutate(base, |outline| {
        let current = outline
            .find(&args.id)
            .ok_or_else(|| OutlineError::NotFound(args.id.clone()))?
            .notes()
            .cloned()
            .ok_or_else(|| OutlineError::NotAMilestone(args.id.clone()))?;
        outline_ops::set_notes(outline, &args.id, notes_from_fields(&args.notes, current))
    })?;
    println!("{} notes updated", args.id);
    Ok(())
}

fn cmd_delete(base: &Path, args: IdArgs) -> HandlerResult {
    let (_, removed) = mutate(base, |outline| outline_ops::delete(outline, &args.id))?;
    let body = outline_io::serialize_item(&removed)?;
    recovery::log_item_deletion(base, removed.id.as_str(), &removed.title, &body);

    let count = Outline {
        items: vec![removed],
    }
    .len();
    println!("{} deleted ({} item{})", args.id, count, if count == 1 { "" } else { "s" });
    Ok(())
}

#[derive(Clone, Copy)]
enum Move {
    Indent,
    Outdent,
    Up,
    Down,
}

impl Move {
    fn past_tense(self) -> &'static str {
        match self {
            Move::Indent => "indented",
            Move::Outdent => "outdented",
            Move::Up => "moved up",
            Move::Down => "moved down",
        }
    }
}

fn cmd_move(base: &Path, args: IdArgs, json: bool, mv: Move) -> HandlerResult {
    let (outline, ()) = mutate(base, |outline| match mv {
        Move::Indent => outline_ops::indent(outline, &args.id),
        Move::Outdent => outline_ops::outdent(outline, &args.id),
        Move::Up => outline_ops::move_up(outline, &args.id),
        Move::Down => outline_ops::move_down(outline, &args.id),
    })?;

    if json {
        let item = outline
            .find(&args.id)
            .ok_or_else(|| OutlineError::NotFound(args.id.clone()))?;
        let depth = outline.depth_of(&args.id).unwrap_or(1);
        return print_json(&item_to_json(item, depth));
    }
    println!("{} {}", args.id, mv.past_tense());
    Ok(())
}

// ---------------------------------------------------------------------------
// Recovery log
// ---------------------------------------------------------------------------

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, Box<dyn std::error::Error>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("invalid timestamp '{}': {}", s, e).into())
}

fn cmd_recovery(base: &Path, args: RecoveryCmd, json: bool) -> HandlerResult {
    match args.action {
        Some(RecoveryAction::Path) => {
            println!("{}", recovery::recovery_log_path(base).display());
            Ok(())
        }
        Some(RecoveryAction::Prune(prune)) => {
            let before = prune.before.as_deref().map(parse_timestamp).transpose()?;
            let removed = recovery::prune_recovery(base, before, prune.all)?;
            println!(
                "removed {} entr{}",
                removed,
                if removed == 1 { "y" } else { "ies" }
            );
            Ok(())
        }
        None => {
            let since = args.since.as_deref().map(parse_timestamp).transpose()?;
            let entries =
                recovery::read_recovery_entries(base, Some(args.limit.unwrap_or(10)), since);
            if json {
                let values: Vec<serde_json::Value> = entries.iter().map(|e| e.to_json()).collect();
                return print_json(&values);
            }
            if entries.is_empty() {
                println!("recovery log is empty");
                return Ok(());
            }
            for entry in &entries {
                print!("{}", entry.to_display_markdown());
            }
            Ok(())
        }
    }
}
