use std::path::{Path, PathBuf};

use crate::cli::commands::InitArgs;
use crate::io::lock::ProjectLock;
use crate::io::outline_io::OutlineStore;
use crate::io::settings_io;
use crate::model::outline::Outline;

/// Seed a new outline in the `-C` directory (or the current directory).
/// Init never falls back to the remembered project.
pub fn cmd_init(args: InitArgs, project_dir: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let dir = match project_dir {
        Some(dir) => PathBuf::from(dir),
        None => std::env::current_dir()?,
    };
    std::fs::create_dir_all(&dir)?;
    let dir = std::fs::canonicalize(&dir)?;

    let store = OutlineStore::new(&dir);
    if store.path().exists() && !args.force {
        return Err(format!(
            "outline already exists at {} (use --force to reseed)",
            store.path().display()
        )
        .into());
    }

    let _lock = ProjectLock::for_write(&dir)?;
    let outline = Outline::seeded();
    store.save(&outline)?;
    settings_io::remember_project(&dir);

    print_summary(&dir, &outline);
    Ok(())
}

fn print_summary(dir: &Path, outline: &Outline) {
    println!("Initialized outline in {}", dir.display());
    for beat in &outline.items {
        println!("  {} ({})", beat.title, beat.id);
    }
}
