pub mod lock;
pub mod outline_io;
pub mod recovery;
pub mod settings_io;
pub mod state;
pub mod watcher;

use std::path::{Path, PathBuf};

/// Per-project directory for the lock, UI state and recovery log
pub fn data_dir(base: &Path) -> PathBuf {
    base.join(".vesper")
}
