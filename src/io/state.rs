use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::data_dir;

/// Persisted TUI state (written to .vesper/state.json)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UiState {
    /// Which view is showing ("outline" or "board")
    pub view: String,
    /// Id of the selected item
    #[serde(default)]
    pub selected: Option<String>,
    /// Ids of collapsed items
    #[serde(default)]
    pub collapsed: HashSet<String>,
}

fn state_path(base: &Path) -> PathBuf {
    data_dir(base).join("state.json")
}

pub fn read_ui_state(base: &Path) -> Option<UiState> {
    let content = fs::read_to_string(state_path(base)).ok()?;
    serde_json::from_str(&content).ok()
}

pub fn write_ui_state(base: &Path, state: &UiState) -> Result<(), std::io::Error> {
    let path = state_path(base);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(state)?;
    fs::write(&path, content)
}
