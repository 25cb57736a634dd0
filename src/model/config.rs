use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// User settings from `~/.vesper/settings.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Most recently opened project directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_project: Option<String>,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UiConfig {
    /// Theme overrides, e.g. `"highlight": "#FB4196"`
    #[serde(default)]
    pub colors: HashMap<String, String>,
    /// Lines shown per board row (defaults to 3 when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub board_lines: Option<usize>,
}
