use std::fs;
use std::path::{Path, PathBuf};

use crate::model::config::Settings;

/// Directory holding user-wide settings, respecting VESPER_HOME
pub fn settings_dir() -> PathBuf {
    std::env::var("VESPER_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_home().join(".vesper"))
}

pub fn settings_path() -> PathBuf {
    settings_dir().join("settings.json")
}

fn dirs_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/"))
}

/// Read settings from a specific path.
/// A missing file gives defaults; a corrupt one is backed up as .bak first.
pub fn read_settings_from(path: &Path) -> Settings {
    if !path.exists() {
        return Settings::default();
    }

    match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<Settings>(&content) {
            Ok(settings) => settings,
            Err(e) => {
                let bak = path.with_extension("json.bak");
                let _ = fs::copy(path, &bak);
                eprintln!(
                    "warning: could not parse {} (backed up as {}): {}",
                    path.display(),
                    bak.display(),
                    e
                );
                Settings::default()
            }
        },
        Err(_) => Settings::default(),
    }
}

pub fn read_settings() -> Settings {
    read_settings_from(&settings_path())
}

pub fn write_settings_to(path: &Path, settings: &Settings) -> Result<(), std::io::Error> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(settings).map_err(std::io::Error::other)?;
    fs::write(path, content)
}

pub fn write_settings(settings: &Settings) -> Result<(), std::io::Error> {
    write_settings_to(&settings_path(), settings)
}

/// Record `dir` as the most recently opened project in a specific settings file.
pub fn remember_project_in(path: &Path, dir: &Path) -> Result<(), std::io::Error> {
    let mut settings = read_settings_from(path);
    let dir_str = dir.to_string_lossy().to_string();
    if settings.last_project.as_deref() == Some(dir_str.as_str()) {
        return Ok(());
    }
    settings.last_project = Some(dir_str);
    write_settings_to(path, &settings)
}

/// Record `dir` as the most recently opened project. Failures only warn.
pub fn remember_project(dir: &Path) {
    if let Err(e) = remember_project_in(&settings_path(), dir) {
        eprintln!("warning: could not update settings: {}", e);
    }
}

/// Pick the project directory: an explicit choice wins, then the remembered
/// project if it still exists, then `cwd`.
pub fn resolve_project_dir(explicit: Option<&Path>, settings: &Settings, cwd: &Path) -> PathBuf {
    if let Some(dir) = explicit {
        return dir.to_path_buf();
    }
    if let Some(last) = &settings.last_project {
        let last = PathBuf::from(last);
        if last.is_dir() {
            return last;
        }
    }
    cwd.to_path_buf()
}
