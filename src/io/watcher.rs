use std::path::{Path, PathBuf};
use std::sync::mpsc;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use super::outline_io::OUTLINE_FILE;

/// Events sent from the file watcher to the TUI event loop.
#[derive(Debug)]
pub enum FileEvent {
    /// outline.json changed on disk
    OutlineChanged,
}

/// Watches a project directory for changes to outline.json made by other processes.
pub struct OutlineWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::Receiver<FileEvent>,
}

impl OutlineWatcher {
    /// Start watching `base`. Call `poll()` each tick.
    pub fn start(base: &Path) -> Result<Self, notify::Error> {
        let (tx, rx) = mpsc::channel();
        let target: PathBuf = base.join(OUTLINE_FILE);

        let mut watcher = RecommendedWatcher::new(
            move |result: Result<Event, notify::Error>| {
                let Ok(event) = result else {
                    return;
                };
                match event.kind {
                    EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => {}
                    _ => return,
                }
                // Atomic saves show up as a rename onto outline.json
                if event
                    .paths
                    .iter()
                    .any(|p| p.file_name() == target.file_name() && p.parent() == target.parent())
                {
                    let _ = tx.send(FileEvent::OutlineChanged);
                }
            },
            Config::default(),
        )?;

        watcher.watch(base, RecursiveMode::NonRecursive)?;
        Ok(OutlineWatcher {
            _watcher: watcher,
            rx,
        })
    }

    /// Non-blocking poll; drains every queued event.
    pub fn poll(&self) -> Vec<FileEvent> {
        let mut events = Vec::new();
        while let Ok(evt) = self.rx.try_recv() {
            events.push(evt);
        }
        events
    }
}
