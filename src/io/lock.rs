use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use super::data_dir;

const LOCK_FILE: &str = "lock";
const POLL: Duration = Duration::from_millis(10);

/// How long a CLI write waits for the TUI (or another CLI) to finish
pub const DEFAULT_WAIT: Duration = Duration::from_secs(5);

/// Exclusive advisory lock on `<base>/.vesper/lock`, held while an outline
/// is read-modified-written. The holder's pid is kept in the file.
pub struct ProjectLock {
    file: File,
    path: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("cannot open {}: {source}", .path.display())]
    Open { path: PathBuf, source: io::Error },
    #[error("outline is locked by another vesper process{}", holder_note(.holder))]
    Busy { holder: Option<u32> },
}

fn holder_note(holder: &Option<u32>) -> String {
    holder.map(|pid| format!(" (pid {pid})")).unwrap_or_default()
}

impl ProjectLock {
    /// Take the lock for the project at `base`, retrying for up to `wait`.
    pub fn acquire(base: &Path, wait: Duration) -> Result<Self, LockError> {
        let path = data_dir(base).join(LOCK_FILE);
        let file = open_lock_file(&path).map_err(|source| LockError::Open {
            path: path.clone(),
            source,
        })?;

        let deadline = Instant::now() + wait;
        while try_flock(&file).is_err() {
            if Instant::now() >= deadline {
                return Err(LockError::Busy {
                    holder: read_holder(&path),
                });
            }
            thread::sleep(POLL);
        }

        let mut lock = ProjectLock { file, path };
        lock.record_holder();
        Ok(lock)
    }

    /// `acquire` with `DEFAULT_WAIT`
    pub fn for_write(base: &Path) -> Result<Self, LockError> {
        Self::acquire(base, DEFAULT_WAIT)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn record_holder(&mut self) {
        let _ = self
            .file
            .set_len(0)
            .and_then(|()| write!(self.file, "{}", std::process::id()));
    }
}

impl Drop for ProjectLock {
    fn drop(&mut self) {
        // The file stays; unlinking it would let a second holder lock a new inode.
        // The flock itself goes away when `file` closes.
        let _ = self.file.set_len(0);
    }
}

fn open_lock_file(path: &Path) -> io::Result<File> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .open(path)
}

fn read_holder(path: &Path) -> Option<u32> {
    fs::read_to_string(path).ok()?.trim().parse().ok()
}

#[cfg(unix)]
fn try_flock(file: &File) -> io::Result<()> {
    use std::os::unix::io::AsRawFd;
    let result = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
    if result == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn try_flock(_file: &File) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn records_and_clears_holder() {
        let tmp = TempDir::new().unwrap();

        let lock = ProjectLock::for_write(tmp.path()).unwrap();
        assert_eq!(lock.path(), tmp.path().join(".vesper/lock"));
        assert_eq!(read_holder(lock.path()), Some(std::process::id()));
        drop(lock);

        assert_eq!(read_holder(&tmp.path().join(".vesper/lock")), None);
        assert!(ProjectLock::for_write(tmp.path()).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn second_holder_is_told_who_is_writing() {
        let tmp = TempDir::new().unwrap();
        let _held = ProjectLock::for_write(tmp.path()).unwrap();

        let err = ProjectLock::acquire(tmp.path(), Duration::from_millis(50))
            .err()
            .unwrap();
        assert!(matches!(err, LockError::Busy { holder: Some(pid) } if pid == std::process::id()));
        assert!(err.to_string().contains("(pid "));
    }
}
