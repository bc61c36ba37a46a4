// ABOUTME: Run lock preventing two local invocations from driving the same workspace.
// ABOUTME: Uses atomic file creation with holder info stored next to the state file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::Layout;
use crate::error::{Error, Result};

/// Information about who holds a run lock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockInfo {
    /// Hostname of the machine that holds the lock.
    pub holder: String,
    /// Process ID of the lock holder.
    pub pid: u32,
    /// When the lock was acquired.
    pub started_at: DateTime<Utc>,
    /// Project being driven, if known.
    pub project: Option<String>,
}

impl LockInfo {
    /// Create new lock info for the current process.
    pub fn new(project: Option<&str>) -> Self {
        Self {
            holder: gethostname::gethostname().to_string_lossy().into_owned(),
            pid: std::process::id(),
            started_at: Utc::now(),
            project: project.map(str::to_string),
        }
    }

    /// Check if this lock is stale (older than 1 hour).
    pub fn is_stale(&self) -> bool {
        let age = Utc::now() - self.started_at;
        age.num_hours() >= 1
    }
}

/// A held run lock. Released explicitly, or on drop as a fallback.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
    released: bool,
}

impl RunLock {
    /// Acquire the run lock of the workspace rooted at `root`.
    ///
    /// Returns `Error::Locked` if another live process holds it.
    /// Stale locks (>1 hour) and unreadable lock files are broken with a
    /// warning; `break_lock` breaks any lock.
    pub fn acquire(root: &Path, project: Option<&str>, break_lock: bool) -> Result<Self> {
        let path = Layout::lock_file_for(root);
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let info = LockInfo::new(project);
        if Self::try_create(&path, &info)? {
            return Ok(Self {
                path,
                released: false,
            });
        }

        if !Self::should_break(&path, break_lock)? {
            let existing = std::fs::read_to_string(&path)
                .ok()
                .and_then(|content| serde_json::from_str::<LockInfo>(&content).ok());
            return Err(match existing {
                Some(existing) => Error::Locked {
                    holder: existing.holder,
                    pid: existing.pid,
                    since: existing.started_at.to_rfc3339(),
                },
                None => Error::Locked {
                    holder: "unknown".to_string(),
                    pid: 0,
                    since: "unknown".to_string(),
                },
            });
        }

        tracing::debug!("Removing stale or broken lock at {}", path.display());
        let _ = std::fs::remove_file(&path);

        if !Self::try_create(&path, &info)? {
            return Err(Error::Locked {
                holder: "another process".to_string(),
                pid: 0,
                since: "lock break".to_string(),
            });
        }

        Ok(Self {
            path,
            released: false,
        })
    }

    /// Atomically create the lock file. Returns false if it already exists.
    fn try_create(path: &Path, info: &LockInfo) -> Result<bool> {
        let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => return Ok(false),
            Err(e) => return Err(Error::Io(e)),
        };

        let json = serde_json::to_vec(info).map_err(std::io::Error::from)?;
        file.write_all(&json)?;
        Ok(true)
    }

    /// Check if an existing lock should be broken (stale, requested, or corrupted).
    fn should_break(path: &Path, break_lock: bool) -> Result<bool> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(true),
            Err(_) => {
                tracing::warn!("Lock info unreadable, breaking lock");
                return Ok(true);
            }
        };

        match serde_json::from_str::<LockInfo>(&content) {
            Ok(existing) if break_lock => {
                tracing::warn!(
                    "Breaking lock held by {} (pid {}) since {}",
                    existing.holder,
                    existing.pid,
                    existing.started_at
                );
                Ok(true)
            }
            Ok(existing) if existing.is_stale() => {
                tracing::warn!(
                    "Auto-breaking stale lock held by {} (pid {}) since {}",
                    existing.holder,
                    existing.pid,
                    existing.started_at
                );
                Ok(true)
            }
            Ok(_) => Ok(false),
            Err(_) => {
                tracing::warn!("Lock info corrupted, breaking lock");
                Ok(true)
            }
        }
    }

    /// Release the lock.
    pub fn release(mut self) -> std::io::Result<()> {
        self.released = true;
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if !self.released {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_info_creates_with_current_host_and_pid() {
        let info = LockInfo::new(Some("demo"));

        assert_eq!(info.project.as_deref(), Some("demo"));
        assert_eq!(info.pid, std::process::id());
        assert!(!info.holder.is_empty());
    }

    #[test]
    fn fresh_lock_is_not_stale() {
        let info = LockInfo::new(None);
        assert!(!info.is_stale());
    }

    #[test]
    fn old_lock_is_stale() {
        let mut info = LockInfo::new(None);
        info.started_at = Utc::now() - chrono::Duration::hours(2);
        assert!(info.is_stale());
    }

    #[test]
    fn second_acquire_fails_until_release() {
        let dir = tempfile::tempdir().unwrap();
        let lock = RunLock::acquire(dir.path(), Some("demo"), false).unwrap();

        let err = RunLock::acquire(dir.path(), Some("demo"), false).unwrap_err();
        assert!(matches!(err, Error::Locked { pid, .. } if pid == std::process::id()));

        lock.release().unwrap();
        let again = RunLock::acquire(dir.path(), Some("demo"), false).unwrap();
        again.release().unwrap();
    }

    #[test]
    fn break_lock_takes_over_live_lock() {
        let dir = tempfile::tempdir().unwrap();
        let held = RunLock::acquire(dir.path(), None, false).unwrap();
        let taken = RunLock::acquire(dir.path(), None, true).unwrap();
        taken.release().unwrap();
        // The original holder no longer owns the file; releasing is still fine.
        held.release().unwrap();
    }

    #[test]
    fn stale_and_corrupt_locks_are_broken() {
        let dir = tempfile::tempdir().unwrap();
        let path = Layout::lock_file_for(dir.path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();

        let mut stale = LockInfo::new(None);
        stale.started_at = Utc::now() - chrono::Duration::hours(3);
        std::fs::write(&path, serde_json::to_string(&stale).unwrap()).unwrap();
        RunLock::acquire(dir.path(), None, false)
            .unwrap()
            .release()
            .unwrap();

        std::fs::write(&path, "not json").unwrap();
        RunLock::acquire(dir.path(), None, false)
            .unwrap()
            .release()
            .unwrap();
    }

    #[test]
    fn drop_releases_lock() {
        let dir = tempfile::tempdir().unwrap();
        {
            let _lock = RunLock::acquire(dir.path(), None, false).unwrap();
        }
        assert!(!Layout::lock_file_for(dir.path()).exists());
    }
}
