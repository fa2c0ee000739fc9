//! The indexer process lock (spec §4.1/§5/§6): `index.lock` in `.roam/`
//! carries the owning process id as its only content. A lock whose owner
//! process no longer exists is cleared on next start rather than blocking
//! forever.

use crate::error::{RoamError, StoreError};
use std::fs;
use std::path::{Path, PathBuf};
use sysinfo::{Pid, System};

pub struct IndexLock {
    path: PathBuf,
    held: bool,
}

impl IndexLock {
    /// Acquire the lock at `roam_dir/index.lock`, clearing a stale lock
    /// (owner pid no longer alive) first.
    pub fn acquire(roam_dir: &Path) -> crate::error::Result<Self> {
        fs::create_dir_all(roam_dir).map_err(|e| {
            RoamError::Store(StoreError::Io {
                path: roam_dir.to_path_buf(),
                source: e,
            })
        })?;
        let path = roam_dir.join("index.lock");

        if let Some(owner_pid) = read_owner(&path) {
            if process_alive(owner_pid) {
                return Err(RoamError::Lock {
                    reason: format!("index is locked by running process {owner_pid}"),
                });
            }
            tracing::warn!(owner_pid, "clearing stale index lock");
            let _ = fs::remove_file(&path);
        }

        let pid = std::process::id();
        fs::write(&path, pid.to_string()).map_err(|e| {
            RoamError::Store(StoreError::Io {
                path: path.clone(),
                source: e,
            })
        })?;

        Ok(Self { path, held: true })
    }

    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        if self.held {
            let _ = fs::remove_file(&self.path);
            self.held = false;
        }
    }
}

impl Drop for IndexLock {
    fn drop(&mut self) {
        self.release_inner();
    }
}

fn read_owner(path: &Path) -> Option<u32> {
    fs::read_to_string(path).ok()?.trim().parse().ok()
}

fn process_alive(pid: u32) -> bool {
    let mut system = System::new();
    system.refresh_processes(sysinfo::ProcessesToUpdate::All, true);
    system.process(Pid::from_u32(pid)).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_then_release_clears_lock_file() {
        let dir = tempfile::tempdir().unwrap();
        let roam_dir = dir.path().join(".roam");
        let lock = IndexLock::acquire(&roam_dir).unwrap();
        assert!(roam_dir.join("index.lock").exists());
        lock.release();
        assert!(!roam_dir.join("index.lock").exists());
    }

    #[test]
    fn stale_lock_from_dead_process_is_cleared() {
        let dir = tempfile::tempdir().unwrap();
        let roam_dir = dir.path().join(".roam");
        fs::create_dir_all(&roam_dir).unwrap();
        // A pid astronomically unlikely to be alive.
        fs::write(roam_dir.join("index.lock"), "999999999").unwrap();

        let lock = IndexLock::acquire(&roam_dir);
        assert!(lock.is_ok());
    }

    #[test]
    fn live_process_lock_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let roam_dir = dir.path().join(".roam");
        fs::create_dir_all(&roam_dir).unwrap();
        fs::write(roam_dir.join("index.lock"), std::process::id().to_string()).unwrap();

        let result = IndexLock::acquire(&roam_dir);
        assert!(result.is_err());
    }
}
