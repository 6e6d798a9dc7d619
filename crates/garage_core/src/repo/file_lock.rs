//! Full-duration exclusive lock for flat-file read-modify-write cycles.
//!
//! # Responsibility
//! - Serialize writers of one data file across threads and processes.
//!
//! # Invariants
//! - A guard holds a process-wide claim on the lock path and an OS
//!   advisory lock on the sidecar `<file>.lock`, in that order.
//! - The lock path is derived from the data path with its directory
//!   canonicalized, so `a/b/../users.json` and `a/users.json` share one lock.
//! - Both locks are released when the guard drops, on every exit path.
//! - Acquisition blocks until the lock is free; there is no timeout.

use crate::repo::{RepoError, RepoResult};
use fs2::FileExt;
use log::{debug, warn};
use once_cell::sync::Lazy;
use parking_lot::{Condvar, Mutex};
use std::collections::HashSet;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Lock paths currently held by some guard in this process.
static HELD_PATHS: Lazy<Mutex<HashSet<PathBuf>>> = Lazy::new(|| Mutex::new(HashSet::new()));
static RELEASED: Condvar = Condvar::new();

/// Held exclusive lock on one data file.
pub struct FileLock {
    lock_path: PathBuf,
    file: File,
}

impl FileLock {
    /// Blocks until the exclusive lock for `data_path` is held.
    ///
    /// # Errors
    /// - Returns [`RepoError::Lock`] when the sidecar lock file cannot be
    ///   opened or locked.
    pub fn acquire(data_path: &Path) -> RepoResult<Self> {
        let started_at = Instant::now();
        let lock_path = lock_path_for(&resolve_dir(data_path));
        hold_in_process(&lock_path);

        let file = match OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
        {
            Ok(file) => file,
            Err(source) => {
                release_in_process(&lock_path);
                return Err(RepoError::Lock {
                    path: lock_path,
                    source,
                });
            }
        };
        if let Err(source) = FileExt::lock_exclusive(&file) {
            release_in_process(&lock_path);
            return Err(RepoError::Lock {
                path: lock_path,
                source,
            });
        }

        debug!(
            "event=file_lock module=repo status=ok wait_ms={} path={}",
            started_at.elapsed().as_millis(),
            lock_path.display()
        );

        Ok(Self { lock_path, file })
    }

    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        if let Err(err) = FileExt::unlock(&self.file) {
            warn!(
                "event=file_unlock module=repo status=error path={} error={}",
                self.lock_path.display(),
                err
            );
        }
        release_in_process(&self.lock_path);
    }
}

/// Returns the sidecar lock path for a data file: `<file>.lock`.
pub fn lock_path_for(data_path: &Path) -> PathBuf {
    let mut name = data_path
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(".lock");
    data_path.with_file_name(name)
}

/// Canonicalizes the parent directory of `data_path`; the file itself may not
/// exist yet. Unresolvable directories are left as given and surface as a
/// lock error when the sidecar is opened.
fn resolve_dir(data_path: &Path) -> PathBuf {
    let parent = match data_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    match (fs::canonicalize(parent), data_path.file_name()) {
        (Ok(dir), Some(name)) => dir.join(name),
        _ => data_path.to_path_buf(),
    }
}

fn hold_in_process(lock_path: &Path) {
    let mut held = HELD_PATHS.lock();
    while held.contains(lock_path) {
        RELEASED.wait(&mut held);
    }
    held.insert(lock_path.to_path_buf());
}

fn release_in_process(lock_path: &Path) {
    HELD_PATHS.lock().remove(lock_path);
    RELEASED.notify_all();
}
