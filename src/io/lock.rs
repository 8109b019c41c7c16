use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, trace};

/// Exclusive advisory lock on one store file.
///
/// Write commands hold it from before the store is loaded until after it is
/// saved, so two `lew` processes cannot interleave a load-modify-save cycle.
/// The lock sits on a sibling `<store>.lock` file. That file is never
/// removed: a waiter must always lock the same inode the holder locked.
#[derive(Debug)]
pub struct StoreLock {
    file: File,
    path: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("could not open lock file {path}: {source}")]
    Open { path: PathBuf, source: io::Error },
    #[error("{path} is still locked after {waited:?}: another lew process is writing")]
    Busy { path: PathBuf, waited: Duration },
}

impl StoreLock {
    pub const DEFAULT_WAIT: Duration = Duration::from_secs(5);

    /// `tasks.json` is locked through `tasks.json.lock`.
    pub fn lock_path(store: &Path) -> PathBuf {
        let mut name = store.file_name().unwrap_or_default().to_os_string();
        name.push(".lock");
        store.with_file_name(name)
    }

    /// Lock `store`, retrying with backoff for up to `wait`.
    pub fn acquire(store: &Path, wait: Duration) -> Result<StoreLock, LockError> {
        let path = Self::lock_path(store);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|source| LockError::Open {
                path: path.clone(),
                source,
            })?;

        let deadline = Instant::now() + wait;
        let mut pause = Duration::from_millis(5);
        while !try_exclusive(&file) {
            let now = Instant::now();
            if now >= deadline {
                return Err(LockError::Busy { path, waited: wait });
            }
            trace!(path = %path.display(), "store busy, waiting");
            std::thread::sleep(pause.min(deadline - now));
            pause = (pause * 2).min(Duration::from_millis(100));
        }
        debug!(path = %path.display(), "store locked");
        Ok(StoreLock { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        unlock(&self.file);
        debug!(path = %self.path.display(), "store unlocked");
    }
}

#[cfg(unix)]
fn try_exclusive(file: &File) -> bool {
    use std::os::unix::io::AsRawFd;
    // SAFETY: the descriptor belongs to `file`, which outlives the call
    unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) == 0 }
}

#[cfg(unix)]
fn unlock(file: &File) {
    use std::os::unix::io::AsRawFd;
    // SAFETY: as above
    unsafe {
        libc::flock(file.as_raw_fd(), libc::LOCK_UN);
    }
}

#[cfg(not(unix))]
fn try_exclusive(_file: &File) -> bool {
    true
}

#[cfg(not(unix))]
fn unlock(_file: &File) {}
