use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::io::lock::{LockError, StoreLock};
use crate::model::record::{DecodeError, TreeRecord};
use crate::model::tree::TaskTree;

/// Key of the single record a file store holds
pub const RECORD_KEY: &str = "taskList";

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("could not read {path}: {source}")]
    ReadError { path: PathBuf, source: io::Error },
    #[error("could not write {path}: {source}")]
    WriteError { path: PathBuf, source: io::Error },
    #[error("store {path} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("store {path} holds record {found:?}, expected \"taskList\"")]
    WrongKey { path: PathBuf, found: String },
    #[error("stored tree is invalid: {0}")]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Lock(#[from] LockError),
}

/// Loads and saves the serialized tree.
///
/// `load` returns `None` when nothing has been stored yet.
pub trait TreeStore {
    fn load(&self) -> Result<Option<TreeRecord>, StoreError>;
    fn save(&mut self, record: &TreeRecord) -> Result<(), StoreError>;
}

/// Load the stored tree, or an empty one when nothing is stored.
pub fn load_tree(store: &dyn TreeStore) -> Result<TaskTree, StoreError> {
    load_tree_or_else(store, TaskTree::new)
}

/// Load the stored tree, building a fresh one with `fresh` when nothing is
/// stored yet.
pub fn load_tree_or_else(
    store: &dyn TreeStore,
    fresh: impl FnOnce() -> TaskTree,
) -> Result<TaskTree, StoreError> {
    match store.load()? {
        Some(record) => Ok(TaskTree::deserialize(&record)?),
        None => Ok(fresh()),
    }
}

pub fn save_tree(store: &mut dyn TreeStore, tree: &TaskTree) -> Result<(), StoreError> {
    store.save(&tree.serialize())
}

// ---------------------------------------------------------------------------
// File store
// ---------------------------------------------------------------------------

/// On-disk envelope around the tree
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredRecord {
    key: String,
    tasks: TreeRecord,
    /// Epoch milliseconds of the last save
    last_updated: i64,
}

/// A JSON file holding one keyed record
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Take the write lock for this store. Hold the guard across load,
    /// change and save.
    pub fn lock(&self) -> Result<StoreLock, StoreError> {
        Ok(StoreLock::acquire(&self.path, StoreLock::DEFAULT_WAIT)?)
    }
}

impl TreeStore for FileStore {
    fn load(&self) -> Result<Option<TreeRecord>, StoreError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no store file yet");
                return Ok(None);
            }
            Err(e) => {
                return Err(StoreError::ReadError {
                    path: self.path.clone(),
                    source: e,
                });
            }
        };
        if text.trim().is_empty() {
            return Ok(None);
        }
        let stored: StoredRecord =
            serde_json::from_str(&text).map_err(|e| StoreError::Json {
                path: self.path.clone(),
                source: e,
            })?;
        if stored.key != RECORD_KEY {
            return Err(StoreError::WrongKey {
                path: self.path.clone(),
                found: stored.key,
            });
        }
        Ok(Some(stored.tasks))
    }

    fn save(&mut self, record: &TreeRecord) -> Result<(), StoreError> {
        let stored = StoredRecord {
            key: RECORD_KEY.to_string(),
            tasks: record.clone(),
            last_updated: Utc::now().timestamp_millis(),
        };
        let json = serde_json::to_string_pretty(&stored).map_err(|e| StoreError::Json {
            path: self.path.clone(),
            source: e,
        })?;
        atomic_write(&self.path, json.as_bytes()).map_err(|e| StoreError::WriteError {
            path: self.path.clone(),
            source: e,
        })?;
        info!(path = %self.path.display(), "saved task tree");
        Ok(())
    }
}

/// Write `content` to `path` atomically using a temp file + rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Memory store
// ---------------------------------------------------------------------------

/// Keeps the record in memory. Used by tests and dry runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    record: Option<TreeRecord>,
    saves: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(record: TreeRecord) -> Self {
        MemoryStore {
            record: Some(record),
            saves: 0,
        }
    }

    /// Number of successful saves
    pub fn saves(&self) -> usize {
        self.saves
    }
}

impl TreeStore for MemoryStore {
    fn load(&self) -> Result<Option<TreeRecord>, StoreError> {
        Ok(self.record.clone())
    }

    fn save(&mut self, record: &TreeRecord) -> Result<(), StoreError> {
        self.record = Some(record.clone());
        self.saves += 1;
        Ok(())
    }
}
