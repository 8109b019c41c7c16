use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::io::store::atomic_write;
use crate::model::record::{DecodeError, TreeRecord};
use crate::model::tree::TaskTree;

/// File name used when exporting without an explicit path
pub const EXPORT_FILE_NAME: &str = "lewtwo_tasks.json";

/// Error type for import and export
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("could not read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("could not write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("{path} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("{path}: {source}")]
    Malformed { path: PathBuf, source: DecodeError },
}

/// Pretty-printed JSON of the whole tree, settings included.
pub fn export_json(tree: &TaskTree) -> Result<String, serde_json::Error> {
    tree.serialize().to_json_pretty()
}

/// Write the tree to `path`. Returns the number of tasks written.
pub fn export_tree(tree: &TaskTree, path: &Path) -> Result<usize, TransferError> {
    let json = export_json(tree).map_err(|e| TransferError::Json {
        path: path.to_path_buf(),
        source: e,
    })?;
    atomic_write(path, json.as_bytes()).map_err(|e| TransferError::Write {
        path: path.to_path_buf(),
        source: e,
    })?;
    info!(path = %path.display(), tasks = tree.len(), "exported task tree");
    Ok(tree.len())
}

/// Parse exported JSON into a tree.
pub fn import_json(text: &str, path: &Path) -> Result<TaskTree, TransferError> {
    let record = TreeRecord::from_json(text).map_err(|e| TransferError::Json {
        path: path.to_path_buf(),
        source: e,
    })?;
    TaskTree::deserialize(&record).map_err(|e| {
        warn!(path = %path.display(), error = %e, "rejected import");
        TransferError::Malformed {
            path: path.to_path_buf(),
            source: e,
        }
    })
}

/// Read a tree previously written by [`export_tree`].
///
/// Nothing is changed on failure; the caller decides whether to replace its
/// current tree with the result.
pub fn import_tree(path: &Path) -> Result<TaskTree, TransferError> {
    let text = fs::read_to_string(path).map_err(|e| TransferError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    let tree = import_json(&text, path)?;
    info!(path = %path.display(), tasks = tree.len(), "imported task tree");
    Ok(tree)
}
