use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::io::config_io::{CONFIG_FILE, ConfigError, read_config, write_default_config};
use crate::io::store::FileStore;
use crate::model::config::AppConfig;

/// Name of the workspace directory
pub const WORKSPACE_DIR: &str = ".lewtwo";

/// Error type for workspace discovery and setup
#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    #[error("not a lewtwo workspace: no .lewtwo/ directory found (run `lew init`)")]
    NotAWorkspace,
    #[error("a lewtwo workspace already exists in {0}")]
    AlreadyExists(PathBuf),
    #[error("could not create {path}: {source}")]
    CreateError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// A discovered workspace and its loaded configuration
#[derive(Debug, Clone)]
pub struct Workspace {
    /// Directory containing `.lewtwo/`
    pub root: PathBuf,
    /// The `.lewtwo/` directory itself
    pub dir: PathBuf,
    pub config: AppConfig,
}

impl Workspace {
    /// Walk up from `start` looking for a `.lewtwo/` directory with a config file.
    pub fn discover(start: &Path) -> Result<Workspace, WorkspaceError> {
        let mut current = start.to_path_buf();
        loop {
            let dir = current.join(WORKSPACE_DIR);
            if dir.is_dir() && dir.join(CONFIG_FILE).exists() {
                debug!(root = %current.display(), "found workspace");
                return Workspace::open(current);
            }
            if !current.pop() {
                return Err(WorkspaceError::NotAWorkspace);
            }
        }
    }

    fn open(root: PathBuf) -> Result<Workspace, WorkspaceError> {
        let dir = root.join(WORKSPACE_DIR);
        let (config, _doc) = read_config(&dir)?;
        Ok(Workspace { root, dir, config })
    }

    /// Create `.lewtwo/` with a default config under `root`.
    pub fn init(root: &Path, config: &AppConfig) -> Result<Workspace, WorkspaceError> {
        let dir = root.join(WORKSPACE_DIR);
        if dir.join(CONFIG_FILE).exists() {
            return Err(WorkspaceError::AlreadyExists(root.to_path_buf()));
        }
        fs::create_dir_all(&dir).map_err(|e| WorkspaceError::CreateError {
            path: dir.clone(),
            source: e,
        })?;
        write_default_config(&dir, config)?;
        Workspace::open(root.to_path_buf())
    }

    /// Path of the store file, relative paths resolved against `.lewtwo/`
    pub fn store_path(&self) -> PathBuf {
        self.dir.join(&self.config.store.file)
    }

    pub fn store(&self) -> FileStore {
        FileStore::new(self.store_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::settings::DueDisplay;
    use tempfile::TempDir;

    #[test]
    fn init_then_discover_from_subdir() {
        let tmp = TempDir::new().unwrap();
        let ws = Workspace::init(tmp.path(), &AppConfig::default()).unwrap();
        assert!(ws.dir.join(CONFIG_FILE).exists());

        let nested = tmp.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();
        let found = Workspace::discover(&nested).unwrap();
        assert_eq!(found.root, tmp.path());
        assert_eq!(found.store_path(), tmp.path().join(".lewtwo").join("tasks.json"));
    }

    #[test]
    fn init_twice_fails() {
        let tmp = TempDir::new().unwrap();
        Workspace::init(tmp.path(), &AppConfig::default()).unwrap();
        assert!(matches!(
            Workspace::init(tmp.path(), &AppConfig::default()),
            Err(WorkspaceError::AlreadyExists(_))
        ));
    }

    #[test]
    fn init_writes_given_defaults() {
        let tmp = TempDir::new().unwrap();
        let mut config = AppConfig::default();
        config.display.default_due_display = DueDisplay::Badges;
        let ws = Workspace::init(tmp.path(), &config).unwrap();
        assert_eq!(ws.config.display.default_due_display, DueDisplay::Badges);
    }

    #[test]
    fn no_workspace() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(
            Workspace::discover(tmp.path()),
            Err(WorkspaceError::NotAWorkspace)
        ));
    }
}
