//! Shared handle on the configuration directory being edited

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::info;

use super::discovery::{clean_path, is_valid_config_dir};

/// Currently selected configuration directory.
///
/// Clones share the same slot: reads take the lock shared, switching
/// directories takes it exclusively for the assignment only.
#[derive(Debug, Clone, Default)]
pub struct ActiveDirectory {
    inner: Arc<RwLock<Option<PathBuf>>>,
}

impl ActiveDirectory {
    pub fn new(initial: Option<PathBuf>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(initial)),
        }
    }

    pub fn get(&self) -> Option<PathBuf> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Active directory, or an error telling the user to pick one
    pub fn require(&self) -> Result<PathBuf> {
        match self.get() {
            Some(path) => Ok(path),
            None => bail!("No configuration directory selected, choose one first"),
        }
    }

    /// Switch to `path` after checking it is a readable directory
    pub fn set(&self, path: &Path) -> Result<PathBuf> {
        let path = clean_path(path);
        if !is_valid_config_dir(&path) {
            bail!("Path '{}' does not exist or is not readable", path.display());
        }
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Some(path.clone());
        info!(path = %path.display(), "Active configuration directory changed");
        Ok(path)
    }
}
