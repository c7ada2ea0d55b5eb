//! Batch workspace holding every clone of a run
//!
//! The configured root may be shared with other data. A run only ever writes
//! to, and removes, its own `copyright-waiver-<pid>` directory under the root,
//! plus the root itself when the run had to create it.

use std::path::{Path, PathBuf};

use crate::error::{Result, WaiverError};

/// Directory name used under the system temp dir when no root is configured,
/// and the prefix of each run's own directory
pub const DEFAULT_WORKSPACE_DIR: &str = "copyright-waiver";

/// Maps repositories to clone directories under a run-owned directory
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
    run_dir: PathBuf,
    created_root: bool,
}

impl Workspace {
    /// Create a workspace under `root`. Nothing is created on disk until
    /// [`Workspace::prepare`].
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let run_dir = root.join(format!("{}-{}", DEFAULT_WORKSPACE_DIR, std::process::id()));
        Self {
            root,
            run_dir,
            created_root: false,
        }
    }

    /// Workspace under the system temp directory
    pub fn default_root() -> PathBuf {
        std::env::temp_dir().join(DEFAULT_WORKSPACE_DIR)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory owned by this run; every clone lives below it
    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    /// Clone directory for a qualified `owner/name`
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.run_dir.join(name)
    }

    /// Create the run directory. A leftover run directory with the same name
    /// comes from a crashed run and is removed first; anything else under the
    /// root is left alone.
    pub fn prepare(&mut self) -> Result<()> {
        if !self.root.exists() {
            std::fs::create_dir_all(&self.root).map_err(|e| {
                WaiverError::Workspace(format!("Failed to create {}: {}", self.root.display(), e))
            })?;
            self.created_root = true;
        }

        if self.run_dir.exists() {
            tracing::warn!("Removing stale run directory {}", self.run_dir.display());
            self.remove_run_dir()?;
        }

        std::fs::create_dir(&self.run_dir).map_err(|e| {
            WaiverError::Workspace(format!("Failed to create {}: {}", self.run_dir.display(), e))
        })?;
        tracing::debug!("Prepared workspace {}", self.run_dir.display());
        Ok(())
    }

    /// Remove the run directory, and the root when this run created it
    pub fn teardown(&self) -> Result<()> {
        self.remove_run_dir()?;

        if self.created_root {
            // Only succeeds while empty; someone else may have written there.
            if let Err(e) = std::fs::remove_dir(&self.root) {
                tracing::debug!("Keeping workspace root {}: {}", self.root.display(), e);
            }
        }
        Ok(())
    }

    fn remove_run_dir(&self) -> Result<()> {
        match std::fs::remove_dir_all(&self.run_dir) {
            Ok(()) => {
                tracing::debug!("Removed workspace {}", self.run_dir.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(WaiverError::Workspace(format!(
                "Failed to remove {}: {}",
                self.run_dir.display(),
                e
            ))),
        }
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new(Self::default_root())
    }
}
