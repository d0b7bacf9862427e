//! Disposable build workspace for subprocess conversions

use root2pb_common::{Result, Root2pbError};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

/// Prefix of workspace directory names.
pub const WORKSPACE_PREFIX: &str = "root2pb-";

/// A fresh temporary directory owned by one run.
///
/// The directory is removed on [`BuildWorkspace::close`] or drop, unless
/// [`BuildWorkspace::keep`] was called.
#[derive(Debug)]
pub struct BuildWorkspace {
    dir: TempDir,
}

impl BuildWorkspace {
    /// Create a workspace under the system temp directory.
    pub fn create() -> Result<Self> {
        let dir = tempfile::Builder::new().prefix(WORKSPACE_PREFIX).tempdir()?;
        debug!(path = %dir.path().display(), "Created build workspace");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Copy `file` into the workspace root and return the copy's path.
    pub fn stage(&self, file: &Path) -> Result<PathBuf> {
        let name = file.file_name().ok_or_else(|| {
            Root2pbError::config(format!("cannot stage {}: no file name", file.display()))
        })?;
        let dest = self.dir.path().join(name);
        std::fs::copy(file, &dest)?;
        debug!(from = %file.display(), to = %dest.display(), "Staged file");
        Ok(dest)
    }

    /// Leave the directory on disk and return its path.
    pub fn keep(self) -> PathBuf {
        let path = self.dir.keep();
        info!(path = %path.display(), "Keeping build workspace");
        path
    }

    /// Remove the directory, reporting failures.
    pub fn close(self) -> Result<()> {
        let path = self.dir.path().to_path_buf();
        self.dir.close()?;
        debug!(path = %path.display(), "Removed build workspace");
        Ok(())
    }
}
