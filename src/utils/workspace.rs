//! Per-invocation engine workspace
//!
//! Every run gets its own temporary directory holding the exchange file, the
//! parameter file, the engine's report files and (when built from source) the
//! engine executable. The engine runs with this directory as its working
//! directory, so concurrent runs never share file names. Dropping the
//! `Workspace` removes the directory and everything in it.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Prefix for workspace directory names
const WORKSPACE_PREFIX: &str = "decorana-";

pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Create a fresh workspace under `root` (system temp dir when `None`).
    pub fn create(root: Option<&Path>) -> std::io::Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(WORKSPACE_PREFIX);

        let dir = match root {
            Some(root) => {
                fs::create_dir_all(root)?;
                builder.tempdir_in(root)?
            }
            None => builder.tempdir()?,
        };

        tracing::debug!("Created engine workspace {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path of a file inside the workspace
    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Write a text file into the workspace and return its path
    pub fn write(&self, name: &str, contents: &str) -> std::io::Result<PathBuf> {
        let path = self.file(name);
        fs::write(&path, contents)?;
        Ok(path)
    }

    /// Remove the directory now, reporting failures instead of ignoring them.
    pub fn close(self) -> std::io::Result<()> {
        let path = self.dir.path().to_path_buf();
        self.dir.close()?;
        tracing::debug!("Removed engine workspace {}", path.display());
        Ok(())
    }
}
