// src/fmu/workdir.rs

//! Scoped working directories
//!
//! A [`WorkingTree`] owns a uniquely named temporary directory for the
//! duration of one repackaging operation. The directory is removed when the
//! tree is dropped, which covers early returns, errors, and unwinding.

use crate::error::Result;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, warn};

/// File name of the descriptor at the root of every FMU
pub const DESCRIPTOR_FILE: &str = "modelDescription.xml";

/// Directory holding resources inside an FMU
pub const RESOURCES_DIR: &str = "resources";

/// Prefix of every working directory created by this crate
const WORKDIR_PREFIX: &str = "fmu_repackage_";

/// Exclusively owned, temporary expansion of an FMU on disk
#[derive(Debug)]
pub struct WorkingTree {
    dir: TempDir,
    /// Relative paths written by this operation (not by the source archive)
    created: HashSet<PathBuf>,
}

impl WorkingTree {
    /// Allocate a fresh working directory under the system temp dir
    ///
    /// Names carry a random suffix, so concurrent operations never share a
    /// directory.
    pub fn new() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(&format!("{}{}_", WORKDIR_PREFIX, std::process::id()))
            .tempdir()?;
        debug!("Allocated working tree at {}", dir.path().display());
        Ok(Self {
            dir,
            created: HashSet::new(),
        })
    }

    /// Root of the working tree
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Path of the descriptor document
    pub fn descriptor_path(&self) -> PathBuf {
        self.root().join(DESCRIPTOR_FILE)
    }

    /// Path of the resources directory (may not exist yet)
    pub fn resources_dir(&self) -> PathBuf {
        self.root().join(RESOURCES_DIR)
    }

    /// Record a file as written by the current operation
    pub(crate) fn mark_created(&mut self, relative: impl Into<PathBuf>) {
        self.created.insert(relative.into());
    }

    /// Whether the file at `relative` was written by the current operation
    pub fn was_created(&self, relative: &Path) -> bool {
        self.created.contains(relative)
    }

    /// Remove the working directory now, reporting failures
    ///
    /// Dropping the tree also removes it; this variant only exists so a
    /// successful run can log a cleanup failure instead of ignoring it.
    pub fn close(self) {
        let path = self.root().to_path_buf();
        match self.dir.close() {
            Ok(()) => debug!("Removed working tree {}", path.display()),
            Err(e) => warn!("Failed to remove working tree {}: {}", path.display(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_working_tree_removed_on_drop() {
        let tree = WorkingTree::new().unwrap();
        let root = tree.root().to_path_buf();
        std::fs::write(root.join("file.txt"), b"x").unwrap();
        assert!(root.exists());

        drop(tree);
        assert!(!root.exists());
    }

    #[test]
    fn test_working_tree_close() {
        let tree = WorkingTree::new().unwrap();
        let root = tree.root().to_path_buf();
        tree.close();
        assert!(!root.exists());
    }

    #[test]
    fn test_working_trees_are_unique() {
        let a = WorkingTree::new().unwrap();
        let b = WorkingTree::new().unwrap();
        assert_ne!(a.root(), b.root());
        assert!(a
            .root()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with(WORKDIR_PREFIX));
    }

    #[test]
    fn test_created_tracking() {
        let mut tree = WorkingTree::new().unwrap();
        let rel = Path::new("resources/mcp_config.json");
        assert!(!tree.was_created(rel));
        tree.mark_created(rel);
        assert!(tree.was_created(rel));
    }
}
