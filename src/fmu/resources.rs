// src/fmu/resources.rs

//! Resource injection
//!
//! Writes new files under `resources/` of a working tree. Files that came
//! from the source archive are never replaced unless the caller explicitly
//! allows it.

use crate::error::{Error, Result};
use crate::filesystem::path::sanitize_entry_name;
use crate::fmu::workdir::{WorkingTree, RESOURCES_DIR};
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A file to place under `resources/`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectedResource {
    /// Path relative to the resources directory
    pub name: String,
    pub content: Vec<u8>,
}

impl InjectedResource {
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Path relative to the working tree root (`resources/<name>`)
    fn tree_path(&self) -> Result<PathBuf> {
        let relative = sanitize_entry_name(&self.name)
            .map_err(|_| Error::InvalidConfig(format!("invalid resource name: {}", self.name)))?;
        Ok(Path::new(RESOURCES_DIR).join(relative))
    }
}

/// Write `resources` into the working tree
///
/// The resources directory is created if the source FMU had none. All
/// targets are checked before the first write, so a conflict leaves the
/// tree untouched. A target counts as a conflict when it already exists,
/// was not written earlier in this same operation, and `allow_overwrite`
/// is false.
pub fn inject(
    tree: &mut WorkingTree,
    resources: &[InjectedResource],
    allow_overwrite: bool,
) -> Result<()> {
    info!("[4/6] Injecting {} resources", resources.len());

    let mut planned = Vec::with_capacity(resources.len());
    let mut seen = HashSet::new();

    for resource in resources {
        let relative = resource.tree_path()?;
        if !seen.insert(relative.clone()) {
            return Err(Error::ResourceConflict(relative));
        }

        // Every ancestor has to be a directory, starting with resources/ itself
        for ancestor in relative.ancestors().skip(1) {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            let existing = tree.root().join(ancestor);
            if existing.exists() && !existing.is_dir() {
                return Err(Error::ResourceConflict(ancestor.to_path_buf()));
            }
        }

        let target = tree.root().join(&relative);
        let replaceable = allow_overwrite || tree.was_created(&relative);
        if target.is_dir() || (target.exists() && !replaceable) {
            return Err(Error::ResourceConflict(relative));
        }
        planned.push((relative, resource, replaceable));
    }

    fs::create_dir_all(tree.resources_dir())?;

    for (relative, resource, replaceable) in planned {
        let target = tree.root().join(&relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        if replaceable {
            fs::write(&target, &resource.content)?;
        } else {
            let mut file = OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&target)
                .map_err(|e| {
                    if e.kind() == std::io::ErrorKind::AlreadyExists {
                        Error::ResourceConflict(relative.clone())
                    } else {
                        Error::Io(e)
                    }
                })?;
            file.write_all(&resource.content)?;
        }

        debug!("Wrote {} ({} bytes)", relative.display(), resource.content.len());
        info!("  Created {}", relative.display());
        tree.mark_created(relative);
    }

    Ok(())
}
