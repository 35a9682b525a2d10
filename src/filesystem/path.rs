// src/filesystem/path.rs

//! Path sanitization utilities for archive entries
//!
//! Entry names inside an FMU come from whatever tool exported it. They are
//! untrusted input and must never be allowed to resolve outside the
//! working tree they are extracted into.

use crate::error::{Error, Result};
use std::path::{Component, Path, PathBuf};

/// Sanitize an archive entry name into a relative filesystem path
///
/// This function:
/// 1. Treats both `/` and `\` as separators (zip writers on Windows emit `\`)
/// 2. Rejects absolute names and drive prefixes
/// 3. Rejects names containing `..` (parent directory) components
/// 4. Skips `.` (current directory) components
/// 5. Rejects names that are empty after normalization
///
/// # Security
///
/// A hostile archive could attempt to write outside the extraction root
/// using names like:
/// - `../../../etc/passwd`
/// - `/etc/passwd`
/// - `resources/../../escape.txt`
///
/// All of these fail with [`Error::ArchiveFormat`].
///
/// # Examples
///
/// ```
/// use fmurepack::filesystem::path::sanitize_entry_name;
/// use std::path::PathBuf;
///
/// assert_eq!(
///     sanitize_entry_name("binaries/linux64/model.so").unwrap(),
///     PathBuf::from("binaries/linux64/model.so")
/// );
/// assert!(sanitize_entry_name("../etc/passwd").is_err());
/// assert!(sanitize_entry_name("/etc/passwd").is_err());
/// ```
pub fn sanitize_entry_name(name: &str) -> Result<PathBuf> {
    let unified = name.replace('\\', "/");

    if unified.starts_with('/') || has_drive_prefix(&unified) {
        return Err(Error::ArchiveFormat(format!(
            "entry uses an absolute path: {}",
            name
        )));
    }

    let mut normalized = PathBuf::new();

    for component in Path::new(&unified).components() {
        match component {
            Component::Normal(c) => normalized.push(c),
            Component::CurDir => {}
            Component::ParentDir => {
                return Err(Error::ArchiveFormat(format!(
                    "entry escapes the extraction root: {}",
                    name
                )));
            }
            Component::Prefix(_) | Component::RootDir => {
                return Err(Error::ArchiveFormat(format!(
                    "entry uses an absolute path: {}",
                    name
                )));
            }
        }
    }

    if normalized.as_os_str().is_empty() {
        return Err(Error::ArchiveFormat(format!("entry has an empty name: {:?}", name)));
    }

    Ok(normalized)
}

/// Convert a path relative to the working tree into a portable entry name
///
/// Components are joined with `/` regardless of the host separator.
/// Returns `None` for paths that are not plain relative UTF-8 paths.
pub fn archive_entry_name(relative: &Path) -> Option<String> {
    let mut parts = Vec::new();

    for component in relative.components() {
        match component {
            Component::Normal(c) => parts.push(c.to_str()?),
            Component::CurDir => {}
            _ => return None,
        }
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

fn has_drive_prefix(name: &str) -> bool {
    let bytes = name.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}
