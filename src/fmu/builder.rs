// src/fmu/builder.rs

//! FMU archive builder
//!
//! Zips a working tree into a new FMU. The archive is written to a
//! temporary file next to the destination and renamed into place only
//! after every entry has been written, so a failed build never leaves a
//! partial file under the final name.

use crate::error::{Error, Result};
use crate::filesystem::path::archive_entry_name;
use crate::fmu::workdir::WorkingTree;
use std::fs::{self, File};
use std::io::{self, Seek, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Prefix of the staging file created beside the destination
const STAGING_PREFIX: &str = ".fmurepack-";

/// A finished FMU on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputArchive {
    pub path: PathBuf,
    /// Number of file entries
    pub entries: usize,
    /// Size of the archive in bytes
    pub size: u64,
}

/// Build an FMU at `destination` from the contents of `tree`
///
/// Parent directories of `destination` are created. An existing file at
/// `destination` is replaced atomically.
pub fn build(tree: &WorkingTree, destination: &Path) -> Result<OutputArchive> {
    info!("[6/6] Building FMU: {}", destination.display());
    build_from_dir(tree.root(), destination)
}

pub(crate) fn build_from_dir(root: &Path, destination: &Path) -> Result<OutputArchive> {
    let parent = match destination.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent).map_err(|e| Error::write(destination, e))?;

    let staging = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .suffix(".tmp")
        .tempfile_in(&parent)
        .map_err(|e| Error::write(destination, e))?;
    debug!("Staging archive at {}", staging.path().display());

    // On error the staging file is dropped, which deletes it
    let entries = write_archive(root, staging.as_file()).map_err(|e| Error::write(destination, e))?;
    staging
        .as_file()
        .sync_all()
        .map_err(|e| Error::write(destination, e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(staging.path(), fs::Permissions::from_mode(0o644))
            .map_err(|e| Error::write(destination, e))?;
    }

    let file = staging
        .persist(destination)
        .map_err(|e| Error::write(destination, e.error))?;
    let size = file
        .metadata()
        .map_err(|e| Error::write(destination, e))?
        .len();

    info!(
        "  Created {} ({} entries, {:.2} KB)",
        destination.display(),
        entries,
        size as f64 / 1024.0
    );

    Ok(OutputArchive {
        path: destination.to_path_buf(),
        entries,
        size,
    })
}

/// Write every regular file under `root` into a zip on `sink`
///
/// Entries are visited in sorted order so identical trees produce identical
/// archives. Returns the number of entries written.
fn write_archive<W: Write + Seek>(root: &Path, sink: W) -> zip::result::ZipResult<usize> {
    let mut zip = ZipWriter::new(sink);
    let mut count = 0;

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(io::Error::from)?;
        let file_type = entry.file_type();

        if file_type.is_symlink() {
            warn!("Skipping symlink {}", entry.path().display());
            continue;
        }
        if !file_type.is_file() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(root)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        let name = archive_entry_name(relative).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("path is not valid UTF-8: {}", relative.display()),
            )
        })?;

        let options = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(file_mode(&entry.metadata().map_err(io::Error::from)?));

        zip.start_file(name.as_str(), options)?;
        let mut file = File::open(entry.path())?;
        io::copy(&mut file, &mut zip)?;
        debug!("  + {}", name);
        count += 1;
    }

    zip.finish()?;
    Ok(count)
}

#[cfg(unix)]
fn file_mode(metadata: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o777
}

#[cfg(not(unix))]
fn file_mode(_metadata: &fs::Metadata) -> u32 {
    0o644
}
