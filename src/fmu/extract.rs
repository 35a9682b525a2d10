// src/fmu/extract.rs

//! FMU extraction
//!
//! Opens the source container, validates every entry name, and expands the
//! archive into a fresh [`WorkingTree`].

use crate::error::{Error, Result};
use crate::filesystem::path::sanitize_entry_name;
use crate::fmu::workdir::WorkingTree;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use zip::ZipArchive;

/// Read-only reference to an existing FMU on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceArchive {
    path: PathBuf,
}

impl SourceArchive {
    /// Reference an existing archive
    ///
    /// Fails with [`Error::NotFound`] when nothing exists at `path`.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::NotFound(path.to_path_buf()));
        }
        if !path.is_file() {
            return Err(Error::ArchiveFormat(format!(
                "{} is not a regular file",
                path.display()
            )));
        }
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    /// Path of the archive
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name of the archive, used for provenance records
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Open a zip container, mapping failures onto the error taxonomy
pub(crate) fn open_zip(path: &Path) -> Result<ZipArchive<File>> {
    let file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::NotFound(path.to_path_buf())
        } else {
            Error::ArchiveFormat(format!("cannot open {}: {}", path.display(), e))
        }
    })?;

    ZipArchive::new(file)
        .map_err(|e| Error::ArchiveFormat(format!("{}: {}", path.display(), e)))
}

/// Feed the content of one archive entry to `sink` in fixed-size chunks
///
/// Returns the number of bytes actually read. Read failures are
/// [`Error::ArchiveFormat`], failures of `sink` are [`Error::Io`].
pub(crate) fn stream_entry<R, F>(entry: &mut R, name: &Path, mut sink: F) -> Result<u64>
where
    R: Read + ?Sized,
    F: FnMut(&[u8]) -> io::Result<()>,
{
    let mut buffer = [0u8; 64 * 1024];
    let mut total = 0u64;
    loop {
        let n = match entry.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(Error::ArchiveFormat(format!(
                    "corrupt entry {}: {}",
                    name.display(),
                    e
                )));
            }
        };
        sink(&buffer[..n])?;
        total += n as u64;
    }
    Ok(total)
}

/// Check the bytes read from an entry against the size the archive declares
pub(crate) fn check_entry_size(name: &Path, declared: u64, actual: u64) -> Result<()> {
    if declared != actual {
        return Err(Error::ArchiveFormat(format!(
            "entry {} declares {} bytes but holds {}",
            name.display(),
            declared,
            actual
        )));
    }
    Ok(())
}

/// Expand `source` into a newly allocated working tree
///
/// Every entry name is validated before the working directory is created,
/// so a hostile archive never gets a single byte onto disk.
pub fn extract(source: &SourceArchive) -> Result<WorkingTree> {
    if !source.path().exists() {
        return Err(Error::NotFound(source.path().to_path_buf()));
    }

    info!("[1/6] Extracting FMU: {}", source.file_name());

    let mut archive = open_zip(source.path())?;

    let mut targets = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let entry = archive
            .by_index_raw(index)
            .map_err(|e| Error::ArchiveFormat(format!("entry {}: {}", index, e)))?;
        targets.push(sanitize_entry_name(entry.name())?);
    }

    let tree = WorkingTree::new()?;

    for (index, relative) in targets.iter().enumerate() {
        let mut entry = archive
            .by_index(index)
            .map_err(|e| Error::ArchiveFormat(format!("entry {}: {}", index, e)))?;
        let dest = tree.root().join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&dest)?;
            continue;
        }

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = File::create(&dest)?;
        let written = stream_entry(&mut entry, relative, |chunk| file.write_all(chunk))?;
        check_entry_size(relative, entry.size(), written)?;

        // Keep recorded permissions, but the tree must stay writable by us
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode().filter(|m| m & 0o777 != 0) {
                let mode = (mode & 0o777) | 0o600;
                fs::set_permissions(&dest, fs::Permissions::from_mode(mode))?;
            }
        }

        debug!("Extracted {} ({} bytes)", relative.display(), written);
    }

    info!("  Extracted {} entries to {}", targets.len(), tree.root().display());
    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::FileOptions;
    use zip::ZipWriter;

    fn write_zip(path: &Path, entries: &[(&str, &str)]) {
        let file = File::create(path).unwrap();
        let mut writer = ZipWriter::new(file);
        for (name, content) in entries {
            if name.ends_with('/') {
                writer.add_directory(*name, FileOptions::default()).unwrap();
            } else {
                writer.start_file(*name, FileOptions::default()).unwrap();
                writer.write_all(content.as_bytes()).unwrap();
            }
        }
        writer.finish().unwrap();
    }

    #[test]
    fn test_source_archive_missing() {
        let temp_dir = TempDir::new().unwrap();
        let err = SourceArchive::new(temp_dir.path().join("missing.fmu")).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_source_archive_file_name() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("vendor.fmu");
        fs::write(&path, b"").unwrap();
        assert_eq!(SourceArchive::new(&path).unwrap().file_name(), "vendor.fmu");
    }

    #[test]
    fn test_extract_preserves_layout() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("model.fmu");
        write_zip(
            &path,
            &[
                ("modelDescription.xml", "<fmiModelDescription/>"),
                ("binaries/", ""),
                ("binaries/linux64/model.so", "\x7fELF"),
            ],
        );

        let tree = extract(&SourceArchive::new(&path).unwrap()).unwrap();
        assert_eq!(
            fs::read(tree.root().join("modelDescription.xml")).unwrap(),
            b"<fmiModelDescription/>"
        );
        assert_eq!(
            fs::read(tree.root().join("binaries/linux64/model.so")).unwrap(),
            b"\x7fELF"
        );
    }

    #[test]
    fn test_extract_rejects_traversal_before_writing() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("evil.fmu");
        write_zip(
            &path,
            &[
                ("modelDescription.xml", "<fmiModelDescription/>"),
                ("../escape.txt", "gotcha"),
            ],
        );

        let err = extract(&SourceArchive::new(&path).unwrap()).unwrap_err();
        assert!(matches!(err, Error::ArchiveFormat(_)));
        assert!(!temp_dir.path().parent().unwrap().join("escape.txt").exists());
    }

    #[test]
    fn test_extract_rejects_non_zip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.fmu");
        fs::write(&path, b"definitely not a zip file").unwrap();

        let err = extract(&SourceArchive::new(&path).unwrap()).unwrap_err();
        assert!(matches!(err, Error::ArchiveFormat(_)));
    }

    #[test]
    fn test_stream_entry_counts_real_bytes() {
        let data = vec![7u8; 200_000];
        let mut sink = Vec::new();
        let total = stream_entry(&mut data.as_slice(), Path::new("big.bin"), |chunk| {
            sink.extend_from_slice(chunk);
            Ok(())
        })
        .unwrap();
        assert_eq!(total, 200_000);
        assert_eq!(sink, data);
    }

    #[test]
    fn test_stream_entry_read_failure_is_archive_format() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::InvalidData, "bad deflate"))
            }
        }

        let err = stream_entry(&mut Broken, Path::new("x.bin"), |_| Ok(())).unwrap_err();
        assert!(matches!(err, Error::ArchiveFormat(_)));
    }

    #[test]
    fn test_stream_entry_sink_failure_is_io() {
        let err = stream_entry(&mut b"abc".as_slice(), Path::new("x.bin"), |_| {
            Err(io::Error::other("disk full"))
        })
        .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_declared_size_mismatch() {
        assert!(check_entry_size(Path::new("a"), 3, 3).is_ok());
        let err = check_entry_size(Path::new("a"), u64::from(u32::MAX - 15), 3).unwrap_err();
        assert!(matches!(err, Error::ArchiveFormat(_)));
    }
}
