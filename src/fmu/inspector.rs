// src/fmu/inspector.rs
//! FMU inspection
//!
//! Reads an FMU straight from the archive, without extracting it, and
//! reports its entries and descriptor.

use crate::error::{Error, Result};
use crate::filesystem::path::sanitize_entry_name;
use crate::fmu::descriptor::ModelDescriptor;
use crate::fmu::extract::{check_entry_size, open_zip, stream_entry};
use crate::fmu::workdir::DESCRIPTOR_FILE;
use sha2::{Digest, Sha256};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// One file stored in the archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectedEntry {
    pub name: String,
    /// Uncompressed size in bytes
    pub size: u64,
    /// Hex SHA-256 of the uncompressed content
    pub sha256: String,
}

/// Inspected FMU data
#[derive(Debug, Clone)]
pub struct InspectedFmu {
    path: PathBuf,
    /// File entries in archive order
    pub entries: Vec<InspectedEntry>,
    pub descriptor: ModelDescriptor,
}

impl InspectedFmu {
    /// Load an FMU from disk
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut archive = open_zip(path)?;
        let mut entries = Vec::new();
        let mut descriptor = None;

        for i in 0..archive.len() {
            let mut file = archive
                .by_index(i)
                .map_err(|e| Error::ArchiveFormat(format!("entry {}: {}", i, e)))?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            sanitize_entry_name(&name)?;

            let is_descriptor = name == DESCRIPTOR_FILE;
            let mut hasher = Sha256::new();
            let mut descriptor_bytes = Vec::new();
            let size = stream_entry(&mut file, Path::new(&name), |chunk| {
                hasher.update(chunk);
                if is_descriptor {
                    descriptor_bytes.extend_from_slice(chunk);
                }
                Ok(())
            })?;
            check_entry_size(Path::new(&name), file.size(), size)?;

            if is_descriptor {
                let text = std::str::from_utf8(&descriptor_bytes)
                    .map_err(|e| Error::DescriptorFormat(format!("not valid UTF-8: {}", e)))?;
                descriptor = Some(ModelDescriptor::parse_str(text)?);
            }

            entries.push(InspectedEntry {
                size,
                sha256: hex::encode(hasher.finalize()),
                name,
            });
        }

        let descriptor = descriptor.ok_or_else(|| Error::MissingDescriptor(path.to_path_buf()))?;

        Ok(Self {
            path: path.to_path_buf(),
            entries,
            descriptor,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entry(&self, name: &str) -> Option<&InspectedEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn entry_names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn total_size(&self) -> u64 {
        self.entries.iter().map(|e| e.size).sum()
    }

    /// Read the content of one entry
    pub fn read_entry(&self, name: &str) -> Result<Vec<u8>> {
        let mut archive = open_zip(&self.path)?;
        let mut file = archive.by_name(name).map_err(|e| match e {
            zip::result::ZipError::FileNotFound => Error::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} not found in {}", name, self.path.display()),
            )),
            other => Error::ArchiveFormat(format!("{}: {}", name, other)),
        })?;
        let mut content = Vec::new();
        file.read_to_end(&mut content)
            .map_err(|e| Error::ArchiveFormat(format!("{}: {}", name, e)))?;
        Ok(content)
    }
}

/// Print identity, variables and entries
pub fn print_summary(fmu: &InspectedFmu) {
    let d = &fmu.descriptor;
    println!("FMU: {}", fmu.path().display());
    println!("FMI Version: {}", d.fmi_version());
    println!("Model Name: {}", d.model_name().unwrap_or("Unknown"));
    println!("GUID: {}", d.guid().unwrap_or("Unknown"));
    if let Some(description) = d.description() {
        println!("Description: {}", description);
    }
    if let Some(tool) = d.generation_tool() {
        println!("Generation tool: {}", tool);
    }
    if let Some(date) = d.generation_date_and_time() {
        println!("Generated: {}", date);
    }

    println!();
    match d.variables() {
        Ok(variables) => {
            println!("Variables ({}):", variables.len());
            for var in variables {
                let causality = var.causality.map(|c| c.as_str()).unwrap_or("-");
                let kind = var.value_type.map(|t| t.to_string()).unwrap_or_default();
                print!("  [{:>3}] {} : {} ({})", var.value_reference, var.name, kind, causality);
                match var.start {
                    Some(start) => println!(" = {}", start),
                    None => println!(),
                }
            }
        }
        Err(e) => println!("Variables: unreadable ({})", e),
    }

    println!();
    println!("Entries ({}, {} bytes):", fmu.entries.len(), fmu.total_size());
    for entry in &fmu.entries {
        println!("  {}  {:>10}  {}", &entry.sha256[..12], entry.size, entry.name);
    }
}
