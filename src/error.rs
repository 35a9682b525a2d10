// src/error.rs

//! Error types shared by every stage of the repackaging pipeline
//!
//! Each stage fails with one of these variants and the orchestrator passes
//! it through untouched, so callers can match on the stage-specific kind.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias for repackaging operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while extracting, patching, or rebuilding an FMU
#[derive(Error, Debug)]
pub enum Error {
    /// Source archive path does not exist
    #[error("source archive not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Archive cannot be opened, is corrupt, or contains unsafe entries
    #[error("invalid archive: {0}")]
    ArchiveFormat(String),

    /// No modelDescription.xml at the root of the extracted tree
    #[error("modelDescription.xml not found in {}", .0.display())]
    MissingDescriptor(PathBuf),

    /// modelDescription.xml is not well-formed markup
    #[error("malformed model description: {0}")]
    DescriptorFormat(String),

    /// An injected variable name already exists in the descriptor
    #[error("variable name already declared: {0}")]
    DuplicateName(String),

    /// Injected resource would replace a file not created by this operation
    #[error("resource already exists: {}", .0.display())]
    ResourceConflict(PathBuf),

    /// Output archive could not be assembled
    #[error("failed to write archive {}: {message}", .path.display())]
    Write { path: PathBuf, message: String },

    /// Caller-supplied configuration is unusable
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Local filesystem failure while mutating the working tree
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Taxonomy name for user-facing diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NotFoundError",
            Self::ArchiveFormat(_) => "ArchiveFormatError",
            Self::MissingDescriptor(_) => "MissingDescriptorError",
            Self::DescriptorFormat(_) => "DescriptorFormatError",
            Self::DuplicateName(_) => "DuplicateNameError",
            Self::ResourceConflict(_) => "ResourceConflictError",
            Self::Write { .. } => "WriteError",
            Self::InvalidConfig(_) => "ConfigError",
            Self::Io(_) => "IoError",
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, message: impl std::fmt::Display) -> Self {
        Self::Write {
            path: path.into(),
            message: message.to_string(),
        }
    }
}
