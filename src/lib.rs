// src/lib.rs

//! fmurepack: FMU repackaging
//!
//! Takes an existing FMU (Functional Mock-up Unit) and produces a new one
//! that keeps every original file byte for byte while adding MCP wrapper
//! variables to the model description and MCP resources under
//! `resources/`.
//!
//! # Architecture
//!
//! - Scoped working trees: each run extracts into its own temporary
//!   directory, removed on every exit path
//! - Lossless descriptor handling: untouched markup survives a round trip
//! - Atomic output: archives are staged beside the destination and renamed
//!   into place

mod error;
pub mod filesystem;
pub mod fmu;

pub use error::{Error, Result};
pub use fmu::{repackage, OutputArchive, RepackageConfig, Repackager};
