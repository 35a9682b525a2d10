// src/filesystem/mod.rs

//! Filesystem helpers for FMU working trees
//!
//! Entry-name sanitization on the way in and portable entry naming on the
//! way out of an archive.

pub mod path;

pub use path::{archive_entry_name, sanitize_entry_name};
