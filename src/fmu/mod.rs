// src/fmu/mod.rs
//! FMU repackaging
//!
//! This module implements the FMU (Functional Mock-up Unit) repackaging
//! pipeline:
//! - Archive extraction into a scoped working tree
//! - Descriptor (modelDescription.xml) parsing and serialization
//! - Variable injection and provenance annotation
//! - MCP wrapper resource injection
//! - Archive rebuilding with atomic replacement
//! - Sample synthesis and read-only inspection

pub mod builder;
pub mod config;
pub mod descriptor;
pub mod extract;
pub mod inspector;
pub mod mcp;
pub mod mutate;
pub mod repackage;
pub mod resources;
pub mod sample;
pub mod workdir;
pub mod xml;

pub use builder::{build, OutputArchive};
pub use config::{wrapper_variables, RepackageConfig};
pub use descriptor::{
    parse, write, Causality, ModelDescriptor, ScalarType, Variability, VariableDeclaration,
};
pub use extract::{extract, SourceArchive};
pub use inspector::{InspectedEntry, InspectedFmu};
pub use mcp::{McpConfig, CONFIG_FILE, README_FILE, WRAPPER_FILE};
pub use mutate::{annotate_metadata, inject_variables, MetadataStamp, TypedValue, VariableSpec};
pub use repackage::{repackage, Repackager};
pub use resources::{inject, InjectedResource};
pub use sample::create_sample;
pub use workdir::{WorkingTree, DESCRIPTOR_FILE, RESOURCES_DIR};
