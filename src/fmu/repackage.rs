// src/fmu/repackage.rs

//! Repackaging orchestrator
//!
//! Runs the six pipeline stages in a fixed order over one working tree:
//! extract, parse, inject variables and annotate metadata, inject
//! resources, write the descriptor, build the archive. The first failing
//! stage aborts the run and its error is returned as-is. The working tree
//! is removed on every exit path because it is dropped when this function
//! returns or unwinds.

use crate::error::Result;
use crate::fmu::builder::{self, OutputArchive};
use crate::fmu::config::RepackageConfig;
use crate::fmu::descriptor;
use crate::fmu::extract::{self, SourceArchive};
use crate::fmu::mcp::{self, ResourceContext};
use crate::fmu::mutate::{self, MetadataStamp};
use crate::fmu::resources;
use chrono::Utc;
use std::path::Path;
use tracing::info;

/// Repackages FMUs with a fixed configuration
#[derive(Debug, Clone, Default)]
pub struct Repackager {
    config: RepackageConfig,
}

impl Repackager {
    pub fn new(config: RepackageConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RepackageConfig {
        &self.config
    }

    /// Repackage the FMU at `source` into `destination`
    pub fn repackage(
        &self,
        source: impl AsRef<Path>,
        destination: impl AsRef<Path>,
    ) -> Result<OutputArchive> {
        let source = SourceArchive::new(source)?;
        let destination = destination.as_ref();
        let config = &self.config;
        config.validate()?;
        let timestamp = config.timestamp.unwrap_or_else(Utc::now);

        info!(
            "Repackaging {} -> {}",
            source.path().display(),
            destination.display()
        );

        let mut tree = extract::extract(&source)?;
        let parsed = descriptor::parse(&tree)?;

        let injected = mutate::inject_variables(&parsed, &config.effective_variables())?;
        let annotated = mutate::annotate_metadata(
            &injected,
            &MetadataStamp {
                description_suffix: config.description_suffix.clone(),
                generation_tool: config.tool_stamp.clone(),
                timestamp,
            },
        );

        let original_fmu = source.file_name();
        let output_fmu = destination
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let context = ResourceContext {
            original_fmu: &original_fmu,
            output_fmu: &output_fmu,
            fmi_version: annotated.fmi_version(),
            timestamp,
        };
        let wrapper = mcp::wrapper_resources(config, &context)?;
        resources::inject(&mut tree, &wrapper, config.allow_overwrite)?;

        descriptor::write(&tree, &annotated)?;
        let archive = builder::build(&tree, destination)?;

        tree.close();
        info!("Repackaging completed: {}", archive.path.display());
        Ok(archive)
    }
}

/// Repackage `source` into `destination` with `config`
pub fn repackage(
    source: impl AsRef<Path>,
    destination: impl AsRef<Path>,
    config: &RepackageConfig,
) -> Result<OutputArchive> {
    Repackager::new(config.clone()).repackage(source, destination)
}
