// src/commands.rs
//! Command handlers for the fmurepack CLI

use crate::cli::Cli;
use anyhow::{Context, Result};
use fmurepack::fmu::inspector::{self, InspectedFmu};
use fmurepack::fmu::{self, OutputArchive, RepackageConfig};
use std::fs;
use std::path::Path;
use tracing::info;

/// Dispatch to the mode selected on the command line
pub fn run(cli: &Cli) -> Result<()> {
    if let Some(path) = &cli.create_sample {
        return cmd_create_sample(path);
    }
    if let Some(path) = &cli.inspect {
        return cmd_inspect(path);
    }
    match (&cli.input, &cli.output) {
        (Some(input), Some(output)) => {
            cmd_repackage(input, output, cli.mcp_config.as_deref(), cli.allow_overwrite)
        }
        _ => anyhow::bail!("--input and --output are required (or use --create-sample)"),
    }
}

/// Load a JSON override document from disk
pub fn load_overrides(path: &Path) -> Result<serde_json::Map<String, serde_json::Value>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read MCP config: {}", path.display()))?;
    let overrides = RepackageConfig::parse_overrides(&text)
        .with_context(|| format!("Failed to load MCP config: {}", path.display()))?;
    Ok(overrides)
}

/// Repackage `input` into `output`
pub fn cmd_repackage(
    input: &Path,
    output: &Path,
    mcp_config: Option<&Path>,
    allow_overwrite: bool,
) -> Result<()> {
    let mut config = RepackageConfig::new().allow_overwrite(allow_overwrite);
    if let Some(path) = mcp_config {
        info!("Loading MCP config from {}", path.display());
        config = config.with_overrides(load_overrides(path)?);
    }

    let archive = fmu::repackage(input, output, &config)?;

    println!("Repackaging completed successfully");
    println!("Input FMU:  {}", input.display());
    print_archive(&archive);
    Ok(())
}

/// Write the sample vendor FMU to `path`
pub fn cmd_create_sample(path: &Path) -> Result<()> {
    let archive = fmu::create_sample(path)?;
    println!("Created sample FMU");
    print_archive(&archive);
    Ok(())
}

/// Print the contents of an FMU
pub fn cmd_inspect(path: &Path) -> Result<()> {
    let fmu = InspectedFmu::from_file(path)?;
    inspector::print_summary(&fmu);
    Ok(())
}

fn print_archive(archive: &OutputArchive) {
    println!("Output FMU: {}", archive.path.display());
    println!("Entries:    {}", archive.entries);
    println!("Size:       {:.2} KB", archive.size as f64 / 1024.0);
}
