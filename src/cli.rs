// src/cli.rs
//! CLI definitions for fmurepack
//!
//! This module contains the command-line interface definition using clap.
//! The actual command implementations are in the `commands` module.

use clap::{ArgGroup, Parser};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "fmurepack")]
#[command(version)]
#[command(about = "Repackage FMUs with an MCP server wrapper layer", long_about = None)]
#[command(after_help = "Examples:
  # Repackage an existing FMU
  fmurepack --input vendor.fmu --output vendor_mcp.fmu

  # Create a sample FMU for testing
  fmurepack --create-sample sample_vendor.fmu

  # Repackage with custom MCP configuration
  fmurepack --input vendor.fmu --output vendor_mcp.fmu --mcp-config config.json")]
#[command(group(
    ArgGroup::new("mode")
        .required(true)
        .args(["input", "create_sample", "inspect"])
))]
pub struct Cli {
    /// Path to the existing FMU file
    #[arg(short, long, value_name = "PATH", requires = "output")]
    pub input: Option<PathBuf>,

    /// Path where the repackaged FMU will be saved
    #[arg(short, long, value_name = "PATH", requires = "input")]
    pub output: Option<PathBuf>,

    /// Path to an MCP configuration JSON file merged over the defaults
    #[arg(long, value_name = "PATH", requires = "input")]
    pub mcp_config: Option<PathBuf>,

    /// Let injected resources replace files shipped in the source FMU
    #[arg(long, requires = "input")]
    pub allow_overwrite: bool,

    /// Create a sample vendor FMU for testing
    #[arg(long, value_name = "OUTPUT_PATH", conflicts_with_all = ["input", "inspect"])]
    pub create_sample: Option<PathBuf>,

    /// Print the entries and descriptor of an FMU
    #[arg(long, value_name = "PATH", conflicts_with = "input")]
    pub inspect: Option<PathBuf>,

    /// Log pipeline details
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Log filter requested on the command line, if any
    pub fn log_directive(&self) -> Option<&'static str> {
        if self.verbose {
            Some("debug")
        } else if self.quiet {
            Some("warn")
        } else {
            None
        }
    }
}
