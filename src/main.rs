// src/main.rs

mod cli;
mod commands;

use clap::Parser;
use cli::Cli;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // Help and version requests are not failures
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    // Initialize tracing subscriber for logging
    let filter = match cli.log_directive() {
        Some(directive) => EnvFilter::new(directive),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match commands::run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", render_error(&e));
            ExitCode::FAILURE
        }
    }
}

/// Format a failure as `error[<Kind>]: <message>`
fn render_error(err: &anyhow::Error) -> String {
    match err.downcast_ref::<fmurepack::Error>() {
        Some(inner) => format!("error[{}]: {:#}", inner.kind(), err),
        None => format!("error: {:#}", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use clap::error::ErrorKind;
    use std::path::PathBuf;

    #[test]
    fn test_parse_repackage() {
        let cli = Cli::try_parse_from([
            "fmurepack",
            "-i",
            "vendor.fmu",
            "-o",
            "out/vendor_mcp.fmu",
            "--mcp-config",
            "config.json",
        ])
        .unwrap();
        assert_eq!(cli.input, Some(PathBuf::from("vendor.fmu")));
        assert_eq!(cli.output, Some(PathBuf::from("out/vendor_mcp.fmu")));
        assert_eq!(cli.mcp_config, Some(PathBuf::from("config.json")));
        assert!(!cli.allow_overwrite);
        assert_eq!(cli.log_directive(), None);
    }

    #[test]
    fn test_parse_create_sample() {
        let cli = Cli::try_parse_from(["fmurepack", "--create-sample", "sample.fmu", "-v"]).unwrap();
        assert_eq!(cli.create_sample, Some(PathBuf::from("sample.fmu")));
        assert_eq!(cli.log_directive(), Some("debug"));
    }

    #[test]
    fn test_input_requires_output() {
        let err = Cli::try_parse_from(["fmurepack", "--input", "vendor.fmu"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        assert!(err.use_stderr());
    }

    #[test]
    fn test_mode_required() {
        let err = Cli::try_parse_from(["fmurepack"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_create_sample_conflicts_with_input() {
        let err = Cli::try_parse_from([
            "fmurepack",
            "--create-sample",
            "s.fmu",
            "-i",
            "a.fmu",
            "-o",
            "b.fmu",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_help_is_not_a_failure() {
        let err = Cli::try_parse_from(["fmurepack", "--help"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        assert!(!err.use_stderr());
    }

    #[test]
    fn test_render_error_names_kind() {
        let err = anyhow::Error::new(fmurepack::Error::DuplicateName("mcp_server_status".into()));
        assert_eq!(
            render_error(&err),
            "error[DuplicateNameError]: variable name already declared: mcp_server_status"
        );

        let wrapped = Err::<(), _>(fmurepack::Error::InvalidConfig("bad".into()))
            .context("Failed to load MCP config: c.json")
            .unwrap_err();
        assert!(render_error(&wrapped).starts_with("error[ConfigError]: Failed to load MCP config"));

        let plain = anyhow::anyhow!("boom");
        assert_eq!(render_error(&plain), "error: boom");
    }
}
