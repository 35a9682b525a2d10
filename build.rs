// build.rs

use clap::{Arg, ArgAction, ArgGroup, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

fn path_arg(id: &'static str, long: &'static str, help: &'static str) -> Arg {
    Arg::new(id).long(long).value_name("PATH").help(help)
}

fn build_cli() -> Command {
    Command::new("fmurepack")
        .version(env!("CARGO_PKG_VERSION"))
        .author("fmurepack Contributors")
        .about("Repackage FMUs with an MCP server wrapper layer")
        .arg(path_arg("input", "input", "Path to the existing FMU file").short('i'))
        .arg(
            path_arg("output", "output", "Path where the repackaged FMU will be saved")
                .short('o'),
        )
        .arg(path_arg(
            "mcp_config",
            "mcp-config",
            "Path to an MCP configuration JSON file merged over the defaults",
        ))
        .arg(
            Arg::new("allow_overwrite")
                .long("allow-overwrite")
                .action(ArgAction::SetTrue)
                .help("Let injected resources replace files shipped in the source FMU"),
        )
        .arg(
            path_arg("create_sample", "create-sample", "Create a sample vendor FMU for testing")
                .value_name("OUTPUT_PATH"),
        )
        .arg(path_arg("inspect", "inspect", "Print the entries and descriptor of an FMU"))
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Log pipeline details"),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .action(ArgAction::SetTrue)
                .help("Only log warnings and errors"),
        )
        .group(
            ArgGroup::new("mode")
                .required(true)
                .args(["input", "create_sample", "inspect"]),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();

    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("fmurepack.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
