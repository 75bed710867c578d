use std::ffi::OsString;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use nodered_sm_plugin::commands::{flows, project};
use nodered_sm_plugin::config::PluginConfig;
use nodered_sm_plugin::log_status;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Symlink names the management agent installs for this binary; invoking
/// one behaves like the matching subcommand.
const FAMILY_NAMES: [&str; 2] = ["nodered-flows", "nodered-project"];

#[derive(Parser)]
#[command(name = "nodered-sm-plugin")]
#[command(version = VERSION)]
#[command(about = "Software management plugin for Node-RED flows and projects")]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage flow modules deployed to the engine
    NoderedFlows(flows::FlowsArgs),
    /// Manage git-backed projects on the engine
    NoderedProject(project::ProjectArgs),
}

/// Rewrites argv for multicall dispatch: when argv[0] is one of the family
/// symlinks, the family subcommand is spliced in after it.
fn multicall_args() -> Vec<OsString> {
    let mut args: Vec<OsString> = std::env::args_os().collect();
    let family = args
        .first()
        .map(Path::new)
        .and_then(Path::file_name)
        .and_then(|name| name.to_str())
        .filter(|name| FAMILY_NAMES.contains(name))
        .map(OsString::from);
    if let Some(family) = family {
        args.insert(1, family);
    }
    args
}

fn run(cli: Cli) -> nodered_sm_plugin::Result<i32> {
    let config = PluginConfig::load(cli.config.as_deref())?;
    match cli.command {
        Commands::NoderedFlows(args) => flows::run(args, &config),
        Commands::NoderedProject(args) => project::run(args, &config),
    }
}

fn main() -> std::process::ExitCode {
    let cli = match Cli::try_parse_from(multicall_args()) {
        Ok(cli) => cli,
        Err(e) => e.exit(),
    };

    match run(cli) {
        Ok(code) => std::process::ExitCode::from(exit_code_to_u8(code)),
        Err(e) => {
            log_status!("error", "{} ({})", e, e.code.as_str());
            std::process::ExitCode::FAILURE
        }
    }
}

fn exit_code_to_u8(code: i32) -> u8 {
    if code <= 0 {
        0
    } else if code >= 255 {
        255
    } else {
        code as u8
    }
}
