//! `nodered-flows` command family: flow modules deployed to the engine.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};

use crate::commands::{read_json_file, EXIT_NOT_SUPPORTED};
use crate::core::config::PluginConfig;
use crate::core::error::{Error, ErrorCode, Result};
use crate::core::nodered::client::Client;
use crate::core::transform::inject_module_identity;

#[derive(Args)]
pub struct FlowsArgs {
    #[command(subcommand)]
    command: FlowsCommand,
}

#[derive(Subcommand)]
enum FlowsCommand {
    /// Prepare for an install/remove sequence
    Prepare,
    /// Deploy a flow file as a named module
    Install {
        /// Module name recorded in the deployed flows
        module_name: String,
        /// Module version recorded alongside the name
        #[arg(long, default_value = "")]
        module_version: String,
        /// Flow file to deploy
        #[arg(long)]
        file: PathBuf,
    },
    /// Remove the flows belonging to a module
    Remove {
        /// Module name whose flows are removed
        module_name: String,
        /// Accepted for contract compatibility; removal is by name only
        #[arg(long)]
        module_version: Option<String>,
    },
    /// Batch updates (not supported)
    UpdateList,
    /// List installed flow modules as `name<TAB>version` lines
    List,
    /// Finalize an install/remove sequence
    Finalize,
}

pub fn run(args: FlowsArgs, config: &PluginConfig) -> Result<i32> {
    match args.command {
        FlowsCommand::Prepare | FlowsCommand::Finalize => Ok(0),
        FlowsCommand::Install {
            module_name,
            module_version,
            file,
        } => install(config, &module_name, &module_version, &file),
        FlowsCommand::Remove { module_name, .. } => remove(config, &module_name),
        FlowsCommand::UpdateList => {
            log_status!("flows", "update-list is not supported");
            Ok(EXIT_NOT_SUPPORTED)
        }
        FlowsCommand::List => list(config),
    }
}

/// Tags the flow file with the module identity and deploys it as the full
/// flow set.
pub fn install(config: &PluginConfig, name: &str, version: &str, file: &Path) -> Result<i32> {
    let client = Client::new(config.api_base_url());
    let document = read_json_file(file)?;
    let (document, tagged) = inject_module_identity(&document, name, version);
    if tagged == 0 {
        log_status!(
            "flows",
            "No flow tabs found in {}; deploying unmodified",
            file.display()
        );
    }
    let envelope = client.set_flows("", &document)?;
    log_status!("flows", "Deployed {} (rev {})", name, envelope.rev);
    Ok(0)
}

/// Deletes every flow whose derived module name matches.
///
/// Every matching flow is attempted even when one deletion fails; failures
/// are collected into a single combined error. A flow that is already gone
/// counts as removed.
pub fn remove(config: &PluginConfig, name: &str) -> Result<i32> {
    let client = Client::new(config.api_base_url());
    let flows = client.get_flows()?;

    let matching: Vec<_> = flows.into_iter().filter(|f| f.name() == name).collect();
    if matching.is_empty() {
        log_status!("flows", "No flows found for {}", name);
        return Ok(0);
    }

    let mut failures = Vec::new();
    for flow in &matching {
        log_status!("flows", "Removing flow {}", flow.id);
        match client.delete_flow(&flow.id) {
            Ok(()) => {}
            Err(e) if e.code == ErrorCode::ApiNotFound => {}
            Err(e) => failures.push((flow.id.clone(), e)),
        }
    }
    if !failures.is_empty() {
        return Err(Error::flow_delete_failed(&failures));
    }

    log_status!("flows", "Removed {}", name);
    Ok(0)
}

/// Prints one `name<TAB>version` line per installed module.
///
/// An unreachable admin API is downgraded to a warning with an empty
/// listing: during boot the agent polls for installed software before the
/// engine is up, and that must not look like a plugin failure.
pub fn list(config: &PluginConfig) -> Result<i32> {
    let client = Client::new(config.api_base_url());
    let flows = match client.get_flows() {
        Ok(flows) => flows,
        Err(e) => {
            log_status!("flows", "Admin API is not yet available: {}", e);
            return Ok(0);
        }
    };

    // Tabs sharing a module name collapse to one line; the last tab wins,
    // mirroring how repeated installs overwrite each other.
    let mut modules = BTreeMap::new();
    for flow in &flows {
        modules.insert(flow.name(), flow.version());
    }
    for (name, version) in modules {
        println!("{}\t{}", name, version);
    }
    Ok(0)
}
