//! `nodered-project` command family: git-backed projects on the engine.

use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use serde::Deserialize;

use crate::commands::EXIT_NOT_SUPPORTED;
use crate::core::config::PluginConfig;
use crate::core::error::{Error, Result};
use crate::core::nodered::client::Client;

#[derive(Args)]
pub struct ProjectArgs {
    #[command(subcommand)]
    command: ProjectCommand,
}

#[derive(Subcommand)]
enum ProjectCommand {
    /// Wait for project mode to become reachable
    Prepare,
    /// Clone or update a git-backed project and make it active
    Install {
        /// Project name on the engine
        module_name: String,
        /// Accepted for contract compatibility; the checkout follows git
        #[arg(long)]
        module_version: Option<String>,
        /// Description file naming the git repository
        #[arg(long)]
        file: PathBuf,
    },
    /// Delete a project
    Remove {
        /// Project name to delete
        module_name: String,
        /// Accepted for contract compatibility
        #[arg(long)]
        module_version: Option<String>,
    },
    /// Batch updates (not supported)
    UpdateList,
    /// List projects as `name<TAB>version` lines
    List,
    /// Finalize an install/remove sequence
    Finalize,
}

/// Description file handed to `install`: names the git repository the
/// project is cloned from.
#[derive(Debug, Deserialize)]
struct ProjectDescription {
    #[serde(default)]
    repo: String,
}

pub fn run(args: ProjectArgs, config: &PluginConfig) -> Result<i32> {
    match args.command {
        ProjectCommand::Prepare => prepare(config),
        ProjectCommand::Finalize => Ok(0),
        ProjectCommand::Install {
            module_name, file, ..
        } => install(config, &module_name, &file),
        ProjectCommand::Remove { module_name, .. } => remove(config, &module_name),
        ProjectCommand::UpdateList => {
            log_status!("project", "update-list is not supported");
            Ok(EXIT_NOT_SUPPORTED)
        }
        ProjectCommand::List => list(config),
    }
}

/// Probes the project listing until the engine answers.
///
/// Fails when project mode is disabled, which the agent surfaces before it
/// attempts any install.
pub fn prepare(config: &PluginConfig) -> Result<i32> {
    let client = Client::with_retries(config.api_base_url());
    client.project_list()?;
    Ok(0)
}

/// Clones the project when it is new, otherwise activates it and pulls the
/// latest changes. Either way the project ends up active.
pub fn install(config: &PluginConfig, name: &str, file: &Path) -> Result<i32> {
    let description = read_description(file)?;
    let client = Client::with_retries(config.api_base_url());

    let projects = client.project_list()?;
    if projects.contains(name) {
        log_status!("project", "Updating existing project {}", name);
        client.project_set_active(name, true)?;
        client.project_pull(name)?;
    } else {
        log_status!("project", "Cloning {} from {}", name, description.repo);
        client.project_clone(name, &description.repo)?;
        client.project_set_active(name, true)?;
    }

    log_status!("project", "Installed {}", name);
    Ok(0)
}

/// Deletes the project. The engine refuses to delete the active project;
/// that refusal propagates as the command's error.
pub fn remove(config: &PluginConfig, name: &str) -> Result<i32> {
    let client = Client::with_retries(config.api_base_url());
    client.project_delete(name)?;
    log_status!("project", "Removed {}", name);
    Ok(0)
}

/// Prints one `name<TAB>version` line per project, sorted by name.
///
/// Only the active project has flows deployed, so only it gets a real
/// version; the rest are reported as `inactive`. An unreachable admin API
/// is downgraded to a warning with an empty listing.
pub fn list(config: &PluginConfig) -> Result<i32> {
    let client = Client::new(config.api_base_url());
    let listing = match client.project_list() {
        Ok(listing) => listing,
        Err(e) => {
            log_status!("project", "Admin API is not yet available: {}", e);
            return Ok(0);
        }
    };

    let mut names = listing.projects.clone();
    names.sort();
    for name in &names {
        if listing.is_active(name) {
            let project = client.project_get(name)?;
            println!("{}\t{}", name, project.version.unwrap_or_default());
        } else {
            println!("{}\tinactive", name);
        }
    }
    Ok(0)
}

fn read_description(path: &Path) -> Result<ProjectDescription> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::internal_io(e.to_string(), Some(format!("read {}", path.display())))
    })?;
    let description: ProjectDescription = serde_json::from_str(&content).map_err(|e| {
        Error::internal_json(e.to_string(), Some(format!("parse {}", path.display())))
    })?;
    if description.repo.is_empty() {
        return Err(Error::validation_invalid_argument(
            "file",
            format!("{} does not name a git repository (repo)", path.display()),
        ));
    }
    Ok(description)
}
