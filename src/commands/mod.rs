//! CLI command families for the software-management contract.
//!
//! Both families expose the same six subcommands the device-management
//! agent drives: prepare, install, remove, update-list, list, finalize.
//! Machine-readable output goes to stdout, status lines to stderr, and the
//! outcome is the process exit code.

use std::path::Path;

use serde_json::Value;

use crate::core::error::{Error, Result};

pub mod flows;
pub mod project;

/// Exit code telling the agent a command is not implemented, making it fall
/// back to individual install/remove calls.
pub const EXIT_NOT_SUPPORTED: i32 = 1;

pub(crate) fn read_json_file(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::internal_io(e.to_string(), Some(format!("read {}", path.display())))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        Error::internal_json(e.to_string(), Some(format!("parse {}", path.display())))
    })
}
