//! Wire model for flow tabs as the admin API serves them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Env entry carrying the installed module's name.
pub const MODULE_NAME_KEY: &str = "MODULE_NAME";
/// Env entry carrying the installed module's version.
pub const MODULE_VERSION_KEY: &str = "MODULE_VERSION";

/// Env entry type for plain string values.
pub const ENV_TYPE_STR: &str = "str";

/// Node type marking a top-level flow tab.
const TAB_TYPE: &str = "tab";

/// Revision characters used as a fallback version for untagged flows.
const REVISION_PREFIX_LEN: usize = 8;

pub fn is_tab(node_type: &str) -> bool {
    node_type == TAB_TYPE
}

/// One `env` entry on a flow tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowEnv {
    pub name: String,
    pub value: String,
    #[serde(rename = "type")]
    pub entry_type: String,
}

impl FlowEnv {
    pub fn str(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            entry_type: ENV_TYPE_STR.to_string(),
        }
    }
}

/// A flow tab, decoded from the engine's flow listing.
///
/// `revision` is not part of the tab itself; the client stamps it from the
/// listing's deployment revision so version fallbacks have something to work
/// with.
#[derive(Debug, Clone, Deserialize)]
pub struct Flow {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub info: String,
    #[serde(default)]
    pub env: Vec<FlowEnv>,
    #[serde(skip)]
    pub revision: String,
}

impl Flow {
    /// Module name of this flow: the first `MODULE_NAME` env entry, falling
    /// back to the tab label.
    pub fn name(&self) -> String {
        for entry in &self.env {
            if entry.name == MODULE_NAME_KEY {
                return entry.value.clone();
            }
        }
        self.label.clone()
    }

    /// Module version of this flow: the first `MODULE_VERSION` env entry,
    /// falling back to a short prefix of the deployment revision.
    pub fn version(&self) -> String {
        for entry in &self.env {
            if entry.name == MODULE_VERSION_KEY {
                return entry.value.clone();
            }
        }
        self.revision.chars().take(REVISION_PREFIX_LEN).collect()
    }
}

/// Envelope for `GET /flows` and `POST /flows` under API version v2.
///
/// Serves both directions: decoding a listing (`flows` is the node array,
/// `rev` the deployment revision) and encoding a replacement request, where
/// an empty `rev` is omitted so the engine does not run its conflict check.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlowsEnvelope {
    #[serde(default)]
    pub flows: Value,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub rev: String,
}
