//! Wire model for the admin API's project mode.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Response of `GET /projects`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectList {
    #[serde(default)]
    pub projects: Vec<String>,
    #[serde(default)]
    pub active: Option<String>,
}

impl ProjectList {
    pub fn contains(&self, name: &str) -> bool {
        self.projects.iter().any(|p| p == name)
    }

    pub fn is_active(&self, name: &str) -> bool {
        self.active.as_deref() == Some(name)
    }
}

/// Response of `GET /projects/{name}`.
#[derive(Debug, Clone, Deserialize)]
pub struct Project {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub git: Option<ProjectGit>,
    #[serde(default, rename = "credentialSecret")]
    pub credential_secret: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectGit {
    #[serde(default)]
    pub remotes: BTreeMap<String, GitRemote>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GitRemote {
    #[serde(default)]
    pub url: String,
}

/// Response of `GET /projects/{name}/status`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectStatus {
    /// Per-file working-tree state, keyed by path; kept untyped because the
    /// engine's shape varies with git state.
    #[serde(default)]
    pub files: Map<String, Value>,
    #[serde(default)]
    pub commits: CommitStatus,
    #[serde(default)]
    pub branches: BranchStatus,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct CommitStatus {
    #[serde(default)]
    pub ahead: u64,
    #[serde(default)]
    pub behind: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BranchStatus {
    #[serde(default)]
    pub local: Option<String>,
    #[serde(default)]
    pub remote: Option<String>,
}

/// Response of `GET /projects/{name}/branches`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectBranches {
    #[serde(default)]
    pub branches: Vec<Branch>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Branch {
    pub name: String,
    #[serde(default)]
    pub remote: Option<String>,
    #[serde(default)]
    pub status: Option<CommitStatus>,
    #[serde(default)]
    pub commit: Option<BranchCommit>,
    #[serde(default)]
    pub current: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BranchCommit {
    #[serde(default)]
    pub sha: String,
    #[serde(default)]
    pub subject: String,
}
