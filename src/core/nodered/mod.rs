//! Client and wire model for the flow engine's admin HTTP API.

pub mod client;
pub mod flow;
pub mod project;

// Re-export common types for convenience
pub use client::{Client, RetryPolicy};
pub use flow::{Flow, FlowEnv, FlowsEnvelope};
pub use project::{Project, ProjectBranches, ProjectList, ProjectStatus};
