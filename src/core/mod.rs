// Public modules
pub mod config;
pub mod error;
pub mod nodered;
pub mod transform;

// Re-export common types for convenience
pub use error::{Error, ErrorCode, Result};
