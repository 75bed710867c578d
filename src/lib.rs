/// Macro for prefixed status logging to stderr.
///
/// Lines are written unconditionally: the binary is normally driven by a
/// management agent that captures plugin stderr, while stdout stays
/// reserved for machine-readable command output.
///
/// Usage:
/// ```ignore
/// log_status!("flows", "Removing flow {}", flow_id);
/// log_status!("project", "Cloning {} from {}", name, url);
/// ```
#[macro_export]
macro_rules! log_status {
    ($prefix:expr, $($arg:tt)*) => {
        eprintln!(concat!("[", $prefix, "] {}"), format_args!($($arg)*));
    };
}

pub mod commands;
pub mod core;

// Re-export everything from core for ergonomic library use
pub use crate::core::*;
