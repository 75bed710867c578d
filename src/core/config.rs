//! Plugin configuration.
//!
//! Precedence, lowest to highest: built-in defaults, the TOML config file,
//! then the `NODERED_API` environment variable. The resolved values are
//! passed to the client constructors explicitly; nothing below this module
//! reads configuration ambiently.

use std::path::Path;

use serde::Deserialize;

use crate::core::error::{Error, Result};

/// Admin API base URL used when nothing is configured.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:1880";

/// Config file consulted when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/nodered-sm-plugin/config.toml";

/// Environment variable overriding the configured API base URL.
pub const API_ENV_VAR: &str = "NODERED_API";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PluginConfig {
    #[serde(default)]
    pub nodered: NoderedConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NoderedConfig {
    /// Base URL of the engine's admin HTTP API.
    #[serde(default = "default_api_url")]
    pub api: String,
}

impl Default for NoderedConfig {
    fn default() -> Self {
        Self {
            api: default_api_url(),
        }
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

impl PluginConfig {
    /// Loads configuration, preferring `path` when given.
    ///
    /// An explicitly passed path must exist and parse. The default path is
    /// optional: when it is absent the built-in defaults apply.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(explicit) => Self::from_file(explicit)?,
            None => {
                let default = Path::new(DEFAULT_CONFIG_PATH);
                if default.exists() {
                    Self::from_file(default)?
                } else {
                    Self::default()
                }
            }
        };
        if let Ok(url) = std::env::var(API_ENV_VAR) {
            if !url.is_empty() {
                config.nodered.api = url;
            }
        }
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::internal_io(e.to_string(), Some(format!("read {}", path.display())))
        })?;
        toml::from_str(&content)
            .map_err(|e| Error::config_invalid_value(path.display().to_string(), e.to_string()))
    }

    /// Base URL handed to the client constructors.
    pub fn api_base_url(&self) -> &str {
        &self.nodered.api
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorCode;
    use std::io::Write;
    use std::sync::{Mutex, MutexGuard};

    // `load` reads NODERED_API, so tests touching the environment must not
    // overlap with the others.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn env_lock() -> MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults_point_at_local_engine() {
        let config = PluginConfig::default();
        assert_eq!(config.api_base_url(), "http://127.0.0.1:1880");
    }

    #[test]
    fn file_value_overrides_default() {
        let _guard = env_lock();
        let file = write_config("[nodered]\napi = \"http://10.0.0.5:1880\"\n");
        let config = PluginConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.api_base_url(), "http://10.0.0.5:1880");
    }

    #[test]
    fn file_without_nodered_section_falls_back_to_default() {
        let _guard = env_lock();
        let file = write_config("# empty on purpose\n");
        let config = PluginConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.api_base_url(), DEFAULT_API_URL);
    }

    #[test]
    fn unparseable_file_is_a_config_error() {
        let _guard = env_lock();
        let file = write_config("[nodered\napi = ???\n");
        let err = PluginConfig::load(Some(file.path())).unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigInvalidValue);
    }

    #[test]
    fn missing_explicit_file_is_an_io_error() {
        let _guard = env_lock();
        let err = PluginConfig::load(Some(Path::new("/nonexistent/config.toml"))).unwrap_err();
        assert_eq!(err.code, ErrorCode::InternalIoError);
    }

    #[test]
    fn environment_variable_wins_over_file() {
        let _guard = env_lock();
        let file = write_config("[nodered]\napi = \"http://10.0.0.5:1880\"\n");
        std::env::set_var(API_ENV_VAR, "http://10.9.9.9:1880");
        let config = PluginConfig::load(Some(file.path())).unwrap();
        std::env::remove_var(API_ENV_VAR);
        assert_eq!(config.api_base_url(), "http://10.9.9.9:1880");
    }
}
