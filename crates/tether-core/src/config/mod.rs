//! Namespace configuration for tether
//!
//! Controller endpoints, credentials, and locally provisioned agent
//! metadata are grouped into namespaces and persisted as one TOML file.

mod namespace;
mod store;

pub use namespace::{AgentRecord, ControllerProfile, Namespace};
pub use store::ConfigStore;

use crate::error::ConfigError;
use std::path::{Path, PathBuf};

/// Get the default configuration directory
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tether")
}

/// Get the default namespace file path
pub fn default_config_path() -> PathBuf {
    default_config_dir().join("namespaces.toml")
}

/// Load a TOML configuration file
pub fn load_config<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Invalid(format!("Cannot read {}: {}", path.display(), e)))?;

    Ok(toml::from_str(&content)?)
}

/// Save a TOML configuration file, creating parent directories as needed
pub fn save_config<T: serde::Serialize>(path: &Path, config: &T) -> Result<(), ConfigError> {
    let content = toml::to_string_pretty(config)?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            ConfigError::Invalid(format!("Cannot create {}: {}", parent.display(), e))
        })?;
    }

    std::fs::write(path, content)
        .map_err(|e| ConfigError::Invalid(format!("Cannot write {}: {}", path.display(), e)))?;

    Ok(())
}
