//! Plugin configuration.
//!
//! A small JSON document beside the registry snapshot. Missing file means
//! first run: the default configuration is written out so admins have
//! something to edit, mirroring the registry bootstrap.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Runtime configuration for the plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginConfig {
    /// Global feature toggle. When off, every command except read-only
    /// listing answers a fixed disabled response.
    pub enabled: bool,
    /// When on, the seeded "Friendly"/"Neutral" groups cannot be deleted.
    /// Off by default: the registry model itself never protected them.
    pub protect_builtin_groups: bool,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            protect_builtin_groups: false,
        }
    }
}

/// Errors from reading or writing the configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config I/O error: {0}")]
    Io(String),
    #[error("Config parse error: {0}")]
    Parse(String),
}

impl PluginConfig {
    /// Load the configuration, writing the default file when none exists.
    pub async fn load_or_create(path: &Path) -> Result<Self, ConfigError> {
        match tokio::fs::read_to_string(path).await {
            Ok(data) => {
                serde_json::from_str(&data).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "No config found, creating default");
                let config = Self::default();
                config.save(path).await?;
                Ok(config)
            }
            Err(e) => Err(ConfigError::Io(e.to_string())),
        }
    }

    /// Persist the configuration.
    pub async fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| ConfigError::Io(e.to_string()))?;
            }
        }
        let data =
            serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))?;
        tokio::fs::write(path, data)
            .await
            .map_err(|e| ConfigError::Io(e.to_string()))?;
        tracing::info!(path = %path.display(), "Configuration saved");
        Ok(())
    }

    /// Apply environment variable overrides to loaded settings.
    ///
    /// Supported:
    /// - BEACON_ENABLED: override the global feature toggle (true/false/1/0)
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("BEACON_ENABLED") {
            match val.to_ascii_lowercase().as_str() {
                "true" | "1" => {
                    self.enabled = true;
                    tracing::info!("Applied BEACON_ENABLED=true environment override");
                }
                "false" | "0" => {
                    self.enabled = false;
                    tracing::info!("Applied BEACON_ENABLED=false environment override");
                }
                other => {
                    tracing::warn!(val = %other, "BEACON_ENABLED is not a boolean, ignoring");
                }
            }
        }
    }
}
