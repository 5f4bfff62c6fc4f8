// Configuration for the stdio MCP binary

use anyhow::{Context, Result};
use ethkit_core::EthereumConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const ENV_CONFIG_PATH: &str = "ETHKIT_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "ethkit.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct McpConfig {
    #[serde(default)]
    pub ethereum: EthereumConfig,
}

impl McpConfig {
    /// Load from `path` if it exists (defaults otherwise), then apply
    /// `ETHKIT_*` environment overrides
    pub fn load(path: &Path) -> Result<Self> {
        let mut config: Self = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read configuration file {}", path.display()))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse configuration file {}", path.display()))?
        } else {
            tracing::info!("Configuration file {} not found, using defaults", path.display());
            Self::default()
        };

        config.ethereum = config.ethereum.with_env_overrides();
        Ok(config)
    }

    /// Path from `ETHKIT_CONFIG`, falling back to `ethkit.toml`
    pub fn default_path() -> std::path::PathBuf {
        std::env::var(ENV_CONFIG_PATH)
            .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
            .into()
    }
}
