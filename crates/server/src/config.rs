use anyhow::{Context, Result};
use ethkit_core::EthereumConfig;
use ethkit_mcp::server::McpServer;
use ethkit_mcp::tools::ethereum_registry;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: HttpConfig,

    #[serde(default)]
    pub ethereum: EthereumConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    pub fn load(config_path: &Path) -> Result<Self> {
        // Load config file if it exists, otherwise use defaults
        let mut config: Self = if config_path.exists() {
            let content = std::fs::read_to_string(config_path)
                .context("Failed to read configuration file")?;
            toml::from_str(&content).context("Failed to parse configuration file")?
        } else {
            tracing::info!("Configuration file not found, using defaults");
            Self::default()
        };

        config.ethereum = config.ethereum.with_env_overrides();

        Ok(config)
    }

    /// Socket address to bind
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Shared application state
pub struct AppState {
    pub mcp: McpServer,
}

impl AppState {
    pub fn new(config: &ServerConfig) -> Result<Self> {
        let registry =
            ethereum_registry(&config.ethereum).context("Failed to build tool registry")?;
        tracing::info!("Registered {} tools", registry.len());

        Ok(Self {
            mcp: McpServer::new(registry),
        })
    }
}
