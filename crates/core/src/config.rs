// Ethereum endpoint configuration shared by the MCP and HTTP binaries

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const ENV_RPC_URL: &str = "ETHKIT_RPC_URL";
pub const ENV_ABI_SERVICE_URL: &str = "ETHKIT_ABI_SERVICE_URL";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "ETHKIT_REQUEST_TIMEOUT_SECS";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EthereumConfig {
    /// Mainnet JSON-RPC endpoint used for ENS lookups
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,

    /// Base URL of the contract ABI lookup service
    #[serde(default = "default_abi_service_url")]
    pub abi_service_url: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_rpc_url() -> String {
    "https://eth.merkle.io".to_string()
}

fn default_abi_service_url() -> String {
    "https://abidata.net".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for EthereumConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            abi_service_url: default_abi_service_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl EthereumConfig {
    /// Apply `ETHKIT_*` environment overrides on top of file/default values
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(ENV_RPC_URL) {
            self.rpc_url = url;
        }
        if let Some(url) = lookup(ENV_ABI_SERVICE_URL) {
            self.abi_service_url = url;
        }
        if let Some(secs) = lookup(ENV_REQUEST_TIMEOUT_SECS) {
            match secs.parse() {
                Ok(secs) => self.request_timeout_secs = secs,
                Err(_) => tracing::warn!(
                    "Ignoring {}={:?}: not a number of seconds",
                    ENV_REQUEST_TIMEOUT_SECS,
                    secs
                ),
            }
        }
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
