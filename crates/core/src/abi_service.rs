// Contract ABI lookup through an external ABI service (abidata.net by default)

use std::fmt;
use std::time::Duration;

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::EthResult;

/// Networks the ABI service can look contracts up on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AbiNetwork {
    #[default]
    Mainnet,
    Goerli,
    Sepolia,
    Avalanche,
    AvalancheFuji,
    Arbitrum,
    ArbitrumGoerli,
    ArbitrumNova,
    Base,
    BaseGoerli,
    Bsc,
    BscTestnet,
    Fantom,
    FantomTestnet,
    Polygon,
    PolygonMumbai,
    PolygonZkEvm,
    PolygonZkEvmTestnet,
    Optimism,
    OptimismGoerli,
    Gnosis,
}

impl AbiNetwork {
    pub const ALL: [AbiNetwork; 21] = [
        AbiNetwork::Mainnet,
        AbiNetwork::Goerli,
        AbiNetwork::Sepolia,
        AbiNetwork::Avalanche,
        AbiNetwork::AvalancheFuji,
        AbiNetwork::Arbitrum,
        AbiNetwork::ArbitrumGoerli,
        AbiNetwork::ArbitrumNova,
        AbiNetwork::Base,
        AbiNetwork::BaseGoerli,
        AbiNetwork::Bsc,
        AbiNetwork::BscTestnet,
        AbiNetwork::Fantom,
        AbiNetwork::FantomTestnet,
        AbiNetwork::Polygon,
        AbiNetwork::PolygonMumbai,
        AbiNetwork::PolygonZkEvm,
        AbiNetwork::PolygonZkEvmTestnet,
        AbiNetwork::Optimism,
        AbiNetwork::OptimismGoerli,
        AbiNetwork::Gnosis,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AbiNetwork::Mainnet => "mainnet",
            AbiNetwork::Goerli => "goerli",
            AbiNetwork::Sepolia => "sepolia",
            AbiNetwork::Avalanche => "avalanche",
            AbiNetwork::AvalancheFuji => "avalancheFuji",
            AbiNetwork::Arbitrum => "arbitrum",
            AbiNetwork::ArbitrumGoerli => "arbitrumGoerli",
            AbiNetwork::ArbitrumNova => "arbitrumNova",
            AbiNetwork::Base => "base",
            AbiNetwork::BaseGoerli => "baseGoerli",
            AbiNetwork::Bsc => "bsc",
            AbiNetwork::BscTestnet => "bscTestnet",
            AbiNetwork::Fantom => "fantom",
            AbiNetwork::FantomTestnet => "fantomTestnet",
            AbiNetwork::Polygon => "polygon",
            AbiNetwork::PolygonMumbai => "polygonMumbai",
            AbiNetwork::PolygonZkEvm => "polygonZkEvm",
            AbiNetwork::PolygonZkEvmTestnet => "polygonZkEvmTestnet",
            AbiNetwork::Optimism => "optimism",
            AbiNetwork::OptimismGoerli => "optimismGoerli",
            AbiNetwork::Gnosis => "gnosis",
        }
    }
}

impl fmt::Display for AbiNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source of verified contract ABIs.
#[async_trait::async_trait]
pub trait AbiSource: Send + Sync {
    /// Fetch the ABI document for `address`, returned as the service's JSON.
    async fn fetch_abi(&self, address: Address, network: AbiNetwork) -> EthResult<Value>;
}

/// HTTP client for an abidata-compatible service: `GET {base}/{address}?network={network}`.
pub struct AbiDataClient {
    client: reqwest::Client,
    base_url: String,
}

impl AbiDataClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> EthResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("ethkit/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn abi_url(&self, address: &Address, network: AbiNetwork) -> String {
        format!(
            "{}/{}?network={}",
            self.base_url.trim_end_matches('/'),
            address.to_checksum(None),
            network
        )
    }
}

#[async_trait::async_trait]
impl AbiSource for AbiDataClient {
    async fn fetch_abi(&self, address: Address, network: AbiNetwork) -> EthResult<Value> {
        let url = self.abi_url(&address, network);
        tracing::debug!(%url, "Fetching contract ABI");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        let body: Value = response.json().await?;

        if !status.is_success() {
            tracing::warn!(%url, %status, "ABI service returned an error status");
        }

        Ok(body)
    }
}
