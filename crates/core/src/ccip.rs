// EIP-3668 offchain lookups (CCIP-read)
//
// A contract that needs offchain data reverts with `OffchainLookup`; the
// caller fetches the answer from one of the listed gateways and calls the
// contract back with it.

use std::time::Duration;

use alloy::dyn_abi::DynSolValue;
use alloy::primitives::Address;
use alloy::sol;
use alloy::sol_types::SolError;
use serde::Deserialize;

use crate::ens::CallClient;
use crate::error::{EthError, EthResult};
use crate::hashing::{bytes_to_hex, hex_to_bytes};

/// Gateway round trips allowed for one call.
pub const MAX_OFFCHAIN_LOOKUPS: usize = 4;

sol! {
    error OffchainLookup(
        address sender,
        string[] urls,
        bytes callData,
        bytes4 callbackFunction,
        bytes extraData
    );
}

/// Answers offchain lookups for a contract.
#[async_trait::async_trait]
pub trait OffchainGateway: Send + Sync {
    /// Fetch the response for `call_data` from the first gateway in `urls`
    /// that answers.
    async fn fetch(&self, sender: Address, urls: &[String], call_data: &[u8]) -> EthResult<Vec<u8>>;
}

/// [`OffchainGateway`] over HTTP.
///
/// URLs containing `{data}` are fetched with GET after substituting
/// `{sender}` and `{data}`; all others receive a JSON POST of
/// `{"data", "sender"}`. Either way the gateway answers `{"data": "0x.."}`.
pub struct HttpGateway {
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct GatewayResponse {
    data: String,
}

impl HttpGateway {
    pub fn new(timeout: Duration) -> EthResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("ethkit/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self { client })
    }

    async fn fetch_from(&self, url: &str, sender: &str, data: &str) -> EthResult<Vec<u8>> {
        let target = url.replace("{sender}", sender).replace("{data}", data);

        let request = if url.contains("{data}") {
            self.client.get(&target)
        } else {
            self.client
                .post(&target)
                .json(&serde_json::json!({ "data": data, "sender": sender }))
        };

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EthError::Gateway(format!("{target} returned {status}: {body}")));
        }

        let body: GatewayResponse = response.json().await?;
        hex_to_bytes(&body.data)
    }
}

#[async_trait::async_trait]
impl OffchainGateway for HttpGateway {
    async fn fetch(&self, sender: Address, urls: &[String], call_data: &[u8]) -> EthResult<Vec<u8>> {
        let sender = bytes_to_hex(sender.as_slice());
        let data = bytes_to_hex(call_data);

        let mut failures = Vec::new();
        for url in urls {
            match self.fetch_from(url, &sender, &data).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    tracing::warn!(%url, error = %e, "Gateway request failed");
                    failures.push(e.to_string());
                }
            }
        }

        if failures.is_empty() {
            return Err(EthError::Gateway("no gateway URLs given".to_string()));
        }
        Err(EthError::Gateway(failures.join("; ")))
    }
}

/// `eth_call` that follows `OffchainLookup` reverts through `gateway`.
pub async fn call_with_offchain_lookup(
    client: &dyn CallClient,
    gateway: &dyn OffchainGateway,
    to: Address,
    data: Vec<u8>,
) -> EthResult<Vec<u8>> {
    let mut data = data;

    for _ in 0..MAX_OFFCHAIN_LOOKUPS {
        let revert = match client.call(to, data).await {
            Err(EthError::Revert(revert)) if revert.starts_with(&OffchainLookup::SELECTOR) => revert,
            other => return other,
        };

        let lookup =
            OffchainLookup::abi_decode(&revert).map_err(|e| EthError::Decoding(e.to_string()))?;
        if lookup.sender != to {
            return Err(EthError::Gateway(format!(
                "lookup sender {} does not match called contract {}",
                lookup.sender, to
            )));
        }

        tracing::debug!(%to, urls = ?lookup.urls, "Following offchain lookup");
        let response = gateway
            .fetch(lookup.sender, &lookup.urls, &lookup.callData)
            .await?;

        data = lookup.callbackFunction.to_vec();
        data.extend(
            DynSolValue::Tuple(vec![
                DynSolValue::Bytes(response),
                DynSolValue::Bytes(lookup.extraData.to_vec()),
            ])
            .abi_encode_params(),
        );
    }

    Err(EthError::Gateway(format!(
        "gave up after {MAX_OFFCHAIN_LOOKUPS} offchain lookups"
    )))
}
