// ENS names: hashing, coin types, and resolution through the Universal Resolver

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{address, keccak256, Address, Bytes, B256, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::sol;
use alloy::sol_types::{SolCall, SolError};
use url::Url;

use crate::ccip::{call_with_offchain_lookup, OffchainGateway};
use crate::error::{EthError, EthResult};
use crate::hashing::bytes_to_hex;

/// ENS Universal Resolver on mainnet.
pub const UNIVERSAL_RESOLVER: Address = address!("0xeEeEEEeE14D718C2B47D9923Deab1335E144EeEe");

/// SLIP-44 coin type of ether.
pub const ETH_COIN_TYPE: u64 = 60;

const EVM_COIN_TYPE_FLAG: u64 = 0x8000_0000;

sol! {
    interface IUniversalResolver {
        function resolve(bytes name, bytes data) external view returns (bytes result, address resolver);
        function reverse(bytes lookupAddress, uint256 coinType) external view returns (string primary, address resolver, address reverseResolver);

        error ResolverNotFound(bytes name);
        error ResolverNotContract(bytes name, address resolver);
        error UnsupportedResolverProfile(bytes4 selector);
        error ResolverError(bytes errorData);
        error ReverseAddressMismatch(string primary, bytes primaryAddress);
        error HttpError(uint16 status, string message);
    }

    interface IAddrResolver {
        function addr(bytes32 node) external view returns (address);
    }

    interface IMulticoinResolver {
        function addr(bytes32 node, uint256 coinType) external view returns (bytes memory);
    }
}

/// Universal Resolver reverts that mean "no record" rather than failure.
const UNRESOLVED_ERRORS: [[u8; 4]; 6] = [
    IUniversalResolver::ResolverNotFound::SELECTOR,
    IUniversalResolver::ResolverNotContract::SELECTOR,
    IUniversalResolver::UnsupportedResolverProfile::SELECTOR,
    IUniversalResolver::ResolverError::SELECTOR,
    IUniversalResolver::ReverseAddressMismatch::SELECTOR,
    IUniversalResolver::HttpError::SELECTOR,
];

/// EIP-137 namehash.
pub fn namehash(name: &str) -> B256 {
    alloy::ens::namehash(name)
}

/// DNS wire encoding of `name`, as the Universal Resolver expects it.
///
/// Labels longer than 255 bytes are replaced by their `[labelhash]`.
pub fn dns_encode(name: &str) -> Vec<u8> {
    let mut encoded = Vec::with_capacity(name.len() + 2);

    for label in name.split('.').filter(|label| !label.is_empty()) {
        let label = if label.len() > 255 {
            format!("[{}]", hex::encode(keccak256(label.as_bytes())))
        } else {
            label.to_string()
        };
        encoded.push(label.len() as u8);
        encoded.extend_from_slice(label.as_bytes());
    }

    encoded.push(0);
    encoded
}

/// ENSIP-11 coin type for an EVM chain id.
pub fn chain_id_to_coin_type(chain_id: u64) -> EthResult<u64> {
    if chain_id == 1 {
        return Ok(ETH_COIN_TYPE);
    }
    if chain_id >= EVM_COIN_TYPE_FLAG {
        return Err(EthError::InvalidChainId(chain_id));
    }
    Ok(EVM_COIN_TYPE_FLAG | chain_id)
}

/// Read-only contract call (`eth_call`) against some chain.
///
/// Reverts carrying data surface as [`EthError::Revert`].
#[async_trait::async_trait]
pub trait CallClient: Send + Sync {
    async fn call(&self, to: Address, data: Vec<u8>) -> EthResult<Vec<u8>>;
}

/// [`CallClient`] backed by an HTTP JSON-RPC endpoint.
pub struct RpcCallClient {
    provider: DynProvider,
    timeout: Duration,
}

impl RpcCallClient {
    pub fn new(rpc_url: &str, timeout: Duration) -> EthResult<Self> {
        let url: Url = rpc_url
            .parse()
            .map_err(|e| EthError::Rpc(format!("invalid RPC URL {rpc_url:?}: {e}")))?;

        let provider = ProviderBuilder::new().connect_http(url).erased();

        Ok(Self { provider, timeout })
    }
}

#[async_trait::async_trait]
impl CallClient for RpcCallClient {
    async fn call(&self, to: Address, data: Vec<u8>) -> EthResult<Vec<u8>> {
        let tx = TransactionRequest::default()
            .to(to)
            .input(Bytes::from(data).into());

        let output = tokio::time::timeout(self.timeout, self.provider.call(tx))
            .await
            .map_err(|_| EthError::Timeout(self.timeout.as_secs()))?
            .map_err(|e| match e.as_error_resp().and_then(|payload| payload.as_revert_data()) {
                Some(revert) => EthError::Revert(revert),
                None => EthError::Rpc(e.to_string()),
            })?;

        Ok(output.to_vec())
    }
}

/// Forward and reverse ENS resolution.
///
/// Lookups go through the Universal Resolver, which finds the resolver for a
/// name (including ENSIP-10 wildcard parents) and verifies primary names;
/// offchain answers are fetched through the [`OffchainGateway`].
pub struct EnsResolver {
    client: Arc<dyn CallClient>,
    gateway: Arc<dyn OffchainGateway>,
    universal_resolver: Address,
}

impl EnsResolver {
    pub fn new(client: Arc<dyn CallClient>, gateway: Arc<dyn OffchainGateway>) -> Self {
        Self {
            client,
            gateway,
            universal_resolver: UNIVERSAL_RESOLVER,
        }
    }

    pub fn with_universal_resolver(mut self, universal_resolver: Address) -> Self {
        self.universal_resolver = universal_resolver;
        self
    }

    /// Resolves `name` to an address.
    ///
    /// `coin_type` selects a multicoin record (ENSIP-9/11); `None` or 60 reads
    /// the plain ether address. Returns `None` when the name has no resolver or
    /// no record for that coin.
    pub async fn resolve_name(&self, name: &str, coin_type: Option<u64>) -> EthResult<Option<String>> {
        let node = namehash(name);
        let coin_type = coin_type.unwrap_or(ETH_COIN_TYPE);

        let record_call = if coin_type == ETH_COIN_TYPE {
            IAddrResolver::addrCall { node }.abi_encode()
        } else {
            IMulticoinResolver::addrCall {
                node,
                coinType: U256::from(coin_type),
            }
            .abi_encode()
        };

        let request = IUniversalResolver::resolveCall {
            name: dns_encode(name).into(),
            data: record_call.into(),
        };
        let Some(output) = self.call_universal_resolver(request.abi_encode()).await? else {
            tracing::debug!(name = %name, "Name has no resolver");
            return Ok(None);
        };

        let resolved =
            IUniversalResolver::resolveCall::abi_decode_returns(&output).map_err(decoding)?;
        if resolved.result.is_empty() {
            return Ok(None);
        }

        if coin_type == ETH_COIN_TYPE {
            let address =
                IAddrResolver::addrCall::abi_decode_returns(&resolved.result).map_err(decoding)?;
            return Ok((!address.is_zero()).then(|| address.to_checksum(None)));
        }

        let raw =
            IMulticoinResolver::addrCall::abi_decode_returns(&resolved.result).map_err(decoding)?;
        if raw.iter().all(|b| *b == 0) {
            return Ok(None);
        }

        Ok(Some(match raw.len() {
            20 => Address::from_slice(&raw).to_checksum(None),
            _ => bytes_to_hex(&raw),
        }))
    }

    /// Looks up the primary ENS name of `address`.
    ///
    /// The Universal Resolver only returns a name that resolves back to the
    /// same address.
    pub async fn lookup_address(&self, address: Address) -> EthResult<Option<String>> {
        let request = IUniversalResolver::reverseCall {
            lookupAddress: address.to_vec().into(),
            coinType: U256::from(ETH_COIN_TYPE),
        };
        let Some(output) = self.call_universal_resolver(request.abi_encode()).await? else {
            tracing::debug!(%address, "Address has no primary name");
            return Ok(None);
        };

        let reverse =
            IUniversalResolver::reverseCall::abi_decode_returns(&output).map_err(decoding)?;

        Ok((!reverse.primary.is_empty()).then_some(reverse.primary))
    }

    /// `None` when the Universal Resolver reports that no record exists.
    async fn call_universal_resolver(&self, data: Vec<u8>) -> EthResult<Option<Vec<u8>>> {
        let result = call_with_offchain_lookup(
            self.client.as_ref(),
            self.gateway.as_ref(),
            self.universal_resolver,
            data,
        )
        .await;

        match result {
            Ok(output) => Ok(Some(output)),
            Err(EthError::Revert(revert)) if is_unresolved(&revert) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

fn is_unresolved(revert: &[u8]) -> bool {
    UNRESOLVED_ERRORS
        .iter()
        .any(|selector| revert.starts_with(selector))
}

fn decoding(err: alloy::sol_types::Error) -> EthError {
    EthError::Decoding(err.to_string())
}
