// Ethereum developer operations exposed as tools by ethkit-mcp.
// Every computation is delegated to alloy, k256 or a remote service.

pub mod abi;
pub mod abi_service;
pub mod address;
pub mod ccip;
pub mod config;
pub mod ens;
pub mod error;
pub mod hashing;
pub mod wallet;

#[cfg(test)]
mod test_support;

pub use abi::{AbiParameter, DecodedFunctionCall};
pub use abi_service::{AbiDataClient, AbiNetwork, AbiSource};
pub use ccip::{HttpGateway, OffchainGateway};
pub use config::EthereumConfig;
pub use ens::{CallClient, EnsResolver, RpcCallClient};
pub use error::{EthError, EthResult};
pub use wallet::BurnerWallet;

pub use alloy::primitives::Address;
