pub mod abi;
pub mod crypto;
pub mod ens;
mod registry;

pub use abi::{
    DecodeAbiParametersTool, DecodeFunctionDataTool, EncodeAbiParametersTool,
    EncodeFunctionDataTool, FetchAbiTool, FunctionSelectorTool,
};
pub use crypto::{CreateWalletTool, Keccak256HashTool};
pub use ens::{ChainIdToCoinTypeTool, NamehashTool, ResolveEnsAddressTool, ResolveEnsNameTool};
pub use registry::{
    json_schema_array, json_schema_enum, json_schema_integer, json_schema_object,
    json_schema_pattern, json_schema_string, parse_args, Tool, ToolRegistry,
};

use anyhow::{Context, Result};
use ethkit_core::{
    AbiDataClient, AbiSource, CallClient, EnsResolver, EthereumConfig, HttpGateway,
    OffchainGateway, RpcCallClient,
};
use std::sync::Arc;

/// Build the registry of every Ethereum tool, wired to the configured endpoints
pub fn ethereum_registry(config: &EthereumConfig) -> Result<ToolRegistry> {
    let abi_source: Arc<dyn AbiSource> = Arc::new(
        AbiDataClient::new(&config.abi_service_url, config.request_timeout())
            .context("Failed to create ABI service client")?,
    );

    let rpc: Arc<dyn CallClient> = Arc::new(
        RpcCallClient::new(&config.rpc_url, config.request_timeout())
            .context("Failed to create RPC client")?,
    );

    let gateway: Arc<dyn OffchainGateway> = Arc::new(
        HttpGateway::new(config.request_timeout()).context("Failed to create ENS gateway client")?,
    );

    tracing::debug!(
        rpc_url = %config.rpc_url,
        abi_service_url = %config.abi_service_url,
        "Configured Ethereum endpoints"
    );

    Ok(registry_with(abi_source, Arc::new(EnsResolver::new(rpc, gateway))))
}

/// Build the registry over explicit collaborators
pub fn registry_with(abi_source: Arc<dyn AbiSource>, ens: Arc<EnsResolver>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();

    // ABI
    registry.register(Arc::new(EncodeAbiParametersTool));
    registry.register(Arc::new(DecodeAbiParametersTool));
    registry.register(Arc::new(EncodeFunctionDataTool));
    registry.register(Arc::new(DecodeFunctionDataTool));
    registry.register(Arc::new(FunctionSelectorTool));
    registry.register(Arc::new(FetchAbiTool::new(abi_source)));

    // Hashing and keys
    registry.register(Arc::new(Keccak256HashTool));
    registry.register(Arc::new(CreateWalletTool));

    // ENS
    registry.register(Arc::new(ResolveEnsNameTool::new(ens.clone())));
    registry.register(Arc::new(ResolveEnsAddressTool::new(ens)));
    registry.register(Arc::new(NamehashTool));
    registry.register(Arc::new(ChainIdToCoinTypeTool));

    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ethereum_registry_has_every_tool() {
        let registry = ethereum_registry(&EthereumConfig::default()).unwrap();

        let names: Vec<String> = registry.list_schemas().into_iter().map(|s| s.name).collect();
        assert_eq!(
            names,
            vec![
                "chain-id-to-cointype",
                "create-wallet",
                "decode-abi-parameters",
                "decode-function-data",
                "encode-abi-parameters",
                "encode-function-data",
                "fetch-abi",
                "function-selector",
                "keccak256-hash",
                "namehash",
                "resolve-ens-address",
                "resolve-ens-name",
            ]
        );
    }

    #[test]
    fn test_every_schema_is_an_object() {
        let registry = ethereum_registry(&EthereumConfig::default()).unwrap();
        for schema in registry.list_schemas() {
            assert_eq!(schema.input_schema["type"], "object", "{}", schema.name);
            assert!(!schema.description.is_empty(), "{}", schema.name);
        }
    }

    #[test]
    fn test_bad_rpc_url_fails_registry() {
        let config = EthereumConfig {
            rpc_url: "::".to_string(),
            ..EthereumConfig::default()
        };
        assert!(ethereum_registry(&config).is_err());
    }
}
