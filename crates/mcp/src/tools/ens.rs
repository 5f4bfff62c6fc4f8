// ENS tools: forward/reverse resolution, namehash, coin types

use crate::protocol::{CallToolResult, ToolAnnotations};
use crate::tools::{json_schema_integer, json_schema_object, json_schema_string, parse_args, Tool};
use anyhow::{Context, Result};
use ethkit_core::address::parse_address;
use ethkit_core::ens::{self, EnsResolver};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

pub const NO_ADDRESS_FOUND: &str = "No address found";
pub const NO_NAME_FOUND: &str = "No name found";

/// Tool for forward resolution: ENS name -> address
pub struct ResolveEnsNameTool {
    resolver: Arc<EnsResolver>,
}

impl ResolveEnsNameTool {
    pub fn new(resolver: Arc<EnsResolver>) -> Self {
        Self { resolver }
    }
}

#[derive(Debug, Deserialize)]
struct ResolveEnsNameArgs {
    name: String,
    #[serde(default, rename = "chainId")]
    chain_id: Option<u64>,
}

#[async_trait::async_trait]
impl Tool for ResolveEnsNameTool {
    fn name(&self) -> &'static str {
        "resolve-ens-name"
    }

    fn description(&self) -> String {
        "Get an Ethereum address from an ENS name. Pass chainId to read the name's address on another EVM chain (ENSIP-11).".to_string()
    }

    fn input_schema(&self) -> Value {
        json_schema_object(
            serde_json::json!({
                "name": json_schema_string("The ENS name, e.g. vitalik.eth"),
                "chainId": json_schema_integer("Optional EVM chain id of the address record (default: 1)")
            }),
            vec!["name"],
        )
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args: ResolveEnsNameArgs = parse_args(self.name(), arguments)?;
        let coin_type = args.chain_id.map(ens::chain_id_to_coin_type).transpose()?;

        let address = self
            .resolver
            .resolve_name(&args.name, coin_type)
            .await
            .with_context(|| format!("Failed to resolve {}", args.name))?;

        Ok(CallToolResult::text(
            address.unwrap_or_else(|| NO_ADDRESS_FOUND.to_string()),
        ))
    }

    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations::networked()
    }
}

/// Tool for reverse resolution: address -> primary ENS name
pub struct ResolveEnsAddressTool {
    resolver: Arc<EnsResolver>,
}

impl ResolveEnsAddressTool {
    pub fn new(resolver: Arc<EnsResolver>) -> Self {
        Self { resolver }
    }
}

#[derive(Debug, Deserialize)]
struct ResolveEnsAddressArgs {
    address: String,
}

#[async_trait::async_trait]
impl Tool for ResolveEnsAddressTool {
    fn name(&self) -> &'static str {
        "resolve-ens-address"
    }

    fn description(&self) -> String {
        "Get an ENS name from an Ethereum address".to_string()
    }

    fn input_schema(&self) -> Value {
        json_schema_object(
            serde_json::json!({
                "address": json_schema_string("The Ethereum address to look up")
            }),
            vec!["address"],
        )
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args: ResolveEnsAddressArgs = parse_args(self.name(), arguments)?;
        let address = parse_address(&args.address).context("Invalid address")?;

        let name = self
            .resolver
            .lookup_address(address)
            .await
            .with_context(|| format!("Failed to look up {}", args.address))?;

        Ok(CallToolResult::text(
            name.unwrap_or_else(|| NO_NAME_FOUND.to_string()),
        ))
    }

    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations::networked()
    }
}

/// Tool to compute the EIP-137 namehash of a name
pub struct NamehashTool;

#[derive(Debug, Deserialize)]
struct NamehashArgs {
    name: String,
}

#[async_trait::async_trait]
impl Tool for NamehashTool {
    fn name(&self) -> &'static str {
        "namehash"
    }

    fn description(&self) -> String {
        "Get the ENS namehash (EIP-137 node) of a name".to_string()
    }

    fn input_schema(&self) -> Value {
        json_schema_object(
            serde_json::json!({
                "name": json_schema_string("The ENS name, e.g. vitalik.eth")
            }),
            vec!["name"],
        )
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args: NamehashArgs = parse_args(self.name(), arguments)?;
        Ok(CallToolResult::text(ens::namehash(&args.name).to_string()))
    }
}

/// Tool to convert an EVM chain id to its ENSIP-11 coin type
pub struct ChainIdToCoinTypeTool;

#[derive(Debug, Deserialize)]
struct ChainIdToCoinTypeArgs {
    #[serde(rename = "chainId")]
    chain_id: u64,
}

#[async_trait::async_trait]
impl Tool for ChainIdToCoinTypeTool {
    fn name(&self) -> &'static str {
        "chain-id-to-cointype"
    }

    fn description(&self) -> String {
        "Convert an EVM chain id to the ENSIP-11 coin type used for multichain ENS address records".to_string()
    }

    fn input_schema(&self) -> Value {
        json_schema_object(
            serde_json::json!({
                "chainId": json_schema_integer("The EVM chain id, e.g. 10 for Optimism")
            }),
            vec!["chainId"],
        )
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args: ChainIdToCoinTypeArgs = parse_args(self.name(), arguments)?;
        let coin_type = ens::chain_id_to_coin_type(args.chain_id)?;
        Ok(CallToolResult::text(coin_type.to_string()))
    }
}
