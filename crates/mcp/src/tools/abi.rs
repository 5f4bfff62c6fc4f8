// ABI tools: parameter and function-call codecs, selectors, ABI lookup

use crate::protocol::{CallToolResult, ToolAnnotations};
use crate::tools::{
    json_schema_array, json_schema_enum, json_schema_object, json_schema_pattern,
    json_schema_string, parse_args, Tool,
};
use anyhow::{Context, Result};
use ethkit_core::abi::{self, AbiParameter};
use ethkit_core::address::parse_address;
use ethkit_core::{AbiNetwork, AbiSource};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

const HEX_PATTERN: &str = "^0x[0-9a-fA-F]*$";
const ADDRESS_PATTERN: &str = "^0x[0-9a-fA-F]{40}$";

fn params_schema() -> Value {
    json_schema_array(
        serde_json::json!({
            "type": "object",
            "properties": {
                "type": json_schema_string("Solidity type, e.g. uint256, address[], (uint8,string)"),
                "name": json_schema_string("Optional parameter name")
            },
            "required": ["type"]
        }),
        "Array of ABI types like `[{ \"type\": \"uint32\" }, { \"type\": \"bytes32\" }]`",
    )
}

fn abi_schema() -> Value {
    json_schema_string("The contract ABI as a JSON string")
}

fn hex_data_schema() -> Value {
    json_schema_pattern(HEX_PATTERN, "The hex data to decode")
}

/// ABI documents may arrive as a JSON string or already parsed
fn abi_text(abi: Value) -> String {
    match abi {
        Value::String(text) => text,
        other => other.to_string(),
    }
}

/// Tool to ABI-encode raw parameters
pub struct EncodeAbiParametersTool;

#[derive(Debug, Deserialize)]
struct EncodeAbiParametersArgs {
    params: Vec<AbiParameter>,
    values: Vec<Value>,
}

#[async_trait::async_trait]
impl Tool for EncodeAbiParametersTool {
    fn name(&self) -> &'static str {
        "encode-abi-parameters"
    }

    fn description(&self) -> String {
        [
            "Generates ABI encoded data given a set of ABI parameters and their corresponding values.",
            "Example: params: `[{ \"type\": \"uint32\" }, { \"type\": \"bytes\" }]`, values: `[1, \"0x1234567890\"]`",
        ]
        .join("\n")
    }

    fn input_schema(&self) -> Value {
        json_schema_object(
            serde_json::json!({
                "params": params_schema(),
                "values": json_schema_array(serde_json::json!({}), "The values to encode")
            }),
            vec!["params", "values"],
        )
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args: EncodeAbiParametersArgs = parse_args(self.name(), arguments)?;
        let encoded = abi::encode_abi_parameters(&args.params, &args.values)?;
        Ok(CallToolResult::text(encoded))
    }
}

/// Tool to decode ABI-encoded parameters
pub struct DecodeAbiParametersTool;

#[derive(Debug, Deserialize)]
struct DecodeAbiParametersArgs {
    params: Vec<AbiParameter>,
    data: String,
}

#[async_trait::async_trait]
impl Tool for DecodeAbiParametersTool {
    fn name(&self) -> &'static str {
        "decode-abi-parameters"
    }

    fn description(&self) -> String {
        "Decodes ABI encoded data (a hex string) into a set of ABI parameters and their corresponding values.".to_string()
    }

    fn input_schema(&self) -> Value {
        json_schema_object(
            serde_json::json!({
                "params": params_schema(),
                "data": hex_data_schema()
            }),
            vec!["params", "data"],
        )
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args: DecodeAbiParametersArgs = parse_args(self.name(), arguments)?;
        let decoded = abi::decode_abi_parameters(&args.params, &args.data)?;
        Ok(CallToolResult::json(&decoded)?)
    }
}

/// Tool to encode a function call against a contract ABI
pub struct EncodeFunctionDataTool;

#[derive(Debug, Deserialize)]
struct EncodeFunctionDataArgs {
    abi: Value,
    #[serde(rename = "functionName")]
    function_name: String,
    #[serde(default)]
    args: Vec<Value>,
}

#[async_trait::async_trait]
impl Tool for EncodeFunctionDataTool {
    fn name(&self) -> &'static str {
        "encode-function-data"
    }

    fn description(&self) -> String {
        "Encode a function call into a hex string".to_string()
    }

    fn input_schema(&self) -> Value {
        json_schema_object(
            serde_json::json!({
                "abi": abi_schema(),
                "functionName": json_schema_string("The name of the function to encode"),
                "args": json_schema_array(serde_json::json!({}), "The arguments to encode")
            }),
            vec!["abi", "functionName", "args"],
        )
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args: EncodeFunctionDataArgs = parse_args(self.name(), arguments)?;
        let encoded =
            abi::encode_function_data(&abi_text(args.abi), &args.function_name, &args.args)?;
        Ok(CallToolResult::text(encoded))
    }
}

/// Tool to decode calldata into a function call
pub struct DecodeFunctionDataTool;

#[derive(Debug, Deserialize)]
struct DecodeFunctionDataArgs {
    abi: Value,
    data: String,
}

#[async_trait::async_trait]
impl Tool for DecodeFunctionDataTool {
    fn name(&self) -> &'static str {
        "decode-function-data"
    }

    fn description(&self) -> String {
        "Decode a hex string into a function call".to_string()
    }

    fn input_schema(&self) -> Value {
        json_schema_object(
            serde_json::json!({
                "abi": abi_schema(),
                "data": hex_data_schema()
            }),
            vec!["abi", "data"],
        )
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args: DecodeFunctionDataArgs = parse_args(self.name(), arguments)?;
        let decoded = abi::decode_function_data(&abi_text(args.abi), &args.data)?;
        Ok(CallToolResult::json(&decoded)?)
    }
}

/// Tool to derive a 4-byte selector
pub struct FunctionSelectorTool;

#[derive(Debug, Deserialize)]
struct FunctionSelectorArgs {
    #[serde(rename = "abiItem")]
    abi_item: String,
}

#[async_trait::async_trait]
impl Tool for FunctionSelectorTool {
    fn name(&self) -> &'static str {
        "function-selector"
    }

    fn description(&self) -> String {
        [
            "Get the function selector for a Solidity function from the function signature or full function, event or error.",
            "Examples: `function ownerOf(uint256 tokenId) returns (address)`, `ownerOf(uint256)`,",
            "or a full definition like `function checkPrice(string calldata token) public view returns (uint256 price) { ... }` (the body is ignored)",
        ]
        .join("\n")
    }

    fn input_schema(&self) -> Value {
        json_schema_object(
            serde_json::json!({
                "abiItem": json_schema_string(
                    "The Solidity function, event or error like `function ownerOf(uint256 tokenId)`"
                )
            }),
            vec!["abiItem"],
        )
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args: FunctionSelectorArgs = parse_args(self.name(), arguments)?;
        let selector = abi::function_selector(&args.abi_item)?;
        Ok(CallToolResult::text(selector))
    }
}

/// Tool to fetch a verified contract ABI from the ABI service
pub struct FetchAbiTool {
    source: Arc<dyn AbiSource>,
}

impl FetchAbiTool {
    pub fn new(source: Arc<dyn AbiSource>) -> Self {
        Self { source }
    }
}

#[derive(Debug, Deserialize)]
struct FetchAbiArgs {
    address: String,
    #[serde(default)]
    network: AbiNetwork,
}

#[async_trait::async_trait]
impl Tool for FetchAbiTool {
    fn name(&self) -> &'static str {
        "fetch-abi"
    }

    fn description(&self) -> String {
        "Fetch the ABI for a smart contract".to_string()
    }

    fn input_schema(&self) -> Value {
        let networks: Vec<&str> = AbiNetwork::ALL.iter().map(|n| n.as_str()).collect();
        json_schema_object(
            serde_json::json!({
                "address": json_schema_pattern(ADDRESS_PATTERN, "The address of the contract"),
                "network": json_schema_enum(
                    &networks,
                    AbiNetwork::default().as_str(),
                    "The network of the contract. If not provided, the default is mainnet."
                )
            }),
            vec!["address"],
        )
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args: FetchAbiArgs = parse_args(self.name(), arguments)?;
        let address = parse_address(&args.address).context("Address must be a valid address")?;

        let abi = self.source.fetch_abi(address, args.network).await?;
        Ok(CallToolResult::json(&abi)?)
    }

    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations::networked()
    }
}
