// Hashing and key generation tools

use crate::protocol::CallToolResult;
use crate::tools::{json_schema_object, json_schema_string, parse_args, Tool};
use anyhow::Result;
use ethkit_core::{hashing, wallet};
use serde::Deserialize;
use serde_json::Value;

/// Tool to hash a value with keccak256
pub struct Keccak256HashTool;

#[derive(Debug, Deserialize)]
struct Keccak256HashArgs {
    value: String,
}

#[async_trait::async_trait]
impl Tool for Keccak256HashTool {
    fn name(&self) -> &'static str {
        "keccak256-hash"
    }

    fn description(&self) -> String {
        "Get the Keccak256 hash of a value. Hex strings (0x...) are hashed as bytes, anything else as UTF-8 text.".to_string()
    }

    fn input_schema(&self) -> Value {
        json_schema_object(
            serde_json::json!({
                "value": json_schema_string("The value to hash")
            }),
            vec!["value"],
        )
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args: Keccak256HashArgs = parse_args(self.name(), arguments)?;
        let hash = hashing::keccak256_hash(&args.value)?;
        Ok(CallToolResult::text(hash))
    }
}

/// Tool to generate a throwaway keypair
pub struct CreateWalletTool;

#[async_trait::async_trait]
impl Tool for CreateWalletTool {
    fn name(&self) -> &'static str {
        "create-wallet"
    }

    fn description(&self) -> String {
        "Generate a burner wallet with a private key and address".to_string()
    }

    fn input_schema(&self) -> Value {
        json_schema_object(serde_json::json!({}), vec![])
    }

    async fn execute(&self, _arguments: Value) -> Result<CallToolResult> {
        let wallet = wallet::create_wallet();
        tracing::info!(address = %wallet.address, "Generated burner wallet");
        Ok(CallToolResult::json(&wallet)?)
    }
}
