// Tool trait and the name -> tool registry

use crate::protocol::{CallToolResult, ToolAnnotations, ToolSchema};
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Tool executor trait
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    /// Tool name as exposed over MCP
    fn name(&self) -> &'static str;

    fn description(&self) -> String;

    /// JSON schema of the tool's arguments
    fn input_schema(&self) -> serde_json::Value;

    /// Execute the tool with given arguments
    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult>;

    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations::local()
    }

    /// Get the tool schema for MCP
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: self.description(),
            input_schema: self.input_schema(),
            annotations: Some(self.annotations()),
        }
    }
}

/// Deserialize tool arguments, naming the tool in the error
pub fn parse_args<T: DeserializeOwned>(tool: &str, arguments: serde_json::Value) -> Result<T> {
    serde_json::from_value(arguments).with_context(|| format!("Invalid arguments for {}", tool))
}

/// Tool registry for managing available tools
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
        }
    }

    /// Register a tool, replacing any tool with the same name
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        if self.tools.insert(name.clone(), tool).is_some() {
            tracing::warn!("Tool {} registered twice; keeping the last one", name);
        }
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// List all tool schemas, ordered by name
    pub fn list_schemas(&self) -> Vec<ToolSchema> {
        self.tools.values().map(|t| t.schema()).collect()
    }

    /// Check if a tool exists
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// Helper functions for creating tool schemas

pub fn json_schema_object(properties: serde_json::Value, required: Vec<&str>) -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required
    })
}

pub fn json_schema_string(description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "string",
        "description": description
    })
}

/// String constrained by a regex, e.g. hex data or addresses
pub fn json_schema_pattern(pattern: &str, description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "string",
        "pattern": pattern,
        "description": description
    })
}

pub fn json_schema_enum(values: &[&str], default: &str, description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "string",
        "enum": values,
        "default": default,
        "description": description
    })
}

pub fn json_schema_integer(description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "integer",
        "minimum": 0,
        "description": description
    })
}

pub fn json_schema_array(items: serde_json::Value, description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "array",
        "items": items,
        "description": description
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoTool(&'static str);

    #[async_trait::async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &'static str {
            self.0
        }

        fn description(&self) -> String {
            "Echo the arguments back".to_string()
        }

        fn input_schema(&self) -> serde_json::Value {
            json_schema_object(serde_json::json!({}), vec![])
        }

        async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
            Ok(CallToolResult::text(arguments.to_string()))
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = ToolRegistry::new();
        assert!(registry.is_empty());

        registry.register(Arc::new(EchoTool("zeta")));
        registry.register(Arc::new(EchoTool("alpha")));

        assert_eq!(registry.len(), 2);
        assert!(registry.contains("alpha"));
        assert!(registry.get("missing").is_none());

        let names: Vec<_> = registry.list_schemas().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_duplicate_registration_replaces() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool("echo")));
        registry.register(Arc::new(EchoTool("echo")));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_default_schema_annotations() {
        let schema = EchoTool("echo").schema();
        assert_eq!(schema.annotations, Some(ToolAnnotations::local()));
        assert_eq!(schema.input_schema["type"], "object");
    }

    #[test]
    fn test_parse_args_names_tool() {
        #[derive(Debug, serde::Deserialize)]
        #[allow(dead_code)]
        struct Args {
            value: String,
        }

        let err = parse_args::<Args>("keccak256-hash", serde_json::json!({})).unwrap_err();
        assert!(err.to_string().contains("Invalid arguments for keccak256-hash"));
    }

    #[tokio::test]
    async fn test_execute_through_registry() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool("echo")));

        let tool = registry.get("echo").unwrap();
        let result = tool.execute(serde_json::json!({"a": 1})).await.unwrap();
        assert_eq!(result.text_content(), r#"{"a":1}"#);
    }
}
