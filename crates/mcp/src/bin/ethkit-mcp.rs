// Standalone MCP server binary (stdio transport)

use anyhow::Result;
use ethkit_mcp::config::McpConfig;
use ethkit_mcp::server::McpServer;
use ethkit_mcp::tools::ethereum_registry;

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries the protocol, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ethkit=info".into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    tracing::info!("Ethkit MCP Server starting...");

    let config = McpConfig::load(&McpConfig::default_path())?;

    let registry = ethereum_registry(&config.ethereum)?;
    tracing::info!("Registered {} tools", registry.len());

    let server = McpServer::new(registry);
    server.run_stdio().await?;

    Ok(())
}
