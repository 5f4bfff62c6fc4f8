use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

mod api;
mod config;

use config::ServerConfig;

#[derive(Parser, Debug)]
#[command(name = "ethkit")]
#[command(about = "Ethereum developer tools served over MCP (HTTP)", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "ETHKIT_CONFIG", default_value = "ethkit.toml")]
    config: PathBuf,

    /// Port to listen on (overrides the configuration file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Host to bind to (overrides the configuration file)
    #[arg(long)]
    host: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ethkit=info,tower_http=debug".into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    let args = Args::parse();

    tracing::info!("Starting Ethkit");

    // Load configuration
    let mut config = ServerConfig::load(&args.config)?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    tracing::info!("RPC endpoint: {}", config.ethereum.rpc_url);

    // Start API server
    let addr = config.bind_addr();
    tracing::info!("Starting API server on {}", addr);

    api::serve(&addr, config).await?;

    Ok(())
}
