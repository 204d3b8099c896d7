//! MCP App Bridge: entry point.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::sync::oneshot;

use mcp_app_bridge::config::{load_config, BridgeConfig};
use mcp_app_bridge::protocol::{HostBridge, HostBridgeBuilder};
use mcp_app_bridge::transport::{StdioTransport, Transport};
use mcp_app_bridge::types::{AckResult, UiInitializeResult, METHOD_CATALOGUE};

#[derive(Parser)]
#[command(
    name = "mcp-app-bridge",
    about = "Host side of the MCP App bridge protocol, over stdio",
    version
)]
struct Cli {
    /// Configuration file path.
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a host bridge over stdin/stdout (default).
    Serve,

    /// Print the initialize result and method catalogue as JSON.
    Info,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    // Initialize logging
    let level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let transport = Arc::new(StdioTransport::new());
            let (closed_tx, closed_rx) = oneshot::channel();
            transport.set_onclose(Box::new(move || {
                let _ = closed_tx.send(());
            }));

            let bridge = host_builder(&config).build(transport);

            bridge.connect().await?;
            tracing::info!("Serving bridge over stdio");

            tokio::select! {
                _ = closed_rx => {
                    tracing::info!("Transport closed");
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Interrupted, tearing down");
                    let outcome = bridge.teardown().await;
                    tracing::info!("Teardown finished: {outcome:?}");
                    bridge.close().await?;
                }
            }
        }

        Commands::Info => {
            let result = UiInitializeResult {
                protocol_version: config.preferred_protocol_version().to_string(),
                host_info: config.host_info(),
                host_capabilities: host_builder(&config).capabilities(),
                host_context: config.host_context.clone().unwrap_or_default(),
            };
            let info = serde_json::json!({
                "initialize": result,
                "methods": METHOD_CATALOGUE,
                "method_count": METHOD_CATALOGUE.len(),
            });
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
    }

    Ok(())
}

/// Host engine used by `serve`. No MCP server is attached, so tool calls and
/// resource reads are reported as not supported; everything else is logged
/// and acknowledged.
fn host_builder(config: &BridgeConfig) -> HostBridgeBuilder {
    HostBridge::default_builder()
        .with_config(config)
        .on_message(|params| {
            Box::pin(async move {
                tracing::info!(role = %params.role, blocks = params.content.len(), "ui/message");
                Ok(AckResult::default())
            })
        })
        .on_open_link(|params| {
            Box::pin(async move {
                tracing::info!(url = %params.url, "ui/open-link");
                Ok(AckResult::default())
            })
        })
        .on_request_display_mode(|params| Box::pin(async move { Ok(params.mode) }))
        .on_update_model_context(|params| {
            Box::pin(async move {
                tracing::info!(
                    structured = params.structured_content.is_some(),
                    "ui/update-model-context"
                );
                Ok(())
            })
        })
        .on_ready(|| tracing::info!("App ready"))
}
