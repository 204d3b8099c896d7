//! Example: an App talking to the bridge host over stdio.
//!
//! Spawns `mcp-app-bridge serve` as a subprocess and drives it with an
//! [`AppBridge`] running over the child's stdin/stdout.
//!
//! Usage:
//!   cargo build && cargo run --example stdio_app
//!
//! Note: This example requires the binary to be built first.

use std::process::Stdio;
use std::sync::Arc;

use serde_json::json;
use tokio::process::Command;

use mcp_app_bridge::protocol::AppBridge;
use mcp_app_bridge::transport::StdioTransport;
use mcp_app_bridge::types::{
    ContentBlock, DisplayMode, Implementation, LogLevel, UpdateModelContextParams,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    println!("=== MCP App Bridge stdio example ===\n");

    let binary = std::env::current_dir()?.join("target/debug/mcp-app-bridge");
    if !binary.exists() {
        eprintln!("Bridge binary not found. Run `cargo build` first.");
        std::process::exit(1);
    }

    let mut child = Command::new(&binary)
        .arg("serve")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()?;
    let stdin = child
        .stdin
        .take()
        .ok_or_else(|| anyhow::anyhow!("child stdin unavailable"))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow::anyhow!("child stdout unavailable"))?;

    let transport = Arc::new(StdioTransport::with_io(stdout, stdin));
    let app = AppBridge::builder(Implementation::new("example-app", "1.0.0"))
        .on_host_context_changed(|ctx| println!("   Host context now: {ctx:?}"))
        .build(transport);

    // 1. Handshake
    println!("1. Initializing...");
    let init = app.connect().await?;
    println!(
        "   Host: {} v{} (protocol {})",
        init.host_info.name, init.host_info.version, init.protocol_version
    );
    println!("   Capabilities: {:?}", init.host_capabilities.present_keys());

    // 2. Post a message into the conversation
    println!("\n2. Sending a message...");
    app.send_message(vec![ContentBlock::text("Hello from the example app")])
        .await?;
    println!("   Acknowledged");

    // 3. Ask for fullscreen
    println!("\n3. Requesting fullscreen...");
    let mode = app.request_display_mode(DisplayMode::Fullscreen).await?;
    println!("   Granted: {mode}");

    // 4. Update the model context
    println!("\n4. Updating model context...");
    app.update_model_context(UpdateModelContextParams {
        content: None,
        structured_content: Some(json!({"selected": "option-b"})),
    })
    .await?;
    println!("   Stored");

    // 5. Tool calls need an MCP server behind the host
    println!("\n5. Calling a server tool...");
    match app.call_server_tool("search", Some(json!({"q": "rust"}))).await {
        Ok(result) => println!("   Result: {:?}", result.content),
        Err(e) => println!("   {e}"),
    }

    app.send_log(LogLevel::Info, Some("example".to_string()), json!("done"))
        .await?;

    // 6. Shutdown
    println!("\n6. Closing...");
    app.close().await?;
    let _ = child.wait().await;

    println!("\n=== Example complete ===");
    Ok(())
}
