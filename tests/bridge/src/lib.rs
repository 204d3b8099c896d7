//! Shared wiring for the cross-transport bridge tests: loopback channels
//! that connect two transports of the same kind, plus a demo host.

use std::sync::{Arc, OnceLock, Weak};

use serde_json::{json, Value};

use mcp_app_bridge::protocol::{AppBridge, AppBridgeBuilder, HostBridge, HostBridgeBuilder};
use mcp_app_bridge::transport::{
    MessageEvent, MessageTarget, NativeBridge, PostMessageTransport, StdioTransport, Transport,
    WebViewTransport,
};
use mcp_app_bridge::types::{
    AckResult, CallToolResult, Implementation, ReadResourceResult, ResourceContents,
};

// ─── Loopback channels ─────────────────────────────────────────────────────

/// A window whose `postMessage` lands in the peer transport.
struct LoopbackWindow {
    source: &'static str,
    origin: &'static str,
    peer: OnceLock<Weak<PostMessageTransport>>,
}

impl MessageTarget for LoopbackWindow {
    fn post_message(&self, message: Value, _target_origin: &str) -> Result<(), String> {
        let peer = self
            .peer
            .get()
            .and_then(Weak::upgrade)
            .ok_or_else(|| "peer window is gone".to_string())?;
        peer.dispatch_event(MessageEvent::new(self.source, self.origin, message));
        Ok(())
    }
}

/// Host and App ends of a postMessage channel between two frames.
pub fn post_message_pair() -> (Arc<PostMessageTransport>, Arc<PostMessageTransport>) {
    let to_app = Arc::new(LoopbackWindow {
        source: "host",
        origin: "https://host.example",
        peer: OnceLock::new(),
    });
    let to_host = Arc::new(LoopbackWindow {
        source: "app",
        origin: "https://sandbox.example",
        peer: OnceLock::new(),
    });

    let host = Arc::new(PostMessageTransport::new(to_app.clone(), Some("app".to_string())));
    let app = Arc::new(
        PostMessageTransport::new(to_host.clone(), Some("host".to_string()))
            .with_target_origin("https://host.example"),
    );
    let _ = to_app.peer.set(Arc::downgrade(&app));
    let _ = to_host.peer.set(Arc::downgrade(&host));
    (host, app)
}

/// A native bridge that hands serialized frames to the peer WebView.
struct LoopbackNative {
    peer: OnceLock<Weak<WebViewTransport>>,
}

impl NativeBridge for LoopbackNative {
    fn post_message(&self, json: &str) -> Result<(), String> {
        let peer = self
            .peer
            .get()
            .and_then(Weak::upgrade)
            .ok_or_else(|| "native peer is gone".to_string())?;
        peer.receive_message(json);
        Ok(())
    }
}

/// Host and App ends of a native WebView channel.
pub fn webview_pair() -> (Arc<WebViewTransport>, Arc<WebViewTransport>) {
    let to_app = Arc::new(LoopbackNative {
        peer: OnceLock::new(),
    });
    let to_host = Arc::new(LoopbackNative {
        peer: OnceLock::new(),
    });
    let host = Arc::new(WebViewTransport::new(to_app.clone()));
    let app = Arc::new(WebViewTransport::new(to_host.clone()));
    let _ = to_app.peer.set(Arc::downgrade(&app));
    let _ = to_host.peer.set(Arc::downgrade(&host));
    (host, app)
}

/// Host and App ends of a newline-delimited stream.
pub fn stdio_pair() -> (Arc<StdioTransport>, Arc<StdioTransport>) {
    let (host_io, app_io) = tokio::io::duplex(64 * 1024);
    let (host_read, host_write) = tokio::io::split(host_io);
    let (app_read, app_write) = tokio::io::split(app_io);
    (
        Arc::new(StdioTransport::with_io(host_read, host_write)),
        Arc::new(StdioTransport::with_io(app_read, app_write)),
    )
}

// ─── Engines ───────────────────────────────────────────────────────────────

/// Host with an `add` tool, an `echo` tool and one readable resource.
pub fn demo_host() -> HostBridgeBuilder {
    HostBridge::builder(Implementation::new("demo-host", "1.0.0"))
        .on_tool_call(|params| {
            Box::pin(async move {
                let args = params.arguments.unwrap_or_else(|| json!({}));
                match params.name.as_str() {
                    "add" => {
                        let a = args["a"].as_i64().unwrap_or(0);
                        let b = args["b"].as_i64().unwrap_or(0);
                        Ok(CallToolResult {
                            structured_content: Some(json!({"sum": a + b})),
                            ..CallToolResult::text((a + b).to_string())
                        })
                    }
                    "echo" => Ok(CallToolResult {
                        structured_content: Some(args),
                        ..CallToolResult::default()
                    }),
                    other => anyhow::bail!("unknown tool {other}"),
                }
            })
        })
        .on_resource_read(|params| {
            Box::pin(async move {
                Ok(ReadResourceResult {
                    contents: vec![ResourceContents {
                        uri: params.uri,
                        mime_type: Some("text/html".to_string()),
                        text: Some("<div>demo</div>".to_string()),
                        blob: None,
                    }],
                })
            })
        })
        .on_message(|_| Box::pin(async { Ok(AckResult::default()) }))
        .on_open_link(|_| Box::pin(async { Ok(AckResult::default()) }))
        .on_request_display_mode(|params| Box::pin(async move { Ok(params.mode) }))
        .on_update_model_context(|_| Box::pin(async { Ok(()) }))
}

pub fn demo_app() -> AppBridgeBuilder {
    AppBridge::builder(Implementation::new("demo-app", "1.0.0"))
}

/// Connect a host and an app over two ends of one channel and wait until
/// both sides are ready.
pub async fn connect(
    host: HostBridgeBuilder,
    app: AppBridgeBuilder,
    host_end: Arc<dyn Transport>,
    app_end: Arc<dyn Transport>,
) -> (Arc<HostBridge>, Arc<AppBridge>) {
    let host = host.build(host_end);
    host.connect().await.expect("host connect");
    let app = app.build(app_end);
    app.connect().await.expect("app connect");
    app.ping().await.expect("ping after handshake");
    (host, app)
}
