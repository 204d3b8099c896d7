//! Test fixtures shared by the bridge tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{json, Value};

use mcp_app_bridge::protocol::{HostBridge, HostBridgeBuilder};
use mcp_app_bridge::transport::{Incoming, InMemoryTransport, Transport};
use mcp_app_bridge::types::{
    AckResult, CallToolResult, ContentBlock, ReadResourceResult, ResourceContents,
};

/// `ui/initialize` request frame.
pub fn initialize_request(id: i64) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "ui/initialize",
        "params": {
            "protocolVersion": "2025-11-21",
            "appInfo": {"name": "test-app", "version": "1.0.0"},
            "appCapabilities": {}
        }
    })
}

/// `ui/notifications/initialized` frame.
pub fn initialized_notification() -> Value {
    json!({"jsonrpc": "2.0", "method": "ui/notifications/initialized", "params": {}})
}

pub fn request(id: i64, method: &str, params: Value) -> Value {
    json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params})
}

pub fn notification(method: &str, params: Value) -> Value {
    json!({"jsonrpc": "2.0", "method": method, "params": params})
}

/// A host builder with every collaborator registered.
pub fn full_host_builder() -> HostBridgeBuilder {
    HostBridge::default_builder()
        .on_tool_call(|params| {
            Box::pin(async move {
                if params.name == "fail" {
                    anyhow::bail!("tool exploded");
                }
                Ok(CallToolResult::text(format!("called {}", params.name)))
            })
        })
        .on_resource_read(|params| {
            Box::pin(async move {
                Ok(ReadResourceResult {
                    contents: vec![ResourceContents {
                        uri: params.uri,
                        mime_type: Some("text/plain".to_string()),
                        text: Some("hello".to_string()),
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

/// A connected host over an in-memory pair, plus the raw App end.
pub struct HostHarness {
    pub bridge: Arc<HostBridge>,
    pub app: Arc<InMemoryTransport>,
    pub inbox: Incoming,
}

impl HostHarness {
    pub async fn connect(builder: HostBridgeBuilder) -> Self {
        let (host_end, app_end) = InMemoryTransport::pair();
        let bridge = builder.build(Arc::new(host_end));
        bridge.connect().await.unwrap();
        let app = Arc::new(app_end);
        app.start().await.unwrap();
        let inbox = app.take_incoming().unwrap();
        Self { bridge, app, inbox }
    }

    /// Send a raw frame from the App side.
    pub async fn send(&self, frame: Value) {
        let message = mcp_app_bridge::types::JsonRpcMessage::from_value(frame).unwrap();
        self.app.send(message).await.unwrap();
    }

    /// Next frame the host sent, failing after one second.
    pub async fn recv(&mut self) -> Value {
        tokio::time::timeout(Duration::from_secs(1), self.inbox.recv())
            .await
            .expect("timed out waiting for host frame")
            .expect("host channel closed")
    }

    /// Whether the host sends nothing within a short window.
    pub async fn is_quiet(&mut self) -> bool {
        tokio::time::timeout(Duration::from_millis(50), self.inbox.recv())
            .await
            .is_err()
    }

    /// Run initialize + initialized and wait until the host has processed
    /// both. Returns the initialize response.
    pub async fn handshake(&mut self) -> Value {
        self.send(initialize_request(1)).await;
        let response = self.recv().await;
        self.send(initialized_notification()).await;
        self.sync().await;
        response
    }

    /// Round-trip a ping so every earlier frame has been handled.
    pub async fn sync(&mut self) {
        self.send(request(1_000_000, "ping", json!({}))).await;
        let pong = self.recv().await;
        assert_eq!(pong["id"], json!(1_000_000));
    }
}

/// Counts invocations of a callback.
#[derive(Clone, Default)]
pub struct Counter(Arc<AtomicUsize>);

impl Counter {
    pub fn hit(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Records values handed to a callback.
#[derive(Clone)]
pub struct Recorder<T>(Arc<Mutex<Vec<T>>>);

impl<T> Default for Recorder<T> {
    fn default() -> Self {
        Self(Arc::new(Mutex::new(Vec::new())))
    }
}

impl<T: Clone> Recorder<T> {
    pub fn push(&self, value: T) {
        self.0.lock().unwrap().push(value);
    }

    pub fn values(&self) -> Vec<T> {
        self.0.lock().unwrap().clone()
    }
}

/// A text block, for building expected values.
pub fn text_block(text: &str) -> ContentBlock {
    ContentBlock::text(text)
}
