//! WebView transport: frames cross a native JavaScript bridge as strings.
//!
//! Outbound frames are serialized and handed to the platform's script
//! message handler. The native side delivers inbound frames by calling
//! `receiveMessage(jsonString)`, which lands in
//! [`WebViewTransport::receive_message`].

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::{CloseCallback, Incoming, Transport, TransportCore};
use crate::types::{BridgeError, BridgeResult, JsonRpcMessage};

/// The platform side of the bridge (script message handler / JS interface).
pub trait NativeBridge: Send + Sync {
    /// Hand one serialized frame to the native side.
    fn post_message(&self, json: &str) -> Result<(), String>;

    /// Deregister the page's message handler.
    fn unregister(&self) {}
}

/// Transport over a native WebView bridge.
pub struct WebViewTransport {
    core: TransportCore,
    bridge: Arc<dyn NativeBridge>,
}

impl WebViewTransport {
    pub fn new(bridge: Arc<dyn NativeBridge>) -> Self {
        Self {
            core: TransportCore::new("webview"),
            bridge,
        }
    }

    /// Entry point for `receiveMessage(jsonString)`.
    ///
    /// Malformed strings are logged and dropped; returns whether the frame
    /// was queued.
    pub fn receive_message(&self, json: &str) -> bool {
        match serde_json::from_str::<Value>(json) {
            Ok(frame) => self.core.deliver(frame),
            Err(e) => {
                tracing::warn!(error = %e, "Dropping malformed frame from native bridge");
                false
            }
        }
    }
}

#[async_trait]
impl Transport for WebViewTransport {
    async fn start(&self) -> BridgeResult<()> {
        self.core.ensure_open()?;
        self.core.mark_started();
        Ok(())
    }

    async fn send(&self, message: JsonRpcMessage) -> BridgeResult<()> {
        self.core.ensure_open()?;
        let json = serde_json::to_string(&message)?;
        self.bridge.post_message(&json).map_err(BridgeError::Transport)
    }

    async fn close(&self) -> BridgeResult<()> {
        if self.core.shutdown() {
            self.bridge.unregister();
        }
        Ok(())
    }

    fn take_incoming(&self) -> Option<Incoming> {
        self.core.take_incoming()
    }

    fn set_onclose(&self, callback: CloseCallback) {
        self.core.set_onclose(callback);
    }

    fn is_closed(&self) -> bool {
        self.core.is_closed()
    }
}
