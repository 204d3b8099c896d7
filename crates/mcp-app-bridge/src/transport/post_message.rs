//! `postMessage` transport: frames travel as structured-clone payloads
//! between a page and an embedded frame.
//!
//! The embedder owns the real window objects: outbound frames go through a
//! [`MessageTarget`], inbound events are pushed in with
//! [`PostMessageTransport::dispatch_event`]. Events from any source other
//! than the expected peer are ignored.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::{CloseCallback, Incoming, Transport, TransportCore};
use crate::types::{BridgeError, BridgeResult, JsonRpcMessage};

/// The window (or frame) messages are posted to.
pub trait MessageTarget: Send + Sync {
    /// Post a payload, restricted to `target_origin` (`"*"` for any).
    fn post_message(&self, message: Value, target_origin: &str) -> Result<(), String>;
}

/// A `message` event as seen by a listener.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageEvent {
    /// Identity of the sending window, if known.
    pub source: Option<String>,
    /// Origin of the sender.
    pub origin: String,
    /// The posted payload.
    pub data: Value,
}

impl MessageEvent {
    pub fn new(source: impl Into<String>, origin: impl Into<String>, data: Value) -> Self {
        Self {
            source: Some(source.into()),
            origin: origin.into(),
            data,
        }
    }
}

/// Transport over `window.postMessage`.
pub struct PostMessageTransport {
    core: TransportCore,
    target: Arc<dyn MessageTarget>,
    target_origin: String,
    expected_source: Option<String>,
    listening: AtomicBool,
}

impl PostMessageTransport {
    /// Post to `target`, accepting events from `expected_source` only.
    pub fn new(target: Arc<dyn MessageTarget>, expected_source: Option<String>) -> Self {
        Self {
            core: TransportCore::new("postMessage"),
            target,
            target_origin: "*".to_string(),
            expected_source,
            listening: AtomicBool::new(false),
        }
    }

    /// Restrict outbound posts to one origin.
    pub fn with_target_origin(mut self, origin: impl Into<String>) -> Self {
        self.target_origin = origin.into();
        self
    }

    /// Feed one window `message` event. Returns whether it was accepted.
    pub fn dispatch_event(&self, event: MessageEvent) -> bool {
        if !self.listening.load(Ordering::SeqCst) {
            tracing::debug!("postMessage listener not registered, dropping event");
            return false;
        }
        if let Some(expected) = &self.expected_source {
            if event.source.as_deref() != Some(expected.as_str()) {
                tracing::debug!(
                    origin = %event.origin,
                    "Ignoring message from unexpected source"
                );
                return false;
            }
        }
        self.core.deliver(event.data)
    }
}

#[async_trait]
impl Transport for PostMessageTransport {
    async fn start(&self) -> BridgeResult<()> {
        self.core.ensure_open()?;
        if self.core.mark_started() {
            self.listening.store(true, Ordering::SeqCst);
        }
        Ok(())
    }

    async fn send(&self, message: JsonRpcMessage) -> BridgeResult<()> {
        self.core.ensure_open()?;
        self.target
            .post_message(message.to_value(), &self.target_origin)
            .map_err(BridgeError::Transport)
    }

    async fn close(&self) -> BridgeResult<()> {
        self.listening.store(false, Ordering::SeqCst);
        self.core.shutdown();
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
