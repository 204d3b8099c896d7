//! Transport layer: one implementation per channel, all behind [`Transport`].
//!
//! A transport only moves frames. It never retries, batches or applies
//! backpressure; inbound frames are delivered in the order the channel
//! received them, at most once.

pub mod adapter;
pub mod memory;
pub mod post_message;
pub mod stdio;
pub mod webview;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::types::{BridgeError, BridgeResult, JsonRpcMessage};

pub use adapter::{AdapterTransport, ForeignFunctions, ForeignGlobals, ForeignHost};
pub use memory::InMemoryTransport;
pub use post_message::{MessageEvent, MessageTarget, PostMessageTransport};
pub use stdio::StdioTransport;
pub use webview::{NativeBridge, WebViewTransport};

/// Inbound frames, in channel order.
pub type Incoming = mpsc::UnboundedReceiver<Value>;

/// Invoked once when a transport closes.
pub type CloseCallback = Box<dyn FnOnce() + Send>;

/// The channel contract every bridge transport implements.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Begin listening. Calling it again is a no-op.
    async fn start(&self) -> BridgeResult<()>;

    /// Send one message. Fails with [`BridgeError::Closed`] after `close()`.
    async fn send(&self, message: JsonRpcMessage) -> BridgeResult<()>;

    /// Stop delivery, release channel resources and fire the close callback.
    async fn close(&self) -> BridgeResult<()>;

    /// Take the inbound stream. Only the first caller gets it.
    fn take_incoming(&self) -> Option<Incoming>;

    /// Register the close callback.
    fn set_onclose(&self, callback: CloseCallback);

    /// Whether `close()` has run.
    fn is_closed(&self) -> bool;
}

/// Bookkeeping shared by all transports: lifecycle flags, the inbound
/// queue and the close callback.
pub struct TransportCore {
    label: &'static str,
    started: AtomicBool,
    closed: AtomicBool,
    inbound_tx: Mutex<Option<mpsc::UnboundedSender<Value>>>,
    inbound_rx: Mutex<Option<Incoming>>,
    onclose: Mutex<Option<CloseCallback>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl TransportCore {
    pub fn new(label: &'static str) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            label,
            started: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            inbound_tx: Mutex::new(Some(tx)),
            inbound_rx: Mutex::new(Some(rx)),
            onclose: Mutex::new(None),
        }
    }

    /// Channel name, for logs.
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Mark started. Returns true only for the first call.
    pub fn mark_started(&self) -> bool {
        let first = !self.started.swap(true, Ordering::SeqCst);
        if first {
            tracing::debug!("{} transport started", self.label);
        }
        first
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Fail with [`BridgeError::Closed`] once closed.
    pub fn ensure_open(&self) -> BridgeResult<()> {
        if self.is_closed() {
            return Err(BridgeError::Closed);
        }
        Ok(())
    }

    /// Queue an inbound frame. Returns false if the transport is closed.
    pub fn deliver(&self, frame: Value) -> bool {
        if self.is_closed() {
            tracing::debug!("{} transport closed, dropping inbound frame", self.label);
            return false;
        }
        match lock(&self.inbound_tx).as_ref() {
            Some(tx) => tx.send(frame).is_ok(),
            None => false,
        }
    }

    pub fn take_incoming(&self) -> Option<Incoming> {
        lock(&self.inbound_rx).take()
    }

    pub fn set_onclose(&self, callback: CloseCallback) {
        *lock(&self.onclose) = Some(callback);
    }

    /// Close: end the inbound stream and fire the close callback.
    /// Returns true only for the call that actually closed.
    pub fn shutdown(&self) -> bool {
        if self.closed.swap(true, Ordering::SeqCst) {
            return false;
        }
        lock(&self.inbound_tx).take();
        tracing::debug!("{} transport closed", self.label);
        let callback = lock(&self.onclose).take();
        if let Some(callback) = callback {
            callback();
        }
        true
    }
}
