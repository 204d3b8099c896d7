//! In-process transport: a linked pair passing messages directly, for tests
//! and for running Host and App in the same process.

use std::sync::Arc;

use async_trait::async_trait;

use super::{CloseCallback, Incoming, Transport, TransportCore};
use crate::types::{BridgeError, BridgeResult, JsonRpcMessage};

/// One end of an in-memory channel.
pub struct InMemoryTransport {
    local: Arc<TransportCore>,
    peer: Arc<TransportCore>,
}

impl InMemoryTransport {
    /// Create two linked ends. What one sends, the other receives.
    pub fn pair() -> (Self, Self) {
        let a = Arc::new(TransportCore::new("in-memory"));
        let b = Arc::new(TransportCore::new("in-memory"));
        (
            Self {
                local: a.clone(),
                peer: b.clone(),
            },
            Self { local: b, peer: a },
        )
    }
}

#[async_trait]
impl Transport for InMemoryTransport {
    async fn start(&self) -> BridgeResult<()> {
        self.local.mark_started();
        Ok(())
    }

    async fn send(&self, message: JsonRpcMessage) -> BridgeResult<()> {
        self.local.ensure_open()?;
        if !self.peer.deliver(message.to_value()) {
            return Err(BridgeError::Closed);
        }
        Ok(())
    }

    /// Closing either end closes both.
    async fn close(&self) -> BridgeResult<()> {
        self.local.shutdown();
        self.peer.shutdown();
        Ok(())
    }

    fn take_incoming(&self) -> Option<Incoming> {
        self.local.take_incoming()
    }

    fn set_onclose(&self, callback: CloseCallback) {
        self.local.set_onclose(callback);
    }

    fn is_closed(&self) -> bool {
        self.local.is_closed()
    }
}
