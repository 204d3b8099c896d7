//! Stdio transport: newline-delimited JSON frames over a byte stream.
//!
//! Used by the `mcp-app-bridge serve` binary; generic over the reader and
//! writer so tests can drive it through an in-memory duplex pipe.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use super::{CloseCallback, Incoming, Transport, TransportCore};
use crate::types::{BridgeResult, JsonRpcMessage};

type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;
type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Line-delimited JSON-RPC over a reader/writer pair.
pub struct StdioTransport {
    core: Arc<TransportCore>,
    reader: Mutex<Option<BoxedReader>>,
    writer: Mutex<BoxedWriter>,
    reader_task: Mutex<Option<JoinHandle<()>>>,
}

impl StdioTransport {
    /// Transport over the process's stdin and stdout.
    pub fn new() -> Self {
        Self::with_io(tokio::io::stdin(), tokio::io::stdout())
    }

    /// Transport over any reader/writer pair.
    pub fn with_io<R, W>(reader: R, writer: W) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self {
            core: Arc::new(TransportCore::new("stdio")),
            reader: Mutex::new(Some(Box::new(reader))),
            writer: Mutex::new(Box::new(writer)),
            reader_task: Mutex::new(None),
        }
    }
}

impl Default for StdioTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for StdioTransport {
    async fn start(&self) -> BridgeResult<()> {
        self.core.ensure_open()?;
        if !self.core.mark_started() {
            return Ok(());
        }
        let Some(reader) = self.reader.lock().await.take() else {
            return Ok(());
        };

        let core = self.core.clone();
        let task = tokio::spawn(async move {
            let mut lines = BufReader::new(reader).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let line = line.trim();
                        if line.is_empty() {
                            continue;
                        }
                        match serde_json::from_str::<Value>(line) {
                            Ok(frame) => {
                                if !core.deliver(frame) {
                                    break;
                                }
                            }
                            Err(e) => tracing::warn!(error = %e, "Skipping malformed stdio line"),
                        }
                    }
                    Ok(None) => {
                        tracing::info!("stdin closed");
                        break;
                    }
                    Err(e) => {
                        tracing::error!("stdio read failed: {e}");
                        break;
                    }
                }
            }
            core.shutdown();
        });
        *self.reader_task.lock().await = Some(task);
        Ok(())
    }

    async fn send(&self, message: JsonRpcMessage) -> BridgeResult<()> {
        self.core.ensure_open()?;
        let mut line = serde_json::to_string(&message)?;
        line.push('\n');
        let mut writer = self.writer.lock().await;
        writer.write_all(line.as_bytes()).await?;
        writer.flush().await?;
        Ok(())
    }

    /// Stops reading and shuts the writer down, so the peer sees EOF.
    async fn close(&self) -> BridgeResult<()> {
        if !self.core.shutdown() {
            return Ok(());
        }
        if let Some(task) = self.reader_task.lock().await.take() {
            task.abort();
        }
        if let Err(e) = self.writer.lock().await.shutdown().await {
            tracing::debug!("stdio writer shutdown failed: {e}");
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
