//! MCP App Bridge: JSON-RPC protocol between sandboxed MCP Apps and the
//! hosts that embed them.
//!
//! One protocol engine per side ([`HostBridge`], [`AppBridge`]) runs
//! unmodified over any [`Transport`]: window `postMessage`, native WebView
//! bridges, an in-process pair, stdio, or an adapter onto a foreign host
//! API.

pub mod config;
pub mod protocol;
pub mod transport;
pub mod types;

pub use config::{load_config, BridgeConfig};
pub use protocol::{AppBridge, HostBridge, TeardownOutcome};
pub use transport::{
    AdapterTransport, InMemoryTransport, PostMessageTransport, StdioTransport, Transport,
    WebViewTransport,
};
pub use types::{BridgeError, BridgeResult};
