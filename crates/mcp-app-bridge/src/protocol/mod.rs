//! Bridge protocol layer: handshake, negotiation, dispatch, teardown, and
//! the Host and App engines built from them.

pub mod app;
pub mod dispatch;
pub mod host;
pub mod negotiation;
pub mod state;
pub mod teardown;
pub mod validator;

use std::sync::Arc;

use futures::future::BoxFuture;

pub use app::{AppBridge, AppBridgeBuilder, AppHandlers, HostSession, TeardownHandler};
pub use host::{HostBridge, HostBridgeBuilder, HostHandlers};
pub use negotiation::{
    negotiate_version, negotiate_version_with, supported_version, CapabilityProbe,
    NegotiatedCapabilities,
};
pub use state::{ConnectionState, Handshake};
pub use teardown::{
    PendingTeardown, TeardownController, TeardownOutcome, TeardownState, DEFAULT_TEARDOWN_TIMEOUT,
};

/// Future returned by an async collaborator.
pub type HandlerFuture<T> = BoxFuture<'static, anyhow::Result<T>>;

/// Synchronous event callback.
pub type Callback<T> = Arc<dyn Fn(T) + Send + Sync>;

/// Fires once when the handshake completes.
pub type ReadyCallback = Arc<dyn Fn() + Send + Sync>;
