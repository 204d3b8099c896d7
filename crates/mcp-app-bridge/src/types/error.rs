//! Error types and JSON-RPC error codes for the bridge.

use serde_json::Value;

use super::message::{JsonRpcError, JsonRpcErrorObject, ParseFailure, RequestId};

/// Standard JSON-RPC 2.0 error codes.
pub mod error_codes {
    /// Invalid JSON was received.
    pub const PARSE_ERROR: i32 = -32700;
    /// The JSON sent is not a valid request object.
    pub const INVALID_REQUEST: i32 = -32600;
    /// The method (or the capability behind it) is not available.
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// Invalid method parameters.
    pub const INVALID_PARAMS: i32 = -32602;
    /// A handler failed.
    pub const INTERNAL_ERROR: i32 = -32603;
    /// Reserved for errors from the underlying MCP connection, surfaced verbatim.
    pub const MCP_ERROR: i32 = -32000;
}

/// Result alias used across the crate.
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Every failure the bridge can report.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// Frame was not valid JSON.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Frame was JSON but not a valid JSON-RPC message.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// No handler exists for the method.
    #[error("Method not found: {0}")]
    MethodNotFound(String),

    /// Method is known, but the collaborator or capability behind it is missing.
    #[error("{0} is not supported")]
    NotSupported(String),

    /// Params did not match the method's schema.
    #[error("Invalid params: {0}")]
    InvalidParams(String),

    /// A handler failed.
    #[error("{0}")]
    Internal(String),

    /// An error object received from (or forwarded to) the peer, kept verbatim.
    #[error("{0}")]
    Rpc(JsonRpcErrorObject),

    /// Transport was closed; nothing more can be sent.
    #[error("Transport closed")]
    Closed,

    /// Channel-specific transport failure.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Handshake has not completed.
    #[error("Not connected: {0}")]
    NotConnected(String),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization failure.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BridgeError {
    /// JSON-RPC error code for this error.
    pub fn code(&self) -> i32 {
        match self {
            BridgeError::ParseError(_) => error_codes::PARSE_ERROR,
            BridgeError::InvalidRequest(_) => error_codes::INVALID_REQUEST,
            BridgeError::MethodNotFound(_) | BridgeError::NotSupported(_) => {
                error_codes::METHOD_NOT_FOUND
            }
            BridgeError::InvalidParams(_) => error_codes::INVALID_PARAMS,
            BridgeError::Rpc(obj) => obj.code,
            BridgeError::Internal(_)
            | BridgeError::Closed
            | BridgeError::Transport(_)
            | BridgeError::NotConnected(_)
            | BridgeError::Config(_)
            | BridgeError::Io(_)
            | BridgeError::Serialization(_) => error_codes::INTERNAL_ERROR,
        }
    }

    /// The error object sent over the wire.
    pub fn to_error_object(&self) -> JsonRpcErrorObject {
        match self {
            BridgeError::Rpc(obj) => obj.clone(),
            other => JsonRpcErrorObject {
                code: other.code(),
                message: other.to_string(),
                data: None,
            },
        }
    }

    /// Build a JSON-RPC error response for this error.
    pub fn to_json_rpc_error(&self, id: impl Into<Option<RequestId>>) -> JsonRpcError {
        JsonRpcError {
            jsonrpc: super::message::JSONRPC_VERSION.to_string(),
            id: id.into(),
            error: self.to_error_object(),
        }
    }

    /// Convert a collaborator failure into a handler-level error.
    ///
    /// An upstream MCP error wrapped in the `anyhow::Error` keeps its own
    /// code, message and data; anything else becomes `-32603` with the
    /// error's display text.
    pub fn from_handler(err: anyhow::Error) -> Self {
        match err.downcast::<JsonRpcErrorObject>() {
            Ok(obj) => BridgeError::Rpc(obj),
            Err(err) => match err.downcast::<BridgeError>() {
                Ok(bridge) => bridge,
                Err(err) => BridgeError::Internal(err.to_string()),
            },
        }
    }

    /// Upstream MCP error with code `-32000`.
    pub fn mcp(message: impl Into<String>, data: Option<Value>) -> Self {
        BridgeError::Rpc(JsonRpcErrorObject {
            code: error_codes::MCP_ERROR,
            message: message.into(),
            data,
        })
    }
}

impl From<ParseFailure> for BridgeError {
    fn from(failure: ParseFailure) -> Self {
        match failure {
            ParseFailure::Malformed(msg) => BridgeError::ParseError(msg),
            ParseFailure::Invalid(msg) => BridgeError::InvalidRequest(msg),
        }
    }
}

impl From<JsonRpcErrorObject> for BridgeError {
    fn from(obj: JsonRpcErrorObject) -> Self {
        BridgeError::Rpc(obj)
    }
}
