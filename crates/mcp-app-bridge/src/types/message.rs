//! JSON-RPC 2.0 message types for the App ⇄ Host bridge.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::error::error_codes;

/// JSON-RPC 2.0 protocol version.
pub const JSONRPC_VERSION: &str = "2.0";

/// Unique request identifier, either a string or an integer, never null.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    /// String identifier.
    String(String),
    /// Numeric identifier.
    Number(i64),
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestId::String(s) => write!(f, "{s}"),
            RequestId::Number(n) => write!(f, "{n}"),
        }
    }
}

impl From<i64> for RequestId {
    fn from(n: i64) -> Self {
        RequestId::Number(n)
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        RequestId::String(s.to_string())
    }
}

impl From<String> for RequestId {
    fn from(s: String) -> Self {
        RequestId::String(s)
    }
}

/// A JSON-RPC 2.0 request message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// Must be "2.0".
    pub jsonrpc: String,
    /// Unique request identifier.
    pub id: RequestId,
    /// Method name to invoke.
    pub method: String,
    /// Optional parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// A JSON-RPC 2.0 success response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// Must be "2.0".
    pub jsonrpc: String,
    /// Echoes the request id.
    pub id: RequestId,
    /// Result payload.
    pub result: Value,
}

/// A JSON-RPC 2.0 error response.
///
/// The id is absent when the failing request could not be identified
/// (e.g. the frame did not parse).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Must be "2.0".
    pub jsonrpc: String,
    /// Echoes the request id, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RequestId>,
    /// Error object.
    pub error: JsonRpcErrorObject,
}

/// Error object within a JSON-RPC error response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcErrorObject {
    /// Numeric error code.
    pub code: i32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl std::fmt::Display for JsonRpcErrorObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

impl std::error::Error for JsonRpcErrorObject {}

/// A JSON-RPC 2.0 notification (no id, no response expected).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcNotification {
    /// Must be "2.0".
    pub jsonrpc: String,
    /// Method name.
    pub method: String,
    /// Optional parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// Union type for any JSON-RPC message.
///
/// Deserialization goes through [`JsonRpcMessage::from_value`], which
/// decides the variant from the fields present rather than by trial.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum JsonRpcMessage {
    /// A request (has id + method).
    Request(JsonRpcRequest),
    /// A notification (has method, no id).
    Notification(JsonRpcNotification),
    /// A success response (has id + result).
    Response(JsonRpcResponse),
    /// An error response (has error, maybe id).
    Error(JsonRpcError),
}

/// The four message kinds of the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Request,
    Notification,
    Response,
    ErrorResponse,
}

/// Why an inbound frame could not be turned into a [`JsonRpcMessage`].
///
/// Never raised as a panic or propagated as fatal; engines log it and
/// report the frame as not handled.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseFailure {
    /// Not JSON at all.
    #[error("malformed JSON: {0}")]
    Malformed(String),
    /// JSON, but not a valid JSON-RPC 2.0 message.
    #[error("invalid JSON-RPC message: {0}")]
    Invalid(String),
}

impl ParseFailure {
    /// JSON-RPC error code for this failure.
    pub fn code(&self) -> i32 {
        match self {
            ParseFailure::Malformed(_) => error_codes::PARSE_ERROR,
            ParseFailure::Invalid(_) => error_codes::INVALID_REQUEST,
        }
    }
}

/// Parse a raw text frame into a message. Never panics.
pub fn parse(raw: &str) -> Result<JsonRpcMessage, ParseFailure> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| ParseFailure::Malformed(e.to_string()))?;
    JsonRpcMessage::from_value(value)
}

/// Classify a message into its kind.
pub fn classify(message: &JsonRpcMessage) -> MessageKind {
    message.kind()
}

impl JsonRpcMessage {
    /// Build a message from an already-decoded JSON value.
    pub fn from_value(value: Value) -> Result<Self, ParseFailure> {
        let Value::Object(mut obj) = value else {
            return Err(ParseFailure::Invalid("message is not an object".to_string()));
        };

        match obj.get("jsonrpc").and_then(Value::as_str) {
            Some(JSONRPC_VERSION) => {}
            Some(other) => {
                return Err(ParseFailure::Invalid(format!(
                    "unsupported jsonrpc version {other:?}"
                )))
            }
            None => return Err(ParseFailure::Invalid("missing jsonrpc field".to_string())),
        }

        let id = take_id(&mut obj)?;
        let params = obj.remove("params");

        if let Some(method) = obj.remove("method") {
            let Value::String(method) = method else {
                return Err(ParseFailure::Invalid("method must be a string".to_string()));
            };
            if obj.contains_key("result") || obj.contains_key("error") {
                return Err(ParseFailure::Invalid(
                    "method cannot be combined with result or error".to_string(),
                ));
            }
            return Ok(match id {
                Some(id) => JsonRpcMessage::Request(JsonRpcRequest {
                    jsonrpc: JSONRPC_VERSION.to_string(),
                    id,
                    method,
                    params,
                }),
                None => JsonRpcMessage::Notification(JsonRpcNotification {
                    jsonrpc: JSONRPC_VERSION.to_string(),
                    method,
                    params,
                }),
            });
        }

        match (obj.remove("result"), obj.remove("error")) {
            (Some(_), Some(_)) => Err(ParseFailure::Invalid(
                "response carries both result and error".to_string(),
            )),
            (Some(result), None) => {
                let id = id.ok_or_else(|| {
                    ParseFailure::Invalid("response without an id".to_string())
                })?;
                Ok(JsonRpcMessage::Response(JsonRpcResponse {
                    jsonrpc: JSONRPC_VERSION.to_string(),
                    id,
                    result,
                }))
            }
            (None, Some(error)) => {
                let error: JsonRpcErrorObject = serde_json::from_value(error)
                    .map_err(|e| ParseFailure::Invalid(format!("bad error object: {e}")))?;
                Ok(JsonRpcMessage::Error(JsonRpcError {
                    jsonrpc: JSONRPC_VERSION.to_string(),
                    id,
                    error,
                }))
            }
            (None, None) => Err(ParseFailure::Invalid(
                "message has neither method, result nor error".to_string(),
            )),
        }
    }

    /// The kind of this message.
    pub fn kind(&self) -> MessageKind {
        match self {
            JsonRpcMessage::Request(_) => MessageKind::Request,
            JsonRpcMessage::Notification(_) => MessageKind::Notification,
            JsonRpcMessage::Response(_) => MessageKind::Response,
            JsonRpcMessage::Error(_) => MessageKind::ErrorResponse,
        }
    }

    /// Method name, for requests and notifications.
    pub fn method(&self) -> Option<&str> {
        match self {
            JsonRpcMessage::Request(r) => Some(&r.method),
            JsonRpcMessage::Notification(n) => Some(&n.method),
            _ => None,
        }
    }

    /// Request or response id, if the message carries one.
    pub fn id(&self) -> Option<&RequestId> {
        match self {
            JsonRpcMessage::Request(r) => Some(&r.id),
            JsonRpcMessage::Response(r) => Some(&r.id),
            JsonRpcMessage::Error(e) => e.id.as_ref(),
            JsonRpcMessage::Notification(_) => None,
        }
    }

    /// Encode as a JSON value.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Encode as a JSON text frame.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

impl<'de> Deserialize<'de> for JsonRpcMessage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        JsonRpcMessage::from_value(value).map_err(serde::de::Error::custom)
    }
}

fn take_id(obj: &mut Map<String, Value>) -> Result<Option<RequestId>, ParseFailure> {
    match obj.remove("id") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(RequestId::String(s))),
        Some(Value::Number(n)) => n
            .as_i64()
            .map(|n| Some(RequestId::Number(n)))
            .ok_or_else(|| ParseFailure::Invalid(format!("id {n} is not an integer"))),
        Some(other) => Err(ParseFailure::Invalid(format!(
            "id must be a string or integer, got {other}"
        ))),
    }
}

impl JsonRpcRequest {
    /// Create a new request.
    pub fn new(id: RequestId, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            method: method.into(),
            params,
        }
    }
}

impl JsonRpcResponse {
    /// Create a new success response.
    pub fn new(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result,
        }
    }
}

impl JsonRpcError {
    /// Create a new error response.
    pub fn new(id: Option<RequestId>, code: i32, message: String) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            error: JsonRpcErrorObject {
                code,
                message,
                data: None,
            },
        }
    }
}

impl JsonRpcNotification {
    /// Create a new notification.
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params,
        }
    }
}

impl From<JsonRpcRequest> for JsonRpcMessage {
    fn from(r: JsonRpcRequest) -> Self {
        JsonRpcMessage::Request(r)
    }
}

impl From<JsonRpcNotification> for JsonRpcMessage {
    fn from(n: JsonRpcNotification) -> Self {
        JsonRpcMessage::Notification(n)
    }
}

impl From<JsonRpcResponse> for JsonRpcMessage {
    fn from(r: JsonRpcResponse) -> Self {
        JsonRpcMessage::Response(r)
    }
}

impl From<JsonRpcError> for JsonRpcMessage {
    fn from(e: JsonRpcError) -> Self {
        JsonRpcMessage::Error(e)
    }
}
