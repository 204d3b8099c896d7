//! Fixed method tables for both engines, plus response helpers.
//!
//! The tables are plain enums resolved by name; they are never modified
//! after construction. A name that resolves to nothing is "not handled".

use serde::Serialize;
use serde_json::Value;

use crate::types::{
    methods, BridgeError, BridgeResult, JsonRpcMessage, JsonRpcResponse, RequestId,
};

/// Requests a Host engine answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostRequest {
    Initialize,
    ToolsCall,
    ResourcesRead,
    Message,
    OpenLink,
    RequestDisplayMode,
    UpdateModelContext,
    Ping,
}

impl HostRequest {
    pub fn from_method(method: &str) -> Option<Self> {
        Some(match method {
            methods::INITIALIZE => HostRequest::Initialize,
            methods::TOOLS_CALL => HostRequest::ToolsCall,
            methods::RESOURCES_READ => HostRequest::ResourcesRead,
            methods::MESSAGE => HostRequest::Message,
            methods::OPEN_LINK => HostRequest::OpenLink,
            methods::REQUEST_DISPLAY_MODE => HostRequest::RequestDisplayMode,
            methods::UPDATE_MODEL_CONTEXT => HostRequest::UpdateModelContext,
            methods::PING => HostRequest::Ping,
            _ => return None,
        })
    }

    /// Whether this request is expected before the handshake completes.
    pub fn allowed_before_ready(self) -> bool {
        matches!(self, HostRequest::Initialize | HostRequest::Ping)
    }

    /// Whether answering waits on a collaborator. Such requests are
    /// answered off the reader loop.
    pub fn awaits_collaborator(self) -> bool {
        !matches!(self, HostRequest::Initialize | HostRequest::Ping)
    }
}

/// Notifications a Host engine accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostNotification {
    Initialized,
    SizeChanged,
    LogMessage,
    ModelContextChanged,
}

impl HostNotification {
    pub fn from_method(method: &str) -> Option<Self> {
        Some(match method {
            methods::INITIALIZED => HostNotification::Initialized,
            methods::SIZE_CHANGED => HostNotification::SizeChanged,
            methods::LOG_MESSAGE => HostNotification::LogMessage,
            methods::MODEL_CONTEXT_CHANGED => HostNotification::ModelContextChanged,
            _ => return None,
        })
    }
}

/// Requests an App engine answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppRequest {
    ResourceTeardown,
    Ping,
}

impl AppRequest {
    pub fn from_method(method: &str) -> Option<Self> {
        Some(match method {
            methods::RESOURCE_TEARDOWN => AppRequest::ResourceTeardown,
            methods::PING => AppRequest::Ping,
            _ => return None,
        })
    }

    /// Whether answering waits on an App handler.
    pub fn awaits_collaborator(self) -> bool {
        matches!(self, AppRequest::ResourceTeardown)
    }
}

/// Notifications an App engine accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppNotification {
    ToolInput,
    ToolInputPartial,
    ToolResult,
    ToolCancelled,
    HostContextChanged,
    WidgetState,
}

impl AppNotification {
    pub fn from_method(method: &str) -> Option<Self> {
        Some(match method {
            methods::TOOL_INPUT => AppNotification::ToolInput,
            methods::TOOL_INPUT_PARTIAL => AppNotification::ToolInputPartial,
            methods::TOOL_RESULT => AppNotification::ToolResult,
            methods::TOOL_CANCELLED => AppNotification::ToolCancelled,
            methods::HOST_CONTEXT_CHANGED | methods::HOST_CONTEXT_CHANGED_ALIAS => {
                AppNotification::HostContextChanged
            }
            methods::WIDGET_STATE => AppNotification::WidgetState,
            _ => return None,
        })
    }
}

/// Serialize a handler's typed result.
pub fn to_result<T: Serialize>(result: BridgeResult<T>) -> BridgeResult<Value> {
    result.and_then(|value| serde_json::to_value(value).map_err(BridgeError::from))
}

/// Turn a handler outcome into the response message for `id`.
pub fn response_for(id: RequestId, outcome: BridgeResult<Value>) -> JsonRpcMessage {
    match outcome {
        Ok(result) => JsonRpcMessage::Response(JsonRpcResponse::new(id, result)),
        Err(err) => JsonRpcMessage::Error(err.to_json_rpc_error(id)),
    }
}
