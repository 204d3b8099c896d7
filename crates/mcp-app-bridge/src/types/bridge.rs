//! Method catalogue and per-method params/results of the bridge protocol.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::content::{ContentBlock, ResourceContents};
use super::context::DisplayMode;

/// All bridge method names as constants.
pub mod methods {
    // App -> Host requests
    pub const INITIALIZE: &str = "ui/initialize";
    pub const MESSAGE: &str = "ui/message";
    pub const OPEN_LINK: &str = "ui/open-link";
    pub const REQUEST_DISPLAY_MODE: &str = "ui/request-display-mode";
    pub const UPDATE_MODEL_CONTEXT: &str = "ui/update-model-context";
    pub const TOOLS_CALL: &str = "tools/call";
    pub const RESOURCES_READ: &str = "resources/read";

    // App -> Host notifications
    pub const INITIALIZED: &str = "ui/notifications/initialized";
    pub const SIZE_CHANGED: &str = "ui/notifications/size-changed";
    pub const LOG_MESSAGE: &str = "notifications/message";
    pub const MODEL_CONTEXT_CHANGED: &str = "ui/notifications/update-model-context";

    // Host -> App requests
    pub const RESOURCE_TEARDOWN: &str = "ui/resource-teardown";

    // Host -> App notifications
    pub const TOOL_INPUT: &str = "ui/notifications/tool-input";
    pub const TOOL_INPUT_PARTIAL: &str = "ui/notifications/tool-input-partial";
    pub const TOOL_RESULT: &str = "ui/notifications/tool-result";
    pub const TOOL_CANCELLED: &str = "ui/notifications/tool-cancelled";
    pub const HOST_CONTEXT_CHANGED: &str = "ui/host-context-changed";
    pub const HOST_CONTEXT_CHANGED_ALIAS: &str = "ui/notifications/host-context-changed";
    pub const WIDGET_STATE: &str = "ui/notifications/widget-state";

    // Either direction
    pub const PING: &str = "ping";
}

/// Which peer sends a method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Direction {
    #[serde(rename = "app->host")]
    AppToHost,
    #[serde(rename = "host->app")]
    HostToApp,
    #[serde(rename = "both")]
    Both,
}

/// Whether a method expects a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MethodKind {
    Request,
    Notification,
}

/// One entry of the method catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MethodSpec {
    pub name: &'static str,
    pub direction: Direction,
    pub kind: MethodKind,
}

const fn entry(name: &'static str, direction: Direction, kind: MethodKind) -> MethodSpec {
    MethodSpec {
        name,
        direction,
        kind,
    }
}

/// The full method catalogue.
pub const METHOD_CATALOGUE: &[MethodSpec] = &[
    entry(methods::INITIALIZE, Direction::AppToHost, MethodKind::Request),
    entry(methods::INITIALIZED, Direction::AppToHost, MethodKind::Notification),
    entry(methods::SIZE_CHANGED, Direction::AppToHost, MethodKind::Notification),
    entry(methods::MESSAGE, Direction::AppToHost, MethodKind::Request),
    entry(methods::OPEN_LINK, Direction::AppToHost, MethodKind::Request),
    entry(methods::REQUEST_DISPLAY_MODE, Direction::AppToHost, MethodKind::Request),
    entry(methods::UPDATE_MODEL_CONTEXT, Direction::AppToHost, MethodKind::Request),
    entry(methods::MODEL_CONTEXT_CHANGED, Direction::AppToHost, MethodKind::Notification),
    entry(methods::LOG_MESSAGE, Direction::AppToHost, MethodKind::Notification),
    entry(methods::TOOLS_CALL, Direction::AppToHost, MethodKind::Request),
    entry(methods::RESOURCES_READ, Direction::AppToHost, MethodKind::Request),
    entry(methods::RESOURCE_TEARDOWN, Direction::HostToApp, MethodKind::Request),
    entry(methods::TOOL_INPUT, Direction::HostToApp, MethodKind::Notification),
    entry(methods::TOOL_INPUT_PARTIAL, Direction::HostToApp, MethodKind::Notification),
    entry(methods::TOOL_RESULT, Direction::HostToApp, MethodKind::Notification),
    entry(methods::TOOL_CANCELLED, Direction::HostToApp, MethodKind::Notification),
    entry(methods::HOST_CONTEXT_CHANGED, Direction::HostToApp, MethodKind::Notification),
    entry(methods::WIDGET_STATE, Direction::HostToApp, MethodKind::Notification),
    entry(methods::PING, Direction::Both, MethodKind::Request),
];

/// Look a method up in the catalogue.
pub fn lookup_method(name: &str) -> Option<&'static MethodSpec> {
    METHOD_CATALOGUE.iter().find(|m| m.name == name)
}

/// Host → App: complete tool arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInputParams {
    #[serde(default)]
    pub arguments: Value,
}

/// Host → App: tool was cancelled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolCancelledParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Host → App: persisted widget state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetStateParams {
    pub state: Value,
}

/// Host → App: graceful teardown request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceTeardownParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// App → Host: content size changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SizeChangedParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

/// App → Host: inject a message into the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageParams {
    pub role: String,
    pub content: Vec<ContentBlock>,
}

/// Result of `ui/message` and `ui/open-link`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AckResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

/// App → Host: request to open a URL externally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenLinkParams {
    pub url: String,
}

/// App → Host: request a display mode change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestDisplayModeParams {
    pub mode: DisplayMode,
}

/// Host → App: the display mode actually in effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestDisplayModeResult {
    pub mode: DisplayMode,
}

/// App → Host: update the model context / widget state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateModelContextParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Vec<ContentBlock>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured_content: Option<Value>,
}

/// Log levels for `notifications/message` (syslog severities).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Notice,
    Warning,
    Error,
    Critical,
    Alert,
    Emergency,
}

/// App → Host: log message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogMessageParams {
    /// Log level.
    pub level: LogLevel,
    /// Optional logger name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logger: Option<String>,
    /// Log message data.
    pub data: Value,
}

/// Parameters for `tools/call`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallParams {
    /// Tool name.
    pub name: String,
    /// Tool arguments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Value>,
}

/// Parameters for `resources/read`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceReadParams {
    /// Resource URI.
    pub uri: String,
}

/// Result from `resources/read`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReadResourceResult {
    /// Resource contents.
    pub contents: Vec<ResourceContents>,
}
