//! Capability and initialization types for the `ui/initialize` handshake.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use super::context::{DisplayMode, HostContext};

/// Latest bridge protocol version.
pub const LATEST_PROTOCOL_VERSION: &str = "2025-11-21";

/// Every protocol version this crate can speak, newest first.
pub const SUPPORTED_PROTOCOL_VERSIONS: &[&str] = &[LATEST_PROTOCOL_VERSION, "2025-06-18"];

/// Default host name.
pub const HOST_NAME: &str = "mcp-app-bridge";

/// Crate version, used as the default host version.
pub const HOST_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Identifies either peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Implementation {
    /// Name of the implementation.
    pub name: String,
    /// Version string.
    pub version: String,
    /// Optional display title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Implementation {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            title: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Empty marker object; its presence is the capability signal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityMarker {}

/// Capability with a `listChanged` flag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListChangedCapability {
    /// Whether list-changed notifications will be sent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_changed: Option<bool>,
}

/// Capabilities the Host advertises in its initialize result.
///
/// Presence of a key means "supported"; absence means "not supported".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostCapabilities {
    /// Experimental capabilities.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experimental: Option<HashMap<String, Value>>,
    /// Host can open external links (`ui/open-link`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_links: Option<CapabilityMarker>,
    /// Host proxies `tools/call` to the MCP server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_tools: Option<ListChangedCapability>,
    /// Host proxies `resources/read` to the MCP server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_resources: Option<ListChangedCapability>,
    /// Host accepts `notifications/message`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<CapabilityMarker>,
    /// Host displays `ui/message` content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<CapabilityMarker>,
    /// Host persists `ui/update-model-context` state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_model_context: Option<CapabilityMarker>,
}

impl HostCapabilities {
    /// Capability key names that are present, in a fixed order.
    pub fn present_keys(&self) -> Vec<&'static str> {
        let mut keys = Vec::new();
        if self.experimental.is_some() {
            keys.push("experimental");
        }
        if self.open_links.is_some() {
            keys.push("openLinks");
        }
        if self.server_tools.is_some() {
            keys.push("serverTools");
        }
        if self.server_resources.is_some() {
            keys.push("serverResources");
        }
        if self.logging.is_some() {
            keys.push("logging");
        }
        if self.message.is_some() {
            keys.push("message");
        }
        if self.update_model_context.is_some() {
            keys.push("updateModelContext");
        }
        keys
    }
}

/// Capabilities the App declares in `ui/initialize`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppCapabilities {
    /// Experimental capabilities.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experimental: Option<HashMap<String, Value>>,
    /// App exposes tools of its own.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<ListChangedCapability>,
    /// Display modes the App can render in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_display_modes: Option<Vec<DisplayMode>>,
}

/// App → Host: `ui/initialize` params.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiInitializeParams {
    /// Requested protocol version.
    pub protocol_version: String,
    /// App implementation info.
    pub app_info: Implementation,
    /// App capabilities.
    #[serde(default)]
    pub app_capabilities: AppCapabilities,
}

/// Host → App: `ui/initialize` result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiInitializeResult {
    /// Negotiated protocol version.
    pub protocol_version: String,
    /// Host implementation info.
    pub host_info: Implementation,
    /// Host capabilities, computed for this connection.
    pub host_capabilities: HostCapabilities,
    /// Snapshot of the host environment.
    #[serde(default)]
    pub host_context: HostContext,
}
