//! Host-adapter transport.
//!
//! The other end of this transport does not speak JSON-RPC. Each request
//! the App sends is translated into a call on an injected [`ForeignHost`],
//! and the response is synthesized locally and queued as an inbound frame.
//! Capabilities are derived by probing which foreign functions exist, at
//! the moment `ui/initialize` is handled.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};

use super::{CloseCallback, Incoming, Transport, TransportCore};
use crate::protocol::dispatch::{response_for, to_result};
use crate::protocol::host::log_locally;
use crate::protocol::negotiation::{negotiate_version, CapabilityProbe};
use crate::protocol::validator::decode_params;
use crate::types::{
    methods, normalize_tool_output, AckResult, BridgeError, BridgeResult, DeviceCapabilities,
    DisplayMode, HostContext, Implementation, JsonRpcMessage, JsonRpcNotification,
    LogMessageParams, MessageParams, OpenLinkParams, Platform, RequestDisplayModeParams,
    RequestDisplayModeResult, SafeAreaInsets, SizeChangedParams, Theme, ToolCallParams,
    ToolInputParams, UiInitializeParams, UiInitializeResult, UpdateModelContextParams, Viewport,
    WidgetStateParams, HOST_VERSION,
};

/// Future returned by a foreign host function.
pub type ForeignFuture<T> = crate::protocol::HandlerFuture<T>;

/// An async foreign host function.
pub type ForeignFn<A, R> = Arc<dyn Fn(A) -> ForeignFuture<R> + Send + Sync>;

/// The functions a foreign host exposes. `None` means the host lacks it.
#[derive(Clone, Default)]
pub struct ForeignFunctions {
    /// Invoke an MCP tool by name with arguments.
    pub call_tool: Option<ForeignFn<(String, Value), Value>>,
    /// Post a follow-up message into the conversation.
    pub send_followup_message: Option<ForeignFn<String, ()>>,
    /// Open a URL outside the App.
    pub open_external: Option<ForeignFn<String, ()>>,
    /// Ask for a display mode; resolves to the mode granted.
    pub request_display_mode: Option<ForeignFn<DisplayMode, DisplayMode>>,
    /// Report the App's intrinsic content height.
    pub notify_intrinsic_height: Option<Arc<dyn Fn(f64) + Send + Sync>>,
    /// Persist widget state.
    pub set_widget_state: Option<ForeignFn<Value, ()>>,
}

impl std::fmt::Debug for ForeignFunctions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForeignFunctions")
            .field("call_tool", &self.call_tool.is_some())
            .field("send_followup_message", &self.send_followup_message.is_some())
            .field("open_external", &self.open_external.is_some())
            .field("request_display_mode", &self.request_display_mode.is_some())
            .field("notify_intrinsic_height", &self.notify_intrinsic_height.is_some())
            .field("set_widget_state", &self.set_widget_state.is_some())
            .finish()
    }
}

impl ForeignFunctions {
    /// Which capabilities these functions back.
    pub fn probe(&self) -> CapabilityProbe {
        CapabilityProbe {
            server_tools: self.call_tool.is_some(),
            server_resources: false,
            open_links: self.open_external.is_some(),
            message: self.send_followup_message.is_some(),
            update_model_context: self.set_widget_state.is_some(),
        }
    }

    pub fn with_call_tool<F>(mut self, f: F) -> Self
    where
        F: Fn((String, Value)) -> ForeignFuture<Value> + Send + Sync + 'static,
    {
        self.call_tool = Some(Arc::new(f));
        self
    }

    pub fn with_send_followup_message<F>(mut self, f: F) -> Self
    where
        F: Fn(String) -> ForeignFuture<()> + Send + Sync + 'static,
    {
        self.send_followup_message = Some(Arc::new(f));
        self
    }

    pub fn with_open_external<F>(mut self, f: F) -> Self
    where
        F: Fn(String) -> ForeignFuture<()> + Send + Sync + 'static,
    {
        self.open_external = Some(Arc::new(f));
        self
    }

    pub fn with_request_display_mode<F>(mut self, f: F) -> Self
    where
        F: Fn(DisplayMode) -> ForeignFuture<DisplayMode> + Send + Sync + 'static,
    {
        self.request_display_mode = Some(Arc::new(f));
        self
    }

    pub fn with_notify_intrinsic_height<F>(mut self, f: F) -> Self
    where
        F: Fn(f64) + Send + Sync + 'static,
    {
        self.notify_intrinsic_height = Some(Arc::new(f));
        self
    }

    pub fn with_set_widget_state<F>(mut self, f: F) -> Self
    where
        F: Fn(Value) -> ForeignFuture<()> + Send + Sync + 'static,
    {
        self.set_widget_state = Some(Arc::new(f));
        self
    }
}

/// Properties a foreign host exposes about itself.
///
/// The tool fields are tri-state: `None` (never set) and `Some(Value::Null)`
/// both mean "no value yet" and are never delivered, while any other value,
/// including `{}` or `""`, is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForeignGlobals {
    pub theme: Option<Theme>,
    pub locale: Option<String>,
    pub display_mode: Option<DisplayMode>,
    pub max_height: Option<f64>,
    pub safe_area: Option<SafeAreaInsets>,
    pub platform: Option<Platform>,
    pub device_capabilities: Option<DeviceCapabilities>,
    pub tool_input: Option<Value>,
    pub tool_output: Option<Value>,
    pub tool_response_metadata: Option<Value>,
    pub widget_state: Option<Value>,
}

impl ForeignGlobals {
    /// Host context synthesized from these globals.
    pub fn host_context(&self) -> HostContext {
        HostContext {
            theme: self.theme,
            display_mode: self.display_mode,
            viewport: self.max_height.map(|max_height| Viewport {
                max_height: Some(max_height),
                ..Viewport::default()
            }),
            locale: self.locale.clone(),
            platform: self.platform,
            device_capabilities: self.device_capabilities.clone(),
            safe_area_insets: self.safe_area.clone(),
            ..HostContext::default()
        }
    }
}

/// A foreign host API, injected into [`AdapterTransport`].
///
/// Both methods are read on demand, so a host may expose functions or
/// globals later in its lifecycle.
pub trait ForeignHost: Send + Sync {
    fn globals(&self) -> ForeignGlobals;
    fn functions(&self) -> ForeignFunctions;
}

fn present(value: Option<Value>) -> Option<Value> {
    value.filter(|v| !v.is_null())
}

/// Transport that translates the bridge protocol onto a [`ForeignHost`].
pub struct AdapterTransport {
    core: Arc<TransportCore>,
    host: Arc<dyn ForeignHost>,
    host_info: Implementation,
    initial_state_sent: AtomicBool,
}

impl AdapterTransport {
    pub fn new(host: Arc<dyn ForeignHost>) -> Self {
        Self {
            core: Arc::new(TransportCore::new("adapter")),
            host,
            host_info: Implementation::new("foreign-host-adapter", HOST_VERSION),
            initial_state_sent: AtomicBool::new(false),
        }
    }

    /// Host info reported in the synthesized initialize result.
    pub fn with_host_info(mut self, host_info: Implementation) -> Self {
        self.host_info = host_info;
        self
    }

    /// Re-read the foreign globals and push them to the App as
    /// `ui/host-context-changed`.
    pub fn refresh_globals(&self) -> BridgeResult<()> {
        self.core.ensure_open()?;
        let context = self.host.globals().host_context();
        self.emit(methods::HOST_CONTEXT_CHANGED, context)
    }

    fn emit<P: Serialize>(&self, method: &str, params: P) -> BridgeResult<()> {
        let notification = JsonRpcNotification::new(method, Some(serde_json::to_value(params)?));
        let message: JsonRpcMessage = notification.into();
        if !self.core.deliver(message.to_value()) {
            return Err(BridgeError::Closed);
        }
        Ok(())
    }

    /// Deliver tool input, tool result and widget state from the foreign
    /// host's pre-populated globals. Runs once per transport.
    fn deliver_initial_state(&self) -> BridgeResult<()> {
        if self.initial_state_sent.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let globals = self.host.globals();

        if let Some(arguments) = present(globals.tool_input) {
            self.emit(methods::TOOL_INPUT, ToolInputParams { arguments })?;
        }

        match normalize_tool_output(present(globals.tool_output)) {
            Some(mut result) => {
                if result.meta.is_none() {
                    result.meta = present(globals.tool_response_metadata);
                }
                self.emit(methods::TOOL_RESULT, result)?;
            }
            None => tracing::debug!("No tool output on the foreign host yet"),
        }

        if let Some(state) = present(globals.widget_state) {
            self.emit(methods::WIDGET_STATE, WidgetStateParams { state })?;
        }
        Ok(())
    }

    async fn translate_request(&self, method: &str, params: Option<Value>) -> BridgeResult<Value> {
        let functions = self.host.functions();
        match method {
            methods::INITIALIZE => {
                let params: UiInitializeParams = decode_params(method, params)?;
                let version = negotiate_version(&params.protocol_version);
                tracing::info!(
                    "Adapter initializing app: {} v{}",
                    params.app_info.name,
                    params.app_info.version
                );
                to_result(Ok(UiInitializeResult {
                    protocol_version: version.to_string(),
                    host_info: self.host_info.clone(),
                    host_capabilities: functions.probe().host_capabilities(),
                    host_context: self.host.globals().host_context(),
                }))
            }
            methods::PING => Ok(json!({})),
            methods::TOOLS_CALL => {
                let params: ToolCallParams = decode_params(method, params)?;
                let call_tool = functions
                    .call_tool
                    .ok_or_else(|| BridgeError::NotSupported("Tool calls".to_string()))?;
                let arguments = params.arguments.unwrap_or_else(|| json!({}));
                let output = call_tool((params.name, arguments))
                    .await
                    .map_err(BridgeError::from_handler)?;
                to_result(Ok(normalize_tool_output(Some(output)).unwrap_or_default()))
            }
            methods::MESSAGE => {
                let params: MessageParams = decode_params(method, params)?;
                let followup = functions
                    .send_followup_message
                    .ok_or_else(|| BridgeError::NotSupported("Messages".to_string()))?;
                let prompt = params
                    .content
                    .iter()
                    .filter_map(|block| block.as_text())
                    .collect::<Vec<_>>()
                    .join("\n");
                followup(prompt).await.map_err(BridgeError::from_handler)?;
                to_result(Ok(AckResult::default()))
            }
            methods::OPEN_LINK => {
                let params: OpenLinkParams = decode_params(method, params)?;
                let open = functions
                    .open_external
                    .ok_or_else(|| BridgeError::NotSupported("Opening links".to_string()))?;
                open(params.url).await.map_err(BridgeError::from_handler)?;
                to_result(Ok(AckResult::default()))
            }
            methods::REQUEST_DISPLAY_MODE => {
                let params: RequestDisplayModeParams = decode_params(method, params)?;
                let request = functions.request_display_mode.ok_or_else(|| {
                    BridgeError::NotSupported("Display mode changes".to_string())
                })?;
                let mode = request(params.mode)
                    .await
                    .map_err(BridgeError::from_handler)?;
                to_result(Ok(RequestDisplayModeResult { mode }))
            }
            methods::UPDATE_MODEL_CONTEXT => {
                let params: UpdateModelContextParams = decode_params(method, params)?;
                let set_state = functions.set_widget_state.ok_or_else(|| {
                    BridgeError::NotSupported("Model context updates".to_string())
                })?;
                set_state(widget_state_from(params))
                    .await
                    .map_err(BridgeError::from_handler)?;
                Ok(json!({}))
            }
            methods::RESOURCES_READ => {
                Err(BridgeError::NotSupported("Resource reads".to_string()))
            }
            other => Err(BridgeError::MethodNotFound(other.to_string())),
        }
    }

    async fn forward_notification(&self, notification: JsonRpcNotification) -> BridgeResult<()> {
        let JsonRpcNotification { method, params, .. } = notification;
        match method.as_str() {
            methods::INITIALIZED => self.deliver_initial_state(),
            methods::SIZE_CHANGED => {
                let size: SizeChangedParams = decode_params(&method, params)?;
                match (size.height, self.host.functions().notify_intrinsic_height) {
                    (Some(height), Some(notify)) => notify(height),
                    (None, _) => tracing::debug!("size-changed without height"),
                    (_, None) => tracing::debug!("Foreign host does not track height"),
                }
                Ok(())
            }
            methods::LOG_MESSAGE => {
                let log: LogMessageParams = decode_params(&method, params)?;
                log_locally(&log);
                Ok(())
            }
            methods::MODEL_CONTEXT_CHANGED => {
                let update: UpdateModelContextParams = decode_params(&method, params)?;
                if let Some(set_state) = self.host.functions().set_widget_state {
                    if let Err(e) = set_state(widget_state_from(update)).await {
                        tracing::warn!("Foreign host rejected widget state: {e}");
                    }
                }
                Ok(())
            }
            other => {
                tracing::debug!("Adapter has no mapping for notification {other}");
                Ok(())
            }
        }
    }
}

/// The widget-state value stored for a model-context update: the
/// structured content when present, otherwise the content blocks.
fn widget_state_from(update: UpdateModelContextParams) -> Value {
    match update {
        UpdateModelContextParams {
            structured_content: Some(structured),
            ..
        } => structured,
        UpdateModelContextParams { content, .. } => {
            json!({ "content": content.unwrap_or_default() })
        }
    }
}

#[async_trait]
impl Transport for AdapterTransport {
    async fn start(&self) -> BridgeResult<()> {
        self.core.mark_started();
        Ok(())
    }

    async fn send(&self, message: JsonRpcMessage) -> BridgeResult<()> {
        self.core.ensure_open()?;
        match message {
            JsonRpcMessage::Request(request) => {
                tracing::debug!("Adapter translating {}", request.method);
                let outcome = self.translate_request(&request.method, request.params).await;
                if let Err(e) = &outcome {
                    tracing::debug!("{} failed on foreign host: {e}", request.method);
                }
                let response = response_for(request.id, outcome);
                if !self.core.deliver(response.to_value()) {
                    return Err(BridgeError::Closed);
                }
                Ok(())
            }
            JsonRpcMessage::Notification(notification) => {
                self.forward_notification(notification).await
            }
            JsonRpcMessage::Response(_) | JsonRpcMessage::Error(_) => {
                tracing::debug!("Foreign host sends no requests, dropping response");
                Ok(())
            }
        }
    }

    async fn close(&self) -> BridgeResult<()> {
        self.core.shutdown();
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

impl std::fmt::Debug for AdapterTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterTransport")
            .field("host_info", &self.host_info)
            .field("closed", &self.core.is_closed())
            .finish()
    }
}
