//! Host-side Bridge Engine.
//!
//! Answers the App's requests through registered collaborators, drives the
//! handshake, pushes tool/context notifications to the App and runs the
//! teardown cycle. Inbound frames are routed one at a time, in the order
//! the transport delivers them. Requests answered by a collaborator run in
//! their own task, so a slow tool call never holds back the frames queued
//! behind it (a teardown acknowledgment in particular).

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use super::dispatch::{response_for, to_result, HostNotification, HostRequest};
use super::negotiation::{supported_version, CapabilityProbe, NegotiatedCapabilities};
use super::state::{ConnectionState, Handshake};
use super::teardown::{
    TeardownCallback, TeardownController, TeardownOutcome, TeardownState,
    DEFAULT_TEARDOWN_TIMEOUT,
};
use super::validator::decode_params;
use super::{Callback, HandlerFuture, ReadyCallback};
use crate::config::BridgeConfig;
use crate::transport::Transport;
use crate::types::{
    methods, normalize_tool_output, AckResult, AppCapabilities, BridgeError, BridgeResult,
    CallToolResult, DisplayMode, HostCapabilities, HostContext, Implementation, JsonRpcMessage,
    JsonRpcNotification, JsonRpcRequest, LogLevel, LogMessageParams, MessageParams,
    OpenLinkParams, ReadResourceResult, RequestDisplayModeParams, RequestDisplayModeResult,
    RequestId, ResourceReadParams, ResourceTeardownParams, SizeChangedParams, ToolCallParams,
    ToolCancelledParams, ToolInputParams, UiInitializeParams, UpdateModelContextParams,
    WidgetStateParams, HOST_NAME, HOST_VERSION, LATEST_PROTOCOL_VERSION,
};

/// Executes `tools/call` against the MCP server.
pub type ToolCallHandler = Arc<dyn Fn(ToolCallParams) -> HandlerFuture<CallToolResult> + Send + Sync>;
/// Serves `resources/read` from the MCP server.
pub type ResourceReadHandler =
    Arc<dyn Fn(ResourceReadParams) -> HandlerFuture<ReadResourceResult> + Send + Sync>;
/// Displays a `ui/message`.
pub type MessageHandler = Arc<dyn Fn(MessageParams) -> HandlerFuture<AckResult> + Send + Sync>;
/// Opens a `ui/open-link` URL.
pub type OpenLinkHandler = Arc<dyn Fn(OpenLinkParams) -> HandlerFuture<AckResult> + Send + Sync>;
/// Applies a display-mode request; returns the mode actually in effect.
pub type DisplayModeHandler =
    Arc<dyn Fn(RequestDisplayModeParams) -> HandlerFuture<DisplayMode> + Send + Sync>;
/// Persists `ui/update-model-context` state.
pub type ModelContextHandler =
    Arc<dyn Fn(UpdateModelContextParams) -> HandlerFuture<()> + Send + Sync>;

/// Collaborators and callbacks of a Host engine. Read-only once built.
#[derive(Clone, Default)]
pub struct HostHandlers {
    pub tool_call: Option<ToolCallHandler>,
    pub resource_read: Option<ResourceReadHandler>,
    pub message: Option<MessageHandler>,
    pub open_link: Option<OpenLinkHandler>,
    pub display_mode: Option<DisplayModeHandler>,
    pub model_context: Option<ModelContextHandler>,
    pub on_ready: Option<ReadyCallback>,
    pub on_size_changed: Option<Callback<SizeChangedParams>>,
    pub on_log: Option<Callback<LogMessageParams>>,
    pub on_model_context_changed: Option<Callback<UpdateModelContextParams>>,
    pub on_teardown_complete: Option<TeardownCallback>,
}

impl HostHandlers {
    /// Static capability declaration: one flag per registered collaborator.
    pub fn probe(&self) -> CapabilityProbe {
        CapabilityProbe {
            server_tools: self.tool_call.is_some(),
            server_resources: self.resource_read.is_some(),
            open_links: self.open_link.is_some(),
            message: self.message.is_some(),
            update_model_context: self.model_context.is_some(),
        }
    }
}

/// Builder for [`HostBridge`].
pub struct HostBridgeBuilder {
    host_info: Implementation,
    capabilities: Option<HostCapabilities>,
    host_context: HostContext,
    preferred_version: &'static str,
    teardown_timeout: Duration,
    handlers: HostHandlers,
}

impl HostBridgeBuilder {
    fn new(host_info: Implementation) -> Self {
        Self {
            host_info,
            capabilities: None,
            host_context: HostContext::default(),
            preferred_version: LATEST_PROTOCOL_VERSION,
            teardown_timeout: DEFAULT_TEARDOWN_TIMEOUT,
            handlers: HostHandlers::default(),
        }
    }

    /// Apply host info, protocol version, teardown timeout and initial
    /// context from config.
    pub fn with_config(mut self, config: &BridgeConfig) -> Self {
        self.host_info = config.host_info();
        self.preferred_version = config.preferred_protocol_version();
        self.teardown_timeout = config.teardown_timeout();
        if let Some(context) = &config.host_context {
            self.host_context = context.clone();
        }
        self
    }

    /// Declare capabilities explicitly instead of deriving them from the
    /// registered collaborators.
    pub fn with_capabilities(mut self, capabilities: HostCapabilities) -> Self {
        self.capabilities = Some(capabilities);
        self
    }

    pub fn with_host_context(mut self, context: HostContext) -> Self {
        self.host_context = context;
        self
    }

    /// Version to answer with when the App requests an unsupported one.
    /// Unknown versions are ignored.
    pub fn with_protocol_version(mut self, version: &str) -> Self {
        match supported_version(version) {
            Some(version) => self.preferred_version = version,
            None => tracing::warn!("Ignoring unsupported protocol version {version}"),
        }
        self
    }

    pub fn with_teardown_timeout(mut self, timeout: Duration) -> Self {
        self.teardown_timeout = timeout;
        self
    }

    pub fn on_tool_call<F>(mut self, handler: F) -> Self
    where
        F: Fn(ToolCallParams) -> HandlerFuture<CallToolResult> + Send + Sync + 'static,
    {
        self.handlers.tool_call = Some(Arc::new(handler));
        self
    }

    pub fn on_resource_read<F>(mut self, handler: F) -> Self
    where
        F: Fn(ResourceReadParams) -> HandlerFuture<ReadResourceResult> + Send + Sync + 'static,
    {
        self.handlers.resource_read = Some(Arc::new(handler));
        self
    }

    pub fn on_message<F>(mut self, handler: F) -> Self
    where
        F: Fn(MessageParams) -> HandlerFuture<AckResult> + Send + Sync + 'static,
    {
        self.handlers.message = Some(Arc::new(handler));
        self
    }

    pub fn on_open_link<F>(mut self, handler: F) -> Self
    where
        F: Fn(OpenLinkParams) -> HandlerFuture<AckResult> + Send + Sync + 'static,
    {
        self.handlers.open_link = Some(Arc::new(handler));
        self
    }

    pub fn on_request_display_mode<F>(mut self, handler: F) -> Self
    where
        F: Fn(RequestDisplayModeParams) -> HandlerFuture<DisplayMode> + Send + Sync + 'static,
    {
        self.handlers.display_mode = Some(Arc::new(handler));
        self
    }

    pub fn on_update_model_context<F>(mut self, handler: F) -> Self
    where
        F: Fn(UpdateModelContextParams) -> HandlerFuture<()> + Send + Sync + 'static,
    {
        self.handlers.model_context = Some(Arc::new(handler));
        self
    }

    pub fn on_ready<F>(mut self, callback: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.handlers.on_ready = Some(Arc::new(callback));
        self
    }

    pub fn on_size_changed<F>(mut self, callback: F) -> Self
    where
        F: Fn(SizeChangedParams) + Send + Sync + 'static,
    {
        self.handlers.on_size_changed = Some(Arc::new(callback));
        self
    }

    pub fn on_log<F>(mut self, callback: F) -> Self
    where
        F: Fn(LogMessageParams) + Send + Sync + 'static,
    {
        self.handlers.on_log = Some(Arc::new(callback));
        self
    }

    pub fn on_model_context_changed<F>(mut self, callback: F) -> Self
    where
        F: Fn(UpdateModelContextParams) + Send + Sync + 'static,
    {
        self.handlers.on_model_context_changed = Some(Arc::new(callback));
        self
    }

    pub fn on_teardown_complete<F>(mut self, callback: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.handlers.on_teardown_complete = Some(Arc::new(callback));
        self
    }

    /// Capabilities the built engine will advertise.
    pub fn capabilities(&self) -> HostCapabilities {
        self.capabilities
            .clone()
            .unwrap_or_else(|| self.handlers.probe().host_capabilities())
    }

    /// Finish building. Capabilities are fixed from here on.
    pub fn build(self, transport: Arc<dyn Transport>) -> Arc<HostBridge> {
        let capabilities = self.capabilities();
        let teardown = Arc::new(TeardownController::new(
            self.teardown_timeout,
            self.handlers.on_teardown_complete.clone(),
        ));
        Arc::new(HostBridge {
            transport,
            host_info: self.host_info,
            preferred_version: self.preferred_version,
            capabilities,
            handlers: self.handlers,
            handshake: Mutex::new(Handshake::new()),
            negotiated: Mutex::new(NegotiatedCapabilities::default()),
            context: Mutex::new(self.host_context),
            teardown,
            reader: Mutex::new(None),
        })
    }
}

/// A request whose method resolved, waiting to be answered.
struct AcceptedRequest {
    id: RequestId,
    kind: HostRequest,
    method: String,
    params: Option<Value>,
}

/// The Host's protocol engine for one App connection.
pub struct HostBridge {
    transport: Arc<dyn Transport>,
    host_info: Implementation,
    preferred_version: &'static str,
    capabilities: HostCapabilities,
    handlers: HostHandlers,
    handshake: Mutex<Handshake>,
    negotiated: Mutex<NegotiatedCapabilities>,
    context: Mutex<HostContext>,
    teardown: Arc<TeardownController>,
    reader: Mutex<Option<JoinHandle<()>>>,
}

impl HostBridge {
    pub fn builder(host_info: Implementation) -> HostBridgeBuilder {
        HostBridgeBuilder::new(host_info)
    }

    /// Builder with the crate's default host info.
    pub fn default_builder() -> HostBridgeBuilder {
        HostBridgeBuilder::new(Implementation::new(HOST_NAME, HOST_VERSION))
    }

    /// Start the transport and process inbound frames in a background task
    /// until the transport closes.
    pub async fn connect(self: &Arc<Self>) -> BridgeResult<()> {
        self.transport.start().await?;
        let mut incoming = self.transport.take_incoming().ok_or_else(|| {
            BridgeError::Transport("incoming stream already taken".to_string())
        })?;

        let bridge = Arc::clone(self);
        let task = tokio::spawn(async move {
            while let Some(frame) = incoming.recv().await {
                bridge.route_frame(frame).await;
            }
            bridge.handshake.lock().await.close();
        });
        *self.reader.lock().await = Some(task);
        Ok(())
    }

    /// Reader-loop entry point. Responses and notifications are handled
    /// inline; requests that await a collaborator are answered from their
    /// own task.
    async fn route_frame(self: &Arc<Self>, frame: Value) {
        let message = match JsonRpcMessage::from_value(frame) {
            Ok(message) => message,
            Err(failure) => {
                tracing::warn!("Ignoring invalid frame: {failure}");
                return;
            }
        };
        let request = match message {
            JsonRpcMessage::Request(request) => request,
            other => {
                self.handle_message(other).await;
                return;
            }
        };
        if self.handshake.lock().await.is_closed() {
            tracing::debug!("Bridge closed, ignoring inbound request");
            return;
        }

        let Some(accepted) = self.accept_request(request).await else {
            return;
        };
        if accepted.kind.awaits_collaborator() {
            let bridge = Arc::clone(self);
            tokio::spawn(async move { bridge.answer(accepted).await });
        } else {
            self.answer(accepted).await;
        }
    }

    /// Handle one raw text frame. Malformed input is logged and reported
    /// as not handled; nothing is sent back.
    pub async fn handle_raw(&self, raw: &str) -> bool {
        match crate::types::parse(raw) {
            Ok(message) => self.handle_message(message).await,
            Err(failure) => {
                tracing::warn!("Ignoring unparseable frame: {failure}");
                false
            }
        }
    }

    /// Handle one decoded JSON frame.
    pub async fn handle_value(&self, frame: Value) -> bool {
        match JsonRpcMessage::from_value(frame) {
            Ok(message) => self.handle_message(message).await,
            Err(failure) => {
                tracing::warn!("Ignoring invalid frame: {failure}");
                false
            }
        }
    }

    /// Dispatch one message. Returns whether it was handled.
    pub async fn handle_message(&self, message: JsonRpcMessage) -> bool {
        if self.handshake.lock().await.is_closed() {
            tracing::debug!("Bridge closed, ignoring inbound message");
            return false;
        }

        match message {
            JsonRpcMessage::Request(request) => self.handle_request(request).await,
            JsonRpcMessage::Notification(notification) => {
                self.handle_notification(notification).await
            }
            JsonRpcMessage::Response(response) => {
                let matched = self.teardown.acknowledge(&response.id);
                if !matched {
                    tracing::debug!("Ignoring response with unknown id {}", response.id);
                }
                matched
            }
            JsonRpcMessage::Error(error) => match &error.id {
                Some(id) if self.teardown.acknowledge(id) => {
                    tracing::warn!("App answered teardown with an error: {}", error.error);
                    true
                }
                _ => {
                    tracing::debug!("Ignoring error response: {}", error.error);
                    false
                }
            },
        }
    }

    async fn handle_request(&self, request: JsonRpcRequest) -> bool {
        match self.accept_request(request).await {
            Some(accepted) => {
                self.answer(accepted).await;
                true
            }
            None => false,
        }
    }

    /// Resolve the method name. Unknown methods are answered with -32601
    /// here and yield `None`.
    async fn accept_request(&self, request: JsonRpcRequest) -> Option<AcceptedRequest> {
        let JsonRpcRequest {
            id, method, params, ..
        } = request;

        let Some(kind) = HostRequest::from_method(&method) else {
            tracing::debug!("Unknown method {method}");
            let reply = response_for(id, Err(BridgeError::MethodNotFound(method)));
            self.send_or_log(reply).await;
            return None;
        };

        if !kind.allowed_before_ready() && !self.handshake.lock().await.is_ready() {
            tracing::warn!("{method} received before the handshake completed");
        }
        Some(AcceptedRequest {
            id,
            kind,
            method,
            params,
        })
    }

    async fn answer(&self, request: AcceptedRequest) {
        let AcceptedRequest {
            id,
            kind,
            method,
            params,
        } = request;

        tracing::debug!("Dispatching {method} (id {id})");
        let outcome = self.dispatch_request(kind, &method, params).await;
        if let Err(e) = &outcome {
            tracing::debug!("{method} failed: {e}");
        }
        self.send_or_log(response_for(id, outcome)).await;
    }

    async fn dispatch_request(
        &self,
        kind: HostRequest,
        method: &str,
        params: Option<Value>,
    ) -> BridgeResult<Value> {
        match kind {
            HostRequest::Initialize => {
                let params: UiInitializeParams = decode_params(method, params)?;
                let context = self.context.lock().await.clone();
                let result = self.negotiated.lock().await.negotiate(
                    params,
                    &self.host_info,
                    self.capabilities.clone(),
                    context,
                    self.preferred_version,
                )?;
                self.handshake.lock().await.on_initialize();
                to_result(Ok(result))
            }
            HostRequest::Ping => Ok(json!({})),
            HostRequest::ToolsCall => {
                let params: ToolCallParams = decode_params(method, params)?;
                let handler = self.handlers.tool_call.as_ref().ok_or_else(|| {
                    BridgeError::NotSupported("Tool calls".to_string())
                })?;
                to_result(handler(params).await.map_err(BridgeError::from_handler))
            }
            HostRequest::ResourcesRead => {
                let params: ResourceReadParams = decode_params(method, params)?;
                let handler = self.handlers.resource_read.as_ref().ok_or_else(|| {
                    BridgeError::NotSupported("Resource reads".to_string())
                })?;
                to_result(handler(params).await.map_err(BridgeError::from_handler))
            }
            HostRequest::Message => {
                let params: MessageParams = decode_params(method, params)?;
                let handler = self.handlers.message.as_ref().ok_or_else(|| {
                    BridgeError::NotSupported("Messages".to_string())
                })?;
                to_result(handler(params).await.map_err(BridgeError::from_handler))
            }
            HostRequest::OpenLink => {
                let params: OpenLinkParams = decode_params(method, params)?;
                let handler = self.handlers.open_link.as_ref().ok_or_else(|| {
                    BridgeError::NotSupported("Opening links".to_string())
                })?;
                to_result(handler(params).await.map_err(BridgeError::from_handler))
            }
            HostRequest::RequestDisplayMode => {
                let params: RequestDisplayModeParams = decode_params(method, params)?;
                let handler = self.handlers.display_mode.as_ref().ok_or_else(|| {
                    BridgeError::NotSupported("Display mode changes".to_string())
                })?;
                let mode = handler(params).await.map_err(BridgeError::from_handler)?;
                self.context.lock().await.display_mode = Some(mode);
                to_result(Ok(RequestDisplayModeResult { mode }))
            }
            HostRequest::UpdateModelContext => {
                let params: UpdateModelContextParams = decode_params(method, params)?;
                let handler = self.handlers.model_context.as_ref().ok_or_else(|| {
                    BridgeError::NotSupported("Model context updates".to_string())
                })?;
                handler(params).await.map_err(BridgeError::from_handler)?;
                Ok(json!({}))
            }
        }
    }

    async fn handle_notification(&self, notification: JsonRpcNotification) -> bool {
        let JsonRpcNotification { method, params, .. } = notification;

        let Some(kind) = HostNotification::from_method(&method) else {
            tracing::debug!("Ignoring unknown notification {method}");
            return false;
        };

        match kind {
            HostNotification::Initialized => {
                let became_ready = self.handshake.lock().await.on_initialized();
                if became_ready {
                    if let Some(on_ready) = &self.handlers.on_ready {
                        on_ready();
                    }
                }
                true
            }
            HostNotification::SizeChanged => {
                match decode_params::<SizeChangedParams>(&method, params) {
                    Ok(size) => {
                        if let Some(callback) = &self.handlers.on_size_changed {
                            callback(size);
                        }
                        true
                    }
                    Err(e) => {
                        tracing::warn!("{e}");
                        false
                    }
                }
            }
            HostNotification::LogMessage => match decode_params::<LogMessageParams>(&method, params) {
                Ok(log) => {
                    match &self.handlers.on_log {
                        Some(callback) => callback(log),
                        None => log_locally(&log),
                    }
                    true
                }
                Err(e) => {
                    tracing::warn!("{e}");
                    false
                }
            },
            HostNotification::ModelContextChanged => {
                match decode_params::<UpdateModelContextParams>(&method, params) {
                    Ok(update) => {
                        if let Some(callback) = &self.handlers.on_model_context_changed {
                            callback(update);
                        }
                        true
                    }
                    Err(e) => {
                        tracing::warn!("{e}");
                        false
                    }
                }
            }
        }
    }

    async fn send_or_log(&self, message: JsonRpcMessage) {
        if let Err(e) = self.transport.send(message).await {
            tracing::warn!("Failed to send response: {e}");
        }
    }

    async fn notify<P: Serialize>(&self, method: &str, params: P) -> BridgeResult<()> {
        let params = serde_json::to_value(params)?;
        self.transport
            .send(JsonRpcNotification::new(method, Some(params)).into())
            .await
    }

    /// Send the complete tool arguments.
    pub async fn send_tool_input(&self, arguments: Value) -> BridgeResult<()> {
        self.notify(methods::TOOL_INPUT, ToolInputParams { arguments })
            .await
    }

    /// Send partial (still streaming) tool arguments.
    pub async fn send_tool_input_partial(&self, arguments: Value) -> BridgeResult<()> {
        self.notify(methods::TOOL_INPUT_PARTIAL, ToolInputParams { arguments })
            .await
    }

    /// Normalize arbitrary tool output and send it as a tool result.
    ///
    /// Returns `Ok(false)` without sending anything when the output is
    /// absent or `null`.
    pub async fn send_tool_result(&self, output: Option<Value>) -> BridgeResult<bool> {
        match normalize_tool_output(output) {
            Some(result) => {
                self.send_call_tool_result(result).await?;
                Ok(true)
            }
            None => {
                tracing::debug!("No tool output yet, tool-result not sent");
                Ok(false)
            }
        }
    }

    /// Send an already-shaped tool result.
    pub async fn send_call_tool_result(&self, result: CallToolResult) -> BridgeResult<()> {
        self.notify(methods::TOOL_RESULT, result).await
    }

    pub async fn send_tool_cancelled(&self, reason: Option<String>) -> BridgeResult<()> {
        self.notify(methods::TOOL_CANCELLED, ToolCancelledParams { reason })
            .await
    }

    pub async fn send_widget_state(&self, state: Value) -> BridgeResult<()> {
        self.notify(methods::WIDGET_STATE, WidgetStateParams { state })
            .await
    }

    /// Merge `update` into the host context. Once the App is ready the
    /// partial update is also sent as `ui/host-context-changed`.
    pub async fn set_host_context(&self, update: HostContext) -> BridgeResult<()> {
        self.context.lock().await.merge(update.clone());
        if self.handshake.lock().await.is_ready() && !update.is_empty() {
            self.notify(methods::HOST_CONTEXT_CHANGED, update).await?;
        }
        Ok(())
    }

    /// Send `ui/resource-teardown` with a fresh id and arm the timeout.
    ///
    /// The cycle completes when the App answers with this id or when the
    /// timeout elapses, whichever comes first. Before the App is ready the
    /// cycle completes at once, nothing is sent and `Ok(None)` is returned.
    pub async fn send_resource_teardown(&self) -> BridgeResult<Option<RequestId>> {
        if !self.handshake.lock().await.is_ready() {
            self.teardown.complete_immediately();
            return Ok(None);
        }
        self.start_teardown().await.map(|(id, _)| Some(id))
    }

    async fn start_teardown(&self) -> BridgeResult<(RequestId, JoinHandle<TeardownOutcome>)> {
        let (id, ack) = self.teardown.begin();
        let request = JsonRpcRequest::new(
            id.clone(),
            methods::RESOURCE_TEARDOWN,
            Some(serde_json::to_value(ResourceTeardownParams::default())?),
        );
        if let Err(e) = self.transport.send(request.into()).await {
            self.teardown.force_complete(&id);
            return Err(e);
        }

        let controller = Arc::clone(&self.teardown);
        let waiter_id = id.clone();
        let waiter = tokio::spawn(async move { controller.wait(waiter_id, ack).await });
        Ok((id, waiter))
    }

    /// Run a full teardown cycle and report how it ended. Never fails and
    /// never waits longer than the configured timeout.
    pub async fn teardown(&self) -> TeardownOutcome {
        if !self.handshake.lock().await.is_ready() {
            self.teardown.complete_immediately();
            return TeardownOutcome::Skipped;
        }
        match self.start_teardown().await {
            Ok((_, waiter)) => waiter.await.unwrap_or(TeardownOutcome::TimedOut),
            Err(e) => {
                tracing::warn!("Could not send teardown request: {e}");
                TeardownOutcome::Skipped
            }
        }
    }

    /// Whether the latest teardown cycle has completed.
    pub fn teardown_completed(&self) -> bool {
        self.teardown.is_completed()
    }

    pub fn teardown_state(&self) -> TeardownState {
        self.teardown.state()
    }

    /// Close the transport. The engine accepts nothing afterwards.
    pub async fn close(&self) -> BridgeResult<()> {
        self.handshake.lock().await.close();
        self.transport.close().await
    }

    pub async fn state(&self) -> ConnectionState {
        self.handshake.lock().await.state()
    }

    pub fn host_info(&self) -> &Implementation {
        &self.host_info
    }

    pub fn host_capabilities(&self) -> &HostCapabilities {
        &self.capabilities
    }

    pub async fn host_context(&self) -> HostContext {
        self.context.lock().await.clone()
    }

    pub async fn app_info(&self) -> Option<Implementation> {
        self.negotiated.lock().await.app_info.clone()
    }

    pub async fn app_capabilities(&self) -> AppCapabilities {
        self.negotiated.lock().await.app.clone()
    }
}

/// Local log sink for `notifications/message` when no callback is set.
pub(crate) fn log_locally(log: &LogMessageParams) {
    let logger = log.logger.as_deref().unwrap_or("app");
    match log.level {
        LogLevel::Debug => tracing::debug!(logger, data = %log.data, "app log"),
        LogLevel::Info | LogLevel::Notice => tracing::info!(logger, data = %log.data, "app log"),
        LogLevel::Warning => tracing::warn!(logger, data = %log.data, "app log"),
        LogLevel::Error | LogLevel::Critical | LogLevel::Alert | LogLevel::Emergency => {
            tracing::error!(logger, data = %log.data, "app log")
        }
    }
}
