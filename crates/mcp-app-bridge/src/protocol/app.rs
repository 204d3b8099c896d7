//! App-side Bridge Engine.
//!
//! Performs the handshake against a Host, correlates its own requests with
//! their responses by integer id, and routes Host notifications and the
//! teardown request to registered handlers. The teardown handler runs in
//! its own task, so it may itself make requests through the bridge.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;

use super::dispatch::{response_for, AppNotification, AppRequest};
use super::state::{ConnectionState, Handshake};
use super::validator::decode_params;
use super::{Callback, HandlerFuture};
use crate::transport::Transport;
use crate::types::{
    methods, AckResult, AppCapabilities, BridgeError, BridgeResult, CallToolResult, ContentBlock,
    DisplayMode, HostCapabilities, HostContext, Implementation, JsonRpcMessage,
    JsonRpcNotification, JsonRpcRequest, LogLevel, LogMessageParams, MessageParams,
    OpenLinkParams, ReadResourceResult, RequestDisplayModeParams, RequestDisplayModeResult,
    RequestId, ResourceReadParams, ResourceTeardownParams, SizeChangedParams, ToolCallParams,
    ToolCancelledParams, ToolInputParams, UiInitializeParams, UiInitializeResult,
    UpdateModelContextParams, WidgetStateParams, LATEST_PROTOCOL_VERSION,
};

/// Runs when the Host asks the App to tear down. The App answers once the
/// future resolves.
pub type TeardownHandler =
    Arc<dyn Fn(ResourceTeardownParams) -> HandlerFuture<()> + Send + Sync>;

/// Handlers for everything a Host can send an App.
#[derive(Clone, Default)]
pub struct AppHandlers {
    pub on_tool_input: Option<Callback<ToolInputParams>>,
    pub on_tool_input_partial: Option<Callback<ToolInputParams>>,
    pub on_tool_result: Option<Callback<CallToolResult>>,
    pub on_tool_cancelled: Option<Callback<ToolCancelledParams>>,
    /// Receives the full context after the update was merged.
    pub on_host_context_changed: Option<Callback<HostContext>>,
    pub on_widget_state: Option<Callback<WidgetStateParams>>,
    pub on_teardown: Option<TeardownHandler>,
}

/// What the App learned about the Host during the handshake.
#[derive(Debug, Clone)]
pub struct HostSession {
    pub protocol_version: String,
    pub host_info: Implementation,
    pub capabilities: HostCapabilities,
    pub context: HostContext,
}

/// Builder for [`AppBridge`].
pub struct AppBridgeBuilder {
    app_info: Implementation,
    capabilities: AppCapabilities,
    protocol_version: String,
    handlers: AppHandlers,
}

impl AppBridgeBuilder {
    fn new(app_info: Implementation) -> Self {
        Self {
            app_info,
            capabilities: AppCapabilities::default(),
            protocol_version: LATEST_PROTOCOL_VERSION.to_string(),
            handlers: AppHandlers::default(),
        }
    }

    pub fn with_capabilities(mut self, capabilities: AppCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Protocol version to request during `ui/initialize`.
    pub fn with_protocol_version(mut self, version: impl Into<String>) -> Self {
        self.protocol_version = version.into();
        self
    }

    pub fn on_tool_input<F>(mut self, callback: F) -> Self
    where
        F: Fn(ToolInputParams) + Send + Sync + 'static,
    {
        self.handlers.on_tool_input = Some(Arc::new(callback));
        self
    }

    pub fn on_tool_input_partial<F>(mut self, callback: F) -> Self
    where
        F: Fn(ToolInputParams) + Send + Sync + 'static,
    {
        self.handlers.on_tool_input_partial = Some(Arc::new(callback));
        self
    }

    pub fn on_tool_result<F>(mut self, callback: F) -> Self
    where
        F: Fn(CallToolResult) + Send + Sync + 'static,
    {
        self.handlers.on_tool_result = Some(Arc::new(callback));
        self
    }

    pub fn on_tool_cancelled<F>(mut self, callback: F) -> Self
    where
        F: Fn(ToolCancelledParams) + Send + Sync + 'static,
    {
        self.handlers.on_tool_cancelled = Some(Arc::new(callback));
        self
    }

    pub fn on_host_context_changed<F>(mut self, callback: F) -> Self
    where
        F: Fn(HostContext) + Send + Sync + 'static,
    {
        self.handlers.on_host_context_changed = Some(Arc::new(callback));
        self
    }

    pub fn on_widget_state<F>(mut self, callback: F) -> Self
    where
        F: Fn(WidgetStateParams) + Send + Sync + 'static,
    {
        self.handlers.on_widget_state = Some(Arc::new(callback));
        self
    }

    pub fn on_teardown<F>(mut self, handler: F) -> Self
    where
        F: Fn(ResourceTeardownParams) -> HandlerFuture<()> + Send + Sync + 'static,
    {
        self.handlers.on_teardown = Some(Arc::new(handler));
        self
    }

    pub fn build(self, transport: Arc<dyn Transport>) -> Arc<AppBridge> {
        Arc::new(AppBridge {
            transport,
            app_info: self.app_info,
            capabilities: self.capabilities,
            protocol_version: self.protocol_version,
            handlers: self.handlers,
            next_id: AtomicI64::new(1),
            pending: Mutex::new(HashMap::new()),
            session: Mutex::new(None),
            handshake: Mutex::new(Handshake::new()),
            reader: Mutex::new(None),
        })
    }
}

type PendingRequests = HashMap<RequestId, oneshot::Sender<BridgeResult<Value>>>;

/// The App's protocol engine for one Host connection.
pub struct AppBridge {
    transport: Arc<dyn Transport>,
    app_info: Implementation,
    capabilities: AppCapabilities,
    protocol_version: String,
    handlers: AppHandlers,
    next_id: AtomicI64,
    pending: Mutex<PendingRequests>,
    session: Mutex<Option<HostSession>>,
    handshake: Mutex<Handshake>,
    reader: Mutex<Option<JoinHandle<()>>>,
}

impl AppBridge {
    pub fn builder(app_info: Implementation) -> AppBridgeBuilder {
        AppBridgeBuilder::new(app_info)
    }

    /// Start the transport, run the inbound loop and perform the handshake:
    /// `ui/initialize`, then `ui/notifications/initialized`.
    pub async fn connect(self: &Arc<Self>) -> BridgeResult<UiInitializeResult> {
        self.transport.start().await?;
        let mut incoming = self.transport.take_incoming().ok_or_else(|| {
            BridgeError::Transport("incoming stream already taken".to_string())
        })?;

        let bridge = Arc::clone(self);
        let task = tokio::spawn(async move {
            while let Some(frame) = incoming.recv().await {
                bridge.route_frame(frame).await;
            }
            bridge.shutdown_pending().await;
        });
        *self.reader.lock().await = Some(task);

        self.handshake.lock().await.on_initialize();
        let params = UiInitializeParams {
            protocol_version: self.protocol_version.clone(),
            app_info: self.app_info.clone(),
            app_capabilities: self.capabilities.clone(),
        };
        let result: UiInitializeResult = self.request(methods::INITIALIZE, params).await?;
        tracing::info!(
            "Connected to host: {} v{} (protocol {})",
            result.host_info.name,
            result.host_info.version,
            result.protocol_version
        );

        *self.session.lock().await = Some(HostSession {
            protocol_version: result.protocol_version.clone(),
            host_info: result.host_info.clone(),
            capabilities: result.host_capabilities.clone(),
            context: result.host_context.clone(),
        });

        self.notify(methods::INITIALIZED, json!({})).await?;
        self.handshake.lock().await.on_initialized();
        Ok(result)
    }

    async fn shutdown_pending(&self) {
        self.handshake.lock().await.close();
        let pending: Vec<_> = self.pending.lock().await.drain().collect();
        if !pending.is_empty() {
            tracing::debug!("Failing {} pending requests, transport closed", pending.len());
        }
        for (_, tx) in pending {
            let _ = tx.send(Err(BridgeError::Closed));
        }
    }

    /// Send a request and wait for the matching response.
    pub async fn request<P, R>(&self, method: &str, params: P) -> BridgeResult<R>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let id = RequestId::Number(self.next_id.fetch_add(1, Ordering::SeqCst));
        let params = serde_json::to_value(params)?;
        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id.clone(), tx);

        tracing::debug!("Sending {method} (id {id})");
        let request = JsonRpcRequest::new(id.clone(), method, Some(params));
        if let Err(e) = self.transport.send(request.into()).await {
            self.pending.lock().await.remove(&id);
            return Err(e);
        }

        let value = rx.await.map_err(|_| BridgeError::Closed)??;
        Ok(serde_json::from_value(value)?)
    }

    async fn notify<P: Serialize>(&self, method: &str, params: P) -> BridgeResult<()> {
        let params = serde_json::to_value(params)?;
        self.transport
            .send(JsonRpcNotification::new(method, Some(params)).into())
            .await
    }

    /// Fail with `NotSupported` unless the Host advertised the capability.
    async fn require(
        &self,
        what: &str,
        supported: impl FnOnce(&HostCapabilities) -> bool,
    ) -> BridgeResult<()> {
        let session = self.session.lock().await;
        let Some(session) = session.as_ref() else {
            return Err(BridgeError::NotConnected(
                "handshake has not completed".to_string(),
            ));
        };
        if !supported(&session.capabilities) {
            return Err(BridgeError::NotSupported(what.to_string()));
        }
        Ok(())
    }

    /// `tools/call` through the Host.
    pub async fn call_server_tool(
        &self,
        name: impl Into<String>,
        arguments: Option<Value>,
    ) -> BridgeResult<CallToolResult> {
        self.require("Tool calls", |caps| caps.server_tools.is_some())
            .await?;
        let params = ToolCallParams {
            name: name.into(),
            arguments,
        };
        self.request(methods::TOOLS_CALL, params).await
    }

    /// `resources/read` through the Host.
    pub async fn read_server_resource(
        &self,
        uri: impl Into<String>,
    ) -> BridgeResult<ReadResourceResult> {
        self.require("Resource reads", |caps| caps.server_resources.is_some())
            .await?;
        self.request(methods::RESOURCES_READ, ResourceReadParams { uri: uri.into() })
            .await
    }

    /// `ui/message` with role `user`.
    pub async fn send_message(&self, content: Vec<ContentBlock>) -> BridgeResult<AckResult> {
        self.require("Messages", |caps| caps.message.is_some())
            .await?;
        let params = MessageParams {
            role: "user".to_string(),
            content,
        };
        self.request(methods::MESSAGE, params).await
    }

    pub async fn open_link(&self, url: impl Into<String>) -> BridgeResult<AckResult> {
        self.require("Opening links", |caps| caps.open_links.is_some())
            .await?;
        self.request(methods::OPEN_LINK, OpenLinkParams { url: url.into() })
            .await
    }

    /// Ask for a display mode. Returns the mode the Host actually applied.
    pub async fn request_display_mode(&self, mode: DisplayMode) -> BridgeResult<DisplayMode> {
        let result: RequestDisplayModeResult = self
            .request(
                methods::REQUEST_DISPLAY_MODE,
                RequestDisplayModeParams { mode },
            )
            .await?;
        if let Some(session) = self.session.lock().await.as_mut() {
            session.context.display_mode = Some(result.mode);
        }
        Ok(result.mode)
    }

    pub async fn update_model_context(&self, params: UpdateModelContextParams) -> BridgeResult<()> {
        self.require("Model context updates", |caps| {
            caps.update_model_context.is_some()
        })
        .await?;
        let _: Value = self.request(methods::UPDATE_MODEL_CONTEXT, params).await?;
        Ok(())
    }

    pub async fn ping(&self) -> BridgeResult<()> {
        let _: Value = self.request(methods::PING, json!({})).await?;
        Ok(())
    }

    pub async fn send_size_changed(&self, width: Option<f64>, height: Option<f64>) -> BridgeResult<()> {
        self.notify(methods::SIZE_CHANGED, SizeChangedParams { width, height })
            .await
    }

    pub async fn send_log(
        &self,
        level: LogLevel,
        logger: Option<String>,
        data: Value,
    ) -> BridgeResult<()> {
        self.notify(
            methods::LOG_MESSAGE,
            LogMessageParams {
                level,
                logger,
                data,
            },
        )
        .await
    }

    /// Fire-and-forget model context update.
    pub async fn notify_model_context(&self, params: UpdateModelContextParams) -> BridgeResult<()> {
        self.notify(methods::MODEL_CONTEXT_CHANGED, params).await
    }

    /// Reader-loop entry point. Responses and notifications are handled
    /// inline so correlation never waits on an App handler.
    async fn route_frame(self: &Arc<Self>, frame: Value) {
        let message = match JsonRpcMessage::from_value(frame) {
            Ok(message) => message,
            Err(failure) => {
                tracing::warn!("Ignoring invalid frame: {failure}");
                return;
            }
        };
        match message {
            JsonRpcMessage::Request(request)
                if AppRequest::from_method(&request.method)
                    .is_some_and(AppRequest::awaits_collaborator) =>
            {
                if self.handshake.lock().await.is_closed() {
                    return;
                }
                let bridge = Arc::clone(self);
                tokio::spawn(async move {
                    bridge.handle_request(request).await;
                });
            }
            message => {
                self.handle_message(message).await;
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
            return false;
        }

        match message {
            JsonRpcMessage::Response(response) => {
                match self.pending.lock().await.remove(&response.id) {
                    Some(tx) => {
                        let _ = tx.send(Ok(response.result));
                        true
                    }
                    None => {
                        tracing::debug!("Ignoring response with unknown id {}", response.id);
                        false
                    }
                }
            }
            JsonRpcMessage::Error(error) => {
                let waiter = match &error.id {
                    Some(id) => self.pending.lock().await.remove(id),
                    None => None,
                };
                match waiter {
                    Some(tx) => {
                        let _ = tx.send(Err(BridgeError::Rpc(error.error)));
                        true
                    }
                    None => {
                        tracing::debug!("Ignoring uncorrelated error: {}", error.error);
                        false
                    }
                }
            }
            JsonRpcMessage::Request(request) => self.handle_request(request).await,
            JsonRpcMessage::Notification(notification) => {
                self.handle_notification(notification).await
            }
        }
    }

    async fn handle_request(&self, request: JsonRpcRequest) -> bool {
        let JsonRpcRequest {
            id, method, params, ..
        } = request;

        let (handled, outcome) = match AppRequest::from_method(&method) {
            None => (false, Err(BridgeError::MethodNotFound(method.clone()))),
            Some(AppRequest::Ping) => (true, Ok(json!({}))),
            Some(AppRequest::ResourceTeardown) => {
                let outcome = match decode_params::<ResourceTeardownParams>(&method, params) {
                    Ok(params) => self.run_teardown(params).await,
                    Err(e) => Err(e),
                };
                (true, outcome)
            }
        };

        if let Err(e) = self.transport.send(response_for(id, outcome)).await {
            tracing::warn!("Failed to answer {method}: {e}");
        }
        handled
    }

    async fn run_teardown(&self, params: ResourceTeardownParams) -> BridgeResult<Value> {
        tracing::info!("Host requested teardown");
        if let Some(handler) = &self.handlers.on_teardown {
            handler(params).await.map_err(BridgeError::from_handler)?;
        }
        Ok(json!({}))
    }

    async fn handle_notification(&self, notification: JsonRpcNotification) -> bool {
        let JsonRpcNotification { method, params, .. } = notification;

        let Some(kind) = AppNotification::from_method(&method) else {
            tracing::debug!("Ignoring unknown notification {method}");
            return false;
        };

        let outcome = match kind {
            AppNotification::ToolInput => decode_params(&method, params)
                .map(|p| fire(&self.handlers.on_tool_input, p)),
            AppNotification::ToolInputPartial => decode_params(&method, params)
                .map(|p| fire(&self.handlers.on_tool_input_partial, p)),
            AppNotification::ToolResult => decode_params(&method, params)
                .map(|p| fire(&self.handlers.on_tool_result, p)),
            AppNotification::ToolCancelled => decode_params(&method, params)
                .map(|p| fire(&self.handlers.on_tool_cancelled, p)),
            AppNotification::WidgetState => decode_params(&method, params)
                .map(|p| fire(&self.handlers.on_widget_state, p)),
            AppNotification::HostContextChanged => {
                match decode_params::<HostContext>(&method, params) {
                    Ok(update) => {
                        let merged = {
                            let mut session = self.session.lock().await;
                            match session.as_mut() {
                                Some(session) => {
                                    session.context.merge(update);
                                    session.context.clone()
                                }
                                None => update,
                            }
                        };
                        fire(&self.handlers.on_host_context_changed, merged);
                        Ok(())
                    }
                    Err(e) => Err(e),
                }
            }
        };

        match outcome {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("{e}");
                false
            }
        }
    }

    /// Close the transport. Pending requests fail with `Closed`.
    pub async fn close(&self) -> BridgeResult<()> {
        let result = self.transport.close().await;
        self.shutdown_pending().await;
        result
    }

    pub async fn state(&self) -> ConnectionState {
        self.handshake.lock().await.state()
    }

    pub fn app_info(&self) -> &Implementation {
        &self.app_info
    }

    /// Host details from the handshake, once connected.
    pub async fn host_session(&self) -> Option<HostSession> {
        self.session.lock().await.clone()
    }

    pub async fn host_capabilities(&self) -> Option<HostCapabilities> {
        self.session
            .lock()
            .await
            .as_ref()
            .map(|s| s.capabilities.clone())
    }

    pub async fn host_context(&self) -> Option<HostContext> {
        self.session.lock().await.as_ref().map(|s| s.context.clone())
    }
}

fn fire<T>(callback: &Option<Callback<T>>, value: T) {
    if let Some(callback) = callback {
        callback(value);
    }
}
