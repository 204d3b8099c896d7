//! Capability negotiation during `ui/initialize`.
//!
//! Host capabilities come from one of two places. Standard transports
//! declare them statically from the collaborators registered on the Host
//! engine; the host-adapter transport derives them by probing which foreign
//! host functions exist. Both feed a [`CapabilityProbe`], so the resulting
//! [`HostCapabilities`] always has the same shape.

use crate::types::{
    AppCapabilities, BridgeError, BridgeResult, CapabilityMarker, HostCapabilities, HostContext,
    Implementation, ListChangedCapability, UiInitializeParams, UiInitializeResult,
    LATEST_PROTOCOL_VERSION, SUPPORTED_PROTOCOL_VERSIONS,
};

/// Look `version` up among the versions this crate speaks.
pub fn supported_version(version: &str) -> Option<&'static str> {
    SUPPORTED_PROTOCOL_VERSIONS
        .iter()
        .copied()
        .find(|&supported| supported == version)
}

/// Pick the protocol version to answer with.
///
/// A supported requested version is echoed back; anything else gets the
/// latest version this crate speaks.
pub fn negotiate_version(requested: &str) -> &'static str {
    negotiate_version_with(requested, LATEST_PROTOCOL_VERSION)
}

/// Like [`negotiate_version`], but an unsupported request is answered with
/// the host's `preferred` version.
pub fn negotiate_version_with(requested: &str, preferred: &'static str) -> &'static str {
    match supported_version(requested) {
        Some(version) => version,
        None => {
            tracing::warn!(
                "App requested protocol version {}, host supports {:?}. Proceeding with {}.",
                requested,
                SUPPORTED_PROTOCOL_VERSIONS,
                preferred
            );
            preferred
        }
    }
}

/// Which host-side functions are available, one flag per capability.
///
/// Logging is not probed: it is always advertised because it can fall
/// back to the local log sink.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CapabilityProbe {
    /// A tool-invocation function exists.
    pub server_tools: bool,
    /// A resource-read function exists.
    pub server_resources: bool,
    /// An external-link function exists.
    pub open_links: bool,
    /// A message/follow-up function exists.
    pub message: bool,
    /// A model-context / widget-state sink exists.
    pub update_model_context: bool,
}

impl CapabilityProbe {
    /// Build the capability object this probe describes.
    pub fn host_capabilities(&self) -> HostCapabilities {
        HostCapabilities {
            experimental: None,
            open_links: self.open_links.then(CapabilityMarker::default),
            server_tools: self.server_tools.then(ListChangedCapability::default),
            server_resources: self.server_resources.then(ListChangedCapability::default),
            logging: Some(CapabilityMarker::default()),
            message: self.message.then(CapabilityMarker::default),
            update_model_context: self.update_model_context.then(CapabilityMarker::default),
        }
    }
}

/// What the Host learned about the App during the handshake.
#[derive(Debug, Clone, Default)]
pub struct NegotiatedCapabilities {
    /// The App's declared capabilities.
    pub app: AppCapabilities,
    /// The App's implementation info.
    pub app_info: Option<Implementation>,
    /// Protocol version agreed on.
    pub protocol_version: Option<String>,
}

impl NegotiatedCapabilities {
    /// Process a `ui/initialize` request and build the result.
    pub fn negotiate(
        &mut self,
        params: UiInitializeParams,
        host_info: &Implementation,
        host_capabilities: HostCapabilities,
        host_context: HostContext,
        preferred_version: &'static str,
    ) -> BridgeResult<UiInitializeResult> {
        if params.app_info.name.is_empty() {
            return Err(BridgeError::InvalidParams(
                "appInfo.name must not be empty".to_string(),
            ));
        }

        let version = negotiate_version_with(&params.protocol_version, preferred_version);

        tracing::info!(
            "Initializing with app: {} v{}",
            params.app_info.name,
            params.app_info.version
        );

        self.app = params.app_capabilities;
        self.app_info = Some(params.app_info);
        self.protocol_version = Some(version.to_string());

        Ok(UiInitializeResult {
            protocol_version: version.to_string(),
            host_info: host_info.clone(),
            host_capabilities,
            host_context,
        })
    }
}
