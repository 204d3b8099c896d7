//! Bridge configuration, read from TOML.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::protocol::negotiation::supported_version;
use crate::types::{
    BridgeError, BridgeResult, HostContext, Implementation, HOST_NAME, HOST_VERSION,
    LATEST_PROTOCOL_VERSION,
};

/// Environment variable naming a config file when no path is given.
pub const CONFIG_ENV_VAR: &str = "MCP_APP_BRIDGE_CONFIG";

/// Host-side bridge configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Name reported as `hostInfo.name`.
    pub host_name: String,
    /// Version reported as `hostInfo.version`.
    pub host_version: String,
    /// Optional display title.
    pub host_title: Option<String>,
    /// Protocol version the host answers with when the App asks for one
    /// it does not support. Must be one of the supported versions.
    pub protocol_version: String,
    /// How long to wait for the App to acknowledge teardown.
    pub teardown_timeout_ms: u64,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Initial host context sent with the initialize result.
    pub host_context: Option<HostContext>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            host_name: HOST_NAME.to_string(),
            host_version: HOST_VERSION.to_string(),
            host_title: None,
            protocol_version: LATEST_PROTOCOL_VERSION.to_string(),
            teardown_timeout_ms: 500,
            log_level: "info".to_string(),
            host_context: None,
        }
    }
}

impl BridgeConfig {
    /// Parse a TOML document.
    pub fn from_toml(content: &str) -> BridgeResult<Self> {
        toml::from_str(content).map_err(|e| BridgeError::Config(format!("invalid TOML: {e}")))
    }

    pub fn host_info(&self) -> Implementation {
        let info = Implementation::new(&self.host_name, &self.host_version);
        match &self.host_title {
            Some(title) => info.with_title(title),
            None => info,
        }
    }

    /// The configured protocol version, or the latest supported one when
    /// the configured value is unknown.
    pub fn preferred_protocol_version(&self) -> &'static str {
        match supported_version(&self.protocol_version) {
            Some(version) => version,
            None => {
                tracing::warn!(
                    "Configured protocol version {} is not supported, using {}",
                    self.protocol_version,
                    LATEST_PROTOCOL_VERSION
                );
                LATEST_PROTOCOL_VERSION
            }
        }
    }

    pub fn teardown_timeout(&self) -> Duration {
        Duration::from_millis(self.teardown_timeout_ms)
    }
}

/// Load configuration.
///
/// Resolution order: the explicit `path`, then the file named by
/// `MCP_APP_BRIDGE_CONFIG`, then built-in defaults. An explicit path that
/// does not exist is an error; a missing env-var file falls back to
/// defaults with a warning.
pub fn load_config(path: Option<&str>) -> BridgeResult<BridgeConfig> {
    if let Some(path) = path {
        return read_config_file(Path::new(path));
    }

    if let Ok(env_path) = std::env::var(CONFIG_ENV_VAR) {
        let env_path = Path::new(&env_path);
        if env_path.exists() {
            return read_config_file(env_path);
        }
        tracing::warn!(
            "{CONFIG_ENV_VAR} points at {}, which does not exist. Using defaults.",
            env_path.display()
        );
    }

    Ok(BridgeConfig::default())
}

fn read_config_file(path: &Path) -> BridgeResult<BridgeConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        BridgeError::Config(format!("cannot read {}: {e}", path.display()))
    })?;
    let config = BridgeConfig::from_toml(&content)?;
    tracing::debug!("Loaded configuration from {}", path.display());
    Ok(config)
}
