//! Phase 7: Configuration tests. TOML loading, defaults and how a loaded
//! config shapes the host engine.

use std::io::Write;
use std::time::Duration;

use tempfile::{tempdir, NamedTempFile};

use mcp_app_bridge::config::{load_config, BridgeConfig, CONFIG_ENV_VAR};
use mcp_app_bridge::protocol::HostBridge;
use mcp_app_bridge::types::{BridgeError, DisplayMode, Theme};

mod common;

use common::fixtures::*;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_defaults() {
    let config = BridgeConfig::default();
    assert_eq!(config.host_name, "mcp-app-bridge");
    assert_eq!(config.protocol_version, "2025-11-21");
    assert_eq!(config.teardown_timeout(), Duration::from_millis(500));
    assert_eq!(config.log_level, "info");
    assert!(config.host_context.is_none());
}

#[test]
fn test_partial_toml_keeps_defaults() {
    let config = BridgeConfig::from_toml("host_name = \"chat-shell\"\n").unwrap();
    assert_eq!(config.host_name, "chat-shell");
    assert_eq!(config.teardown_timeout_ms, 500);
    assert_eq!(config.host_info().title, None);
}

#[test]
fn test_load_full_file() {
    let file = write_config(
        r#"
host_name = "chat-shell"
host_version = "3.2.1"
host_title = "Chat Shell"
teardown_timeout_ms = 1500
log_level = "debug"

[host_context]
theme = "dark"
displayMode = "inline"
locale = "en-GB"
"#,
    );

    let config = load_config(file.path().to_str()).unwrap();
    let info = config.host_info();
    assert_eq!(info.name, "chat-shell");
    assert_eq!(info.version, "3.2.1");
    assert_eq!(info.title.as_deref(), Some("Chat Shell"));
    assert_eq!(config.teardown_timeout(), Duration::from_millis(1500));
    assert_eq!(config.log_level, "debug");

    let context = config.host_context.unwrap();
    assert_eq!(context.theme, Some(Theme::Dark));
    assert_eq!(context.display_mode, Some(DisplayMode::Inline));
    assert_eq!(context.locale.as_deref(), Some("en-GB"));
}

#[test]
fn test_missing_explicit_path_is_an_error() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("absent.toml");
    let err = load_config(missing.to_str()).unwrap_err();
    assert!(matches!(err, BridgeError::Config(_)));
}

#[test]
fn test_invalid_toml_is_an_error() {
    let file = write_config("host_name = [unterminated");
    let err = load_config(file.path().to_str()).unwrap_err();
    match err {
        BridgeError::Config(msg) => assert!(msg.contains("invalid TOML")),
        other => panic!("expected config error, got {other:?}"),
    }

    let file = write_config("teardown_timeout_ms = \"soon\"");
    assert!(matches!(
        load_config(file.path().to_str()),
        Err(BridgeError::Config(_))
    ));
}

#[test]
fn test_env_var_resolution() {
    // Only this test touches the variable.
    let file = write_config("host_name = \"from-env\"");
    std::env::set_var(CONFIG_ENV_VAR, file.path());
    assert_eq!(load_config(None).unwrap().host_name, "from-env");

    // An explicit path wins over the variable.
    let explicit = write_config("host_name = \"explicit\"");
    assert_eq!(
        load_config(explicit.path().to_str()).unwrap().host_name,
        "explicit"
    );

    // A dangling variable falls back to defaults.
    let dir = tempdir().unwrap();
    std::env::set_var(CONFIG_ENV_VAR, dir.path().join("gone.toml"));
    assert_eq!(load_config(None).unwrap(), BridgeConfig::default());

    std::env::remove_var(CONFIG_ENV_VAR);
    assert_eq!(load_config(None).unwrap(), BridgeConfig::default());
}

#[tokio::test]
async fn test_config_shapes_host_engine() {
    let config = BridgeConfig::from_toml(
        r#"
host_name = "configured-host"
host_version = "9.9.9"

[host_context]
theme = "light"
"#,
    )
    .unwrap();

    let mut harness = HostHarness::connect(HostBridge::default_builder().with_config(&config)).await;
    let response = harness.handshake().await;
    assert_eq!(response["result"]["hostInfo"]["name"], "configured-host");
    assert_eq!(response["result"]["hostInfo"]["version"], "9.9.9");
    assert_eq!(response["result"]["hostContext"]["theme"], "light");
}

#[tokio::test]
async fn test_config_protocol_version_drives_negotiation() {
    let config = BridgeConfig::from_toml("protocol_version = \"2025-06-18\"").unwrap();
    assert_eq!(config.preferred_protocol_version(), "2025-06-18");

    let mut harness = HostHarness::connect(HostBridge::default_builder().with_config(&config)).await;
    harness
        .send(request(
            1,
            "ui/initialize",
            serde_json::json!({
                "protocolVersion": "2030-01-01",
                "appInfo": {"name": "future-app", "version": "1.0.0"}
            }),
        ))
        .await;
    let response = harness.recv().await;
    assert_eq!(response["result"]["protocolVersion"], "2025-06-18");

    let unknown = BridgeConfig::from_toml("protocol_version = \"1999-01-01\"").unwrap();
    assert_eq!(unknown.preferred_protocol_version(), "2025-11-21");
}
