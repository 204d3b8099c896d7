//! Cross-transport: the same Host/App conversation over every channel.
//!
//! Each test runs the full lifecycle (handshake, tool call, resource read,
//! context push, tool result, teardown, close) so that swapping the
//! transport never changes protocol behaviour.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use mcp_app_bridge::protocol::{ConnectionState, TeardownOutcome};
use mcp_app_bridge::transport::{InMemoryTransport, MessageEvent, Transport};
use mcp_app_bridge::types::{CallToolResult, DisplayMode, HostContext, Theme};
use mcp_app_bridge_tests::{connect, demo_app, demo_host, post_message_pair, stdio_pair, webview_pair};
use serde_json::json;

// ─── Helpers ───────────────────────────────────────────────────────────────

async fn run_lifecycle(host_end: Arc<dyn Transport>, app_end: Arc<dyn Transport>) {
    let teardowns = Arc::new(AtomicUsize::new(0));
    let cleanups = Arc::new(AtomicUsize::new(0));
    let results: Arc<Mutex<Vec<CallToolResult>>> = Arc::default();

    let host = {
        let teardowns = teardowns.clone();
        demo_host().on_teardown_complete(move || {
            teardowns.fetch_add(1, Ordering::SeqCst);
        })
    };
    let app = {
        let cleanups = cleanups.clone();
        let results = results.clone();
        demo_app()
            .on_tool_result(move |r| results.lock().unwrap().push(r))
            .on_teardown(move |_| {
                let cleanups = cleanups.clone();
                Box::pin(async move {
                    cleanups.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
            })
    };
    let (host, app) = connect(host, app, host_end, app_end).await;

    // Handshake
    assert_eq!(host.state().await, ConnectionState::Ready);
    assert_eq!(app.state().await, ConnectionState::Ready);
    let session = app.host_session().await.unwrap();
    assert_eq!(session.host_info.name, "demo-host");
    assert_eq!(host.app_info().await.unwrap().name, "demo-app");

    // App -> Host requests
    let sum = app
        .call_server_tool("add", Some(json!({"a": 2, "b": 3})))
        .await
        .unwrap();
    assert_eq!(sum.structured_content, Some(json!({"sum": 5})));

    let resource = app.read_server_resource("ui://demo/view").await.unwrap();
    assert_eq!(resource.contents[0].text.as_deref(), Some("<div>demo</div>"));

    assert_eq!(
        app.request_display_mode(DisplayMode::Fullscreen).await.unwrap(),
        DisplayMode::Fullscreen
    );

    // Host -> App notifications
    host.set_host_context(HostContext {
        theme: Some(Theme::Dark),
        ..HostContext::default()
    })
    .await
    .unwrap();
    host.send_tool_result(Some(json!({"rows": [1, 2]})))
        .await
        .unwrap();
    app.ping().await.unwrap();

    let context = app.host_context().await.unwrap();
    assert_eq!(context.theme, Some(Theme::Dark));
    assert_eq!(context.display_mode, Some(DisplayMode::Fullscreen));
    let delivered = results.lock().unwrap().clone();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].structured_content, Some(json!({"rows": [1, 2]})));

    // Teardown
    assert_eq!(host.teardown().await, TeardownOutcome::Acknowledged);
    assert_eq!(cleanups.load(Ordering::SeqCst), 1);
    assert_eq!(teardowns.load(Ordering::SeqCst), 1);

    host.close().await.unwrap();
    assert_eq!(host.state().await, ConnectionState::Closed);
    app.close().await.unwrap();
    assert_eq!(app.state().await, ConnectionState::Closed);
}

// ─── Tests ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_lifecycle_in_memory() {
    let (host_end, app_end) = InMemoryTransport::pair();
    run_lifecycle(Arc::new(host_end), Arc::new(app_end)).await;
}

#[tokio::test]
async fn test_lifecycle_post_message() {
    let (host_end, app_end) = post_message_pair();
    run_lifecycle(host_end, app_end).await;
}

#[tokio::test]
async fn test_lifecycle_webview() {
    let (host_end, app_end) = webview_pair();
    run_lifecycle(host_end, app_end).await;
}

#[tokio::test]
async fn test_lifecycle_stdio() {
    let (host_end, app_end) = stdio_pair();
    run_lifecycle(host_end, app_end).await;
}

/// A third frame posting into the host window is not part of the session.
#[tokio::test]
async fn test_post_message_ignores_foreign_frames() {
    let (host_end, app_end) = post_message_pair();
    let (host, app) = connect(demo_host(), demo_app(), host_end.clone(), app_end).await;

    let injected = json!({"jsonrpc": "2.0", "id": 77, "method": "tools/call", "params": {"name": "add"}});
    assert!(!host_end.dispatch_event(MessageEvent::new("ad-frame", "https://ads.example", injected)));

    // The real App is unaffected.
    let echo = app
        .call_server_tool("echo", Some(json!({"ok": true})))
        .await
        .unwrap();
    assert_eq!(echo.structured_content, Some(json!({"ok": true})));
    assert_eq!(host.state().await, ConnectionState::Ready);
}

/// Closing the host's stream ends the App's session.
#[tokio::test]
async fn test_stdio_close_reaches_peer() {
    let (host_end, app_end) = stdio_pair();
    let (host, app) = connect(demo_host(), demo_app(), host_end, app_end.clone()).await;

    host.close().await.unwrap();
    for _ in 0..100 {
        if app_end.is_closed() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    assert!(app_end.is_closed());
    assert!(app.call_server_tool("add", None).await.is_err());
}
