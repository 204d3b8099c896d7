//! Stress tests: volume, large payloads and many short sessions.
//!
//! Tests verify that ordering holds across thousands of frames, that large
//! frames survive every serializing channel, and that the engines handle
//! repeated connect/teardown cycles within acceptable bounds.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use mcp_app_bridge::protocol::TeardownOutcome;
use mcp_app_bridge::transport::InMemoryTransport;
use mcp_app_bridge::types::ToolInputParams;
use mcp_app_bridge_tests::{connect, demo_app, demo_host, stdio_pair, webview_pair};
use serde_json::json;

// ─── Tests ─────────────────────────────────────────────────────────────────

/// 5K partial-input notifications arrive complete and in order.
#[tokio::test]
async fn test_notification_ordering_at_volume() {
    let received: Arc<Mutex<Vec<i64>>> = Arc::default();
    let sink = received.clone();
    let app = demo_app().on_tool_input_partial(move |p: ToolInputParams| {
        sink.lock().unwrap().push(p.arguments["seq"].as_i64().unwrap());
    });
    let (host_end, app_end) = InMemoryTransport::pair();
    let (host, app) = connect(demo_host(), app, Arc::new(host_end), Arc::new(app_end)).await;

    let start = Instant::now();
    for seq in 0..5_000i64 {
        host.send_tool_input_partial(json!({"seq": seq})).await.unwrap();
    }
    app.ping().await.unwrap();
    let elapsed = start.elapsed();

    let received = received.lock().unwrap().clone();
    assert_eq!(received.len(), 5_000);
    assert!(received.windows(2).all(|w| w[0] + 1 == w[1]), "out of order");
    println!("5K notifications delivered in {:?}", elapsed);
    assert!(elapsed < Duration::from_secs(10));
}

/// 1K sequential tool calls over stdio framing.
#[tokio::test]
async fn test_sequential_calls_over_stdio() {
    let (host_end, app_end) = stdio_pair();
    let (_host, app) = connect(demo_host(), demo_app(), host_end, app_end).await;

    let start = Instant::now();
    for i in 0..1_000i64 {
        let result = app
            .call_server_tool("add", Some(json!({"a": i, "b": i})))
            .await
            .unwrap();
        assert_eq!(result.structured_content, Some(json!({"sum": 2 * i})));
    }
    let elapsed = start.elapsed();
    println!("1K stdio round trips in {:?}", elapsed);
    assert!(elapsed < Duration::from_secs(20));
}

/// A 1 MB argument round-trips through the serializing channels intact.
#[tokio::test]
async fn test_large_payloads() {
    let blob = "x".repeat(1024 * 1024);

    let (host_end, app_end) = stdio_pair();
    let (_host, app) = connect(demo_host(), demo_app(), host_end, app_end).await;
    let echoed = app
        .call_server_tool("echo", Some(json!({"blob": blob})))
        .await
        .unwrap();
    assert_eq!(echoed.structured_content.unwrap()["blob"].as_str().unwrap().len(), blob.len());

    let (host_end, app_end) = webview_pair();
    let (_host, app) = connect(demo_host(), demo_app(), host_end, app_end).await;
    let echoed = app
        .call_server_tool("echo", Some(json!({"blob": blob})))
        .await
        .unwrap();
    assert_eq!(echoed.structured_content.unwrap()["blob"].as_str().unwrap().len(), blob.len());
}

/// 200 short sessions, each with a full handshake and acknowledged teardown.
#[tokio::test]
async fn test_many_short_sessions() {
    let start = Instant::now();
    for session in 0..200 {
        let (host_end, app_end) = InMemoryTransport::pair();
        let (host, app) = connect(demo_host(), demo_app(), Arc::new(host_end), Arc::new(app_end)).await;

        let result = app
            .call_server_tool("add", Some(json!({"a": session, "b": 1})))
            .await
            .unwrap();
        assert_eq!(result.structured_content, Some(json!({"sum": session + 1})));

        assert_eq!(host.teardown().await, TeardownOutcome::Acknowledged);
        host.close().await.unwrap();
    }
    let elapsed = start.elapsed();
    println!("200 sessions in {:?}", elapsed);
    assert!(elapsed < Duration::from_secs(30));
}

/// Repeated teardown cycles on one session each get a fresh acknowledgment.
#[tokio::test]
async fn test_repeated_teardown_cycles() {
    let (host_end, app_end) = InMemoryTransport::pair();
    let (host, _app) = connect(demo_host(), demo_app(), Arc::new(host_end), Arc::new(app_end)).await;

    for _ in 0..100 {
        assert_eq!(host.teardown().await, TeardownOutcome::Acknowledged);
        assert!(host.teardown_completed());
    }
}
