//! Concurrent access: many in-flight requests and many sessions at once.
//!
//! Tests verify that responses correlate with their requests when the App
//! has many calls outstanding, that independent sessions never see each
//! other's traffic, and that host pushes interleave safely with App calls.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::{Duration, Instant};

use futures::future::join_all;
use mcp_app_bridge::protocol::{AppBridge, TeardownOutcome};
use mcp_app_bridge::transport::InMemoryTransport;
use mcp_app_bridge::types::{CallToolResult, HostContext, Theme, UpdateModelContextParams};
use mcp_app_bridge_tests::{connect, demo_app, demo_host, post_message_pair};
use serde_json::json;
use tokio::sync::Barrier;

// ─── Tests ─────────────────────────────────────────────────────────────────

/// 100 concurrent calls from one App, each answered with its own sum.
#[tokio::test]
async fn test_concurrent_calls_correlate() {
    let (host_end, app_end) = InMemoryTransport::pair();
    let (_host, app) = connect(demo_host(), demo_app(), Arc::new(host_end), Arc::new(app_end)).await;

    let calls = (0..100i64).map(|i| {
        let app = app.clone();
        async move {
            let result = app
                .call_server_tool("add", Some(json!({"a": i, "b": 1000})))
                .await
                .unwrap();
            (i, result.structured_content)
        }
    });

    for (i, structured) in join_all(calls).await {
        assert_eq!(structured, Some(json!({"sum": i + 1000})), "call {i}");
    }
}

/// Concurrent calls from spawned tasks over a postMessage channel.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_calls_across_threads() {
    let (host_end, app_end) = post_message_pair();
    let (_host, app) = connect(demo_host(), demo_app(), host_end, app_end).await;

    let barrier = Arc::new(Barrier::new(8));
    let mut handles = vec![];
    for worker in 0..8i64 {
        let app = app.clone();
        let barrier = barrier.clone();
        handles.push(tokio::spawn(async move {
            barrier.wait().await; // Synchronize start
            for n in 0..25i64 {
                let result = app
                    .call_server_tool("add", Some(json!({"a": worker * 100, "b": n})))
                    .await
                    .unwrap();
                assert_eq!(result.structured_content, Some(json!({"sum": worker * 100 + n})));
            }
            worker
        }));
    }

    for handle in handles {
        let worker = handle.await.unwrap();
        println!("Worker {} completed successfully", worker);
    }
}

/// Independent sessions running side by side stay isolated.
#[tokio::test]
async fn test_parallel_sessions_are_isolated() {
    let barrier = Arc::new(Barrier::new(5));
    let mut handles = vec![];

    for session in 0..5u32 {
        let barrier = barrier.clone();
        handles.push(tokio::spawn(async move {
            barrier.wait().await;

            let contexts = Arc::new(AtomicUsize::new(0));
            let seen = contexts.clone();
            let app = demo_app().on_host_context_changed(move |_| {
                seen.fetch_add(1, Ordering::SeqCst);
            });
            let (host_end, app_end) = InMemoryTransport::pair();
            let (host, app) = connect(demo_host(), app, Arc::new(host_end), Arc::new(app_end)).await;

            // Each host pushes a different number of context updates.
            for _ in 0..=session {
                host.set_host_context(HostContext {
                    theme: Some(Theme::Dark),
                    ..HostContext::default()
                })
                .await
                .unwrap();
            }
            app.ping().await.unwrap();
            assert_eq!(contexts.load(Ordering::SeqCst), session as usize + 1);

            assert_eq!(host.teardown().await, TeardownOutcome::Acknowledged);
            session
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }
}

/// Host notifications interleaved with App requests are all delivered.
#[tokio::test]
async fn test_pushes_interleave_with_calls() {
    let inputs = Arc::new(AtomicUsize::new(0));
    let seen = inputs.clone();
    let app = demo_app().on_tool_input_partial(move |_| {
        seen.fetch_add(1, Ordering::SeqCst);
    });
    let (host_end, app_end) = InMemoryTransport::pair();
    let (host, app) = connect(demo_host(), app, Arc::new(host_end), Arc::new(app_end)).await;

    let pusher = {
        let host = host.clone();
        tokio::spawn(async move {
            for n in 0..200 {
                host.send_tool_input_partial(json!({"chunk": n})).await.unwrap();
                tokio::task::yield_now().await;
            }
        })
    };
    let caller = {
        let app = app.clone();
        tokio::spawn(async move {
            for n in 0..50i64 {
                let result = app
                    .call_server_tool("add", Some(json!({"a": n, "b": n})))
                    .await
                    .unwrap();
                assert_eq!(result.structured_content, Some(json!({"sum": 2 * n})));
            }
        })
    };

    pusher.await.unwrap();
    caller.await.unwrap();
    app.ping().await.unwrap();
    assert_eq!(inputs.load(Ordering::SeqCst), 200);
}

/// Teardown requested while calls are still in flight completes once.
#[tokio::test]
async fn test_teardown_during_calls() {
    let completions = Arc::new(AtomicUsize::new(0));
    let hook = completions.clone();
    let host = demo_host().on_teardown_complete(move || {
        hook.fetch_add(1, Ordering::SeqCst);
    });
    let (host_end, app_end) = InMemoryTransport::pair();
    let (host, app) = connect(host, demo_app(), Arc::new(host_end), Arc::new(app_end)).await;

    let calls = (0..20i64).map(|i| {
        let app = app.clone();
        async move { app.call_server_tool("add", Some(json!({"a": i, "b": 0}))).await }
    });
    let (outcome, results) = tokio::join!(host.teardown(), join_all(calls));

    assert_eq!(outcome, TeardownOutcome::Acknowledged);
    assert!(results.iter().all(|r| r.is_ok()));
    assert_eq!(completions.load(Ordering::SeqCst), 1);
}

/// A slow tool call in flight does not hold back the teardown acknowledgment.
#[tokio::test]
async fn test_teardown_acknowledged_during_slow_tool_call() {
    let host = demo_host().on_tool_call(|params| {
        Box::pin(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            Ok(CallToolResult::text(format!("{} finished", params.name)))
        })
    });
    let (host_end, app_end) = InMemoryTransport::pair();
    let (host, app) = connect(host, demo_app(), Arc::new(host_end), Arc::new(app_end)).await;

    let slow = {
        let app = app.clone();
        tokio::spawn(async move { app.call_server_tool("slow", None).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    let started = Instant::now();
    assert_eq!(host.teardown().await, TeardownOutcome::Acknowledged);
    assert!(started.elapsed() < Duration::from_millis(500));

    // The tool call still gets its answer afterwards.
    let result = slow.await.unwrap().unwrap();
    assert_eq!(result, CallToolResult::text("slow finished"));
}

/// The App's teardown handler can save state through the bridge before it
/// acknowledges, and the App keeps working afterwards.
#[tokio::test]
async fn test_teardown_handler_saves_state_through_bridge() {
    let saved: Arc<Mutex<Vec<UpdateModelContextParams>>> = Arc::default();
    let sink = saved.clone();
    let host = demo_host().on_update_model_context(move |params| {
        sink.lock().unwrap().push(params);
        Box::pin(async { Ok(()) })
    });

    let slot: Arc<OnceLock<Arc<AppBridge>>> = Arc::default();
    let app = {
        let slot = slot.clone();
        demo_app().on_teardown(move |_| {
            let slot = slot.clone();
            Box::pin(async move {
                let app = slot
                    .get()
                    .cloned()
                    .ok_or_else(|| anyhow::anyhow!("app not registered"))?;
                app.update_model_context(UpdateModelContextParams {
                    content: None,
                    structured_content: Some(json!({"draft": "saved"})),
                })
                .await?;
                Ok::<(), anyhow::Error>(())
            })
        })
    };
    let (host_end, app_end) = InMemoryTransport::pair();
    let (host, app) = connect(host, app, Arc::new(host_end), Arc::new(app_end)).await;
    assert!(slot.set(app.clone()).is_ok());

    assert_eq!(host.teardown().await, TeardownOutcome::Acknowledged);
    assert_eq!(
        saved.lock().unwrap()[0].structured_content,
        Some(json!({"draft": "saved"}))
    );

    tokio::time::timeout(Duration::from_secs(1), app.ping())
        .await
        .expect("app engine stopped answering")
        .unwrap();
}
