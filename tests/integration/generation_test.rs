//! Generation Controller Integration Tests
//!
//! Drives `GenerationController` through a channel-backed fake transport:
//! - Chunk order and callback counts
//! - Single-flight rejection without a second transport open
//! - Failure with partial buffer retained
//! - Cancellation by dropping the run and by `cancel`
//! - Caller-supplied timeout

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use abogabot::services::generation::{GenerationController, GenerationOptions};
use abogabot_core::{CaseId, GenerationError, RunState};

use crate::support::{wait_until, ChannelTransport, FailingTransport};

// ============================================================================
// Helpers
// ============================================================================

fn controller(transport: Arc<ChannelTransport>) -> Arc<GenerationController> {
    Arc::new(GenerationController::new(transport))
}

/// Spawn a run whose chunks are forwarded to the returned receiver.
fn spawn_run(
    controller: &Arc<GenerationController>,
    case_id: &str,
    options: GenerationOptions,
) -> (
    tokio::task::JoinHandle<Result<String, GenerationError>>,
    mpsc::UnboundedReceiver<String>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    let controller = controller.clone();
    let case_id = CaseId::from(case_id);
    let handle = tokio::spawn(async move {
        controller
            .start_with_options(&case_id, options, move |chunk| {
                let _ = tx.send(chunk.to_string());
            })
            .await
    });
    (handle, rx)
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_end_to_end_stream() {
    let transport = ChannelTransport::new();
    let feed = transport.push_stream();
    let controller = controller(transport.clone());
    let case = CaseId::from("42");

    let (handle, mut chunks) = spawn_run(&controller, "42", GenerationOptions::default());
    transport.wait_opened().await;

    for part in ["DEMANDA ", "CIVIL\n", "Señor Juez..."] {
        feed.send(part);
        assert_eq!(chunks.recv().await.unwrap(), part);
        assert!(controller.is_running(&case));
    }
    assert_eq!(
        controller.snapshot(&case).unwrap().buffer,
        "DEMANDA CIVIL\nSeñor Juez..."
    );
    feed.finish();

    let text = handle.await.unwrap().unwrap();
    assert_eq!(text, "DEMANDA CIVIL\nSeñor Juez...");
    assert!(!controller.is_running(&case));
    assert_eq!(controller.state(&case), RunState::Succeeded);
    assert!(chunks.recv().await.is_none());
}

#[tokio::test]
async fn test_chunks_delivered_in_order_exactly_once() {
    let transport = ChannelTransport::new();
    let parts: Vec<String> = (0..50).map(|i| format!("párrafo {}\n", i)).collect();
    let refs: Vec<&str> = parts.iter().map(String::as_str).collect();
    transport.push_chunks(&refs);
    let controller = controller(transport);

    let mut seen = Vec::new();
    let text = controller
        .start("7", |chunk| seen.push(chunk.to_string()))
        .await
        .unwrap();

    assert_eq!(seen, parts);
    assert_eq!(text, parts.concat());
}

#[tokio::test]
async fn test_split_multibyte_chunk_through_controller() {
    let transport = ChannelTransport::new();
    let feed = transport.push_stream();
    feed.send_bytes(b"Se\xC3");
    feed.send_bytes(b"\xB1or Juez \xE2\x82");
    feed.send_bytes(b"\xAC");
    feed.finish();
    let controller = controller(transport);

    let mut seen = Vec::new();
    let text = controller
        .start("7", |chunk| seen.push(chunk.to_string()))
        .await
        .unwrap();

    assert_eq!(text, "Señor Juez €");
    assert_eq!(seen, vec!["Se", "ñor Juez ", "€"]);
}

#[tokio::test]
async fn test_second_start_conflicts_without_opening_stream() {
    let transport = ChannelTransport::new();
    let feed = transport.push_stream();
    let controller = controller(transport.clone());
    let case = CaseId::from("42");

    let (handle, _chunks) = spawn_run(&controller, "42", GenerationOptions::default());
    wait_until(|| controller.is_running(&case)).await;

    let mut called = false;
    let err = controller.start(&case, |_| called = true).await.unwrap_err();

    assert_eq!(err, GenerationError::conflict("42"));
    assert!(!called);
    assert_eq!(transport.opens(), 1);
    assert!(controller.is_running(&case));

    feed.send("fin");
    feed.finish();
    assert_eq!(handle.await.unwrap().unwrap(), "fin");
}

#[tokio::test]
async fn test_different_cases_run_independently() {
    let transport = ChannelTransport::new();
    let feed_a = transport.push_stream();
    let feed_b = transport.push_stream();
    let controller = controller(transport.clone());

    let (a, _ca) = spawn_run(&controller, "a", GenerationOptions::default());
    wait_until(|| transport.opens() == 1).await;
    let (b, _cb) = spawn_run(&controller, "b", GenerationOptions::default());
    wait_until(|| transport.opens() == 2).await;

    let mut running = controller.running_cases();
    running.sort();
    assert_eq!(running, vec![CaseId::from("a"), CaseId::from("b")]);

    feed_a.send("uno");
    feed_a.finish();
    feed_b.send("dos");
    feed_b.finish();
    assert_eq!(a.await.unwrap().unwrap(), "uno");
    assert_eq!(b.await.unwrap().unwrap(), "dos");
}

#[tokio::test]
async fn test_failure_keeps_partial_buffer() {
    let transport = ChannelTransport::new();
    let feed = transport.push_stream();
    feed.send("DEMANDA ");
    feed.fail(GenerationError::transport(500, "Internal Server Error"));
    let controller = controller(transport);
    let case = CaseId::from("42");

    let mut calls = 0;
    let err = controller.start(&case, |_| calls += 1).await.unwrap_err();

    assert!(matches!(err, GenerationError::Transport { status: 500, .. }));
    assert!(err.is_retryable());
    assert_eq!(calls, 1);
    assert!(!controller.is_running(&case));

    let snapshot = controller.snapshot(&case).unwrap();
    assert_eq!(snapshot.state, RunState::Failed);
    assert_eq!(snapshot.buffer, "DEMANDA ");
}

#[tokio::test]
async fn test_open_failure_fails_run() {
    let controller = GenerationController::new(Arc::new(FailingTransport(
        GenerationError::transport(503, "Service Unavailable"),
    )));
    let case = CaseId::from("42");

    let mut calls = 0;
    let err = controller.start(&case, |_| calls += 1).await.unwrap_err();

    assert_eq!(err, GenerationError::transport(503, "Service Unavailable"));
    assert_eq!(calls, 0);
    assert_eq!(controller.snapshot(&case).unwrap().buffer, "");
}

#[tokio::test]
async fn test_retry_starts_from_empty_buffer() {
    let transport = ChannelTransport::new();
    let feed = transport.push_stream();
    feed.send("DEMANDA ");
    feed.fail(GenerationError::network("connection reset"));
    transport.push_chunks(&["DEMANDA ", "CIVIL"]);
    let controller = controller(transport);
    let case = CaseId::from("42");

    assert!(controller.start(&case, |_| {}).await.is_err());
    let text = controller.start(&case, |_| {}).await.unwrap();

    assert_eq!(text, "DEMANDA CIVIL");
    assert_eq!(controller.snapshot(&case).unwrap().buffer, "DEMANDA CIVIL");
    assert_eq!(controller.epoch(&case), 2);
}

#[tokio::test]
async fn test_dropping_run_aborts_stream() {
    let transport = ChannelTransport::new();
    let feed = transport.push_stream();
    let controller = controller(transport.clone());
    let case = CaseId::from("42");

    let (handle, mut chunks) = spawn_run(&controller, "42", GenerationOptions::default());
    feed.send("DEMANDA ");
    assert_eq!(chunks.recv().await.unwrap(), "DEMANDA ");

    handle.abort();
    assert!(handle.await.unwrap_err().is_cancelled());

    tokio::time::timeout(Duration::from_secs(1), feed.closed())
        .await
        .unwrap();
    assert!(!feed.send("CIVIL"));
    assert!(chunks.recv().await.is_none());
    assert!(!controller.is_running(&case));
    assert!(controller.snapshot(&case).is_none());

    // A fresh run is accepted afterwards
    transport.push_chunks(&["nuevo"]);
    assert_eq!(controller.start(&case, |_| {}).await.unwrap(), "nuevo");
}

#[tokio::test]
async fn test_cancel_settles_with_cancelled() {
    let transport = ChannelTransport::new();
    let feed = transport.push_stream();
    let controller = controller(transport);
    let case = CaseId::from("42");

    let (handle, mut chunks) = spawn_run(&controller, "42", GenerationOptions::default());
    feed.send("DEMANDA ");
    chunks.recv().await.unwrap();

    assert!(controller.cancel(&case));
    let err = handle.await.unwrap().unwrap_err();

    assert_eq!(err, GenerationError::Cancelled);
    assert!(!err.is_retryable());
    assert!(feed.is_closed());
    assert_eq!(controller.state(&case), RunState::Idle);
    assert!(!controller.cancel(&case));
}

#[tokio::test]
async fn test_timeout_fails_with_partial() {
    let transport = ChannelTransport::new();
    let feed = transport.push_stream();
    feed.send("DEMANDA ");
    let controller = controller(transport);
    let case = CaseId::from("42");

    let err = controller
        .start_with_options(
            &case,
            GenerationOptions::with_timeout(Duration::from_millis(50)),
            |_| {},
        )
        .await
        .unwrap_err();

    assert_eq!(err, GenerationError::Timeout { after_ms: 50 });
    assert!(feed.is_closed());
    let snapshot = controller.snapshot(&case).unwrap();
    assert_eq!(snapshot.state, RunState::Failed);
    assert_eq!(snapshot.buffer, "DEMANDA ");
    assert!(snapshot.error.unwrap().contains("timed out"));
}
