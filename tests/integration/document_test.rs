//! Document View Integration Tests
//!
//! The displayed content of a case across refreshes and generation runs:
//! persisted revisions, live streaming, completed output, and partial output
//! from a failed run.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use abogabot::models::settings::AppConfig;
use abogabot::services::document::{DisplayedContent, DocumentView};
use abogabot::services::revisions::Reconciliation;
use abogabot::state::AppState;
use abogabot_core::{GenerationError, RevisionError};

use crate::support::{wait_until, ChannelTransport, MemoryStore};

fn state() -> (Arc<ChannelTransport>, Arc<MemoryStore>, AppState) {
    let transport = ChannelTransport::new();
    let store = MemoryStore::new();
    let state = AppState::with_backend(AppConfig::default(), transport.clone(), store.clone());
    (transport, store, state)
}

fn persisted(text: &str) -> DisplayedContent {
    DisplayedContent::Persisted {
        text: text.to_string(),
    }
}

#[tokio::test]
async fn test_refresh_shows_latest_revision() {
    let (_transport, store, state) = state();
    store.add("42", "r1", "2025-04-18T16:51:22", "vieja");
    store.add("42", "r2", "2025-04-19T16:51:22", "DEMANDA CIVIL");
    let view = state.document("42");

    let outcome = view.refresh().await.unwrap();

    assert_eq!(outcome, Reconciliation::Applied(Some("DEMANDA CIVIL".to_string())));
    assert_eq!(view.content(), persisted("DEMANDA CIVIL"));
}

#[tokio::test]
async fn test_refresh_without_revisions_is_empty() {
    let (_transport, _store, state) = state();
    let view = state.document("case-without-docs");

    view.refresh().await.unwrap();

    assert_eq!(view.content(), DisplayedContent::Empty);
}

#[tokio::test]
async fn test_refresh_error_keeps_displayed_content() {
    let (_transport, store, state) = state();
    store.add("42", "r1", "2025-04-18T16:51:22", "DEMANDA");
    let view = state.document("42");
    view.refresh().await.unwrap();

    store.fail_list_with(RevisionError::http(502, "Bad Gateway"));
    let err = view.refresh().await.unwrap_err();

    assert!(err.to_string().contains("502"));
    assert_eq!(view.content(), persisted("DEMANDA"));
}

#[tokio::test]
async fn test_generate_streams_then_completes() {
    let (transport, store, state) = state();
    store.add("42", "r1", "2025-04-18T16:51:22", "vieja");
    let feed = transport.push_stream();
    let view = Arc::new(state.document("42"));
    view.refresh().await.unwrap();

    let run = {
        let view = view.clone();
        tokio::spawn(async move { view.generate(|_| {}).await })
    };
    wait_until(|| view.content().is_streaming()).await;

    feed.send("DEMANDA ");
    wait_until(|| view.content().text() == "DEMANDA ").await;
    feed.send("CIVIL");
    wait_until(|| view.content().text() == "DEMANDA CIVIL").await;
    assert!(view.content().is_streaming());

    // A refresh during the run must not replace the stream
    let outcome = view.refresh().await.unwrap();
    assert!(outcome.is_superseded());
    assert_eq!(view.content().text(), "DEMANDA CIVIL");

    feed.finish();
    assert_eq!(run.await.unwrap().unwrap(), "DEMANDA CIVIL");
    assert_eq!(
        view.content(),
        DisplayedContent::Generated {
            text: "DEMANDA CIVIL".to_string()
        }
    );
    assert!(!view.is_incomplete());
}

#[tokio::test]
async fn test_failed_generation_is_marked_incomplete() {
    let (transport, _store, state) = state();
    let feed = transport.push_stream();
    feed.send("DEMANDA ");
    feed.fail(GenerationError::transport(500, "Internal Server Error"));
    let view = state.document("42");

    let mut chunks = Vec::new();
    let err = view
        .generate(|c| chunks.push(c.to_string()))
        .await
        .unwrap_err();

    assert!(matches!(err, GenerationError::Transport { status: 500, .. }));
    assert_eq!(chunks, vec!["DEMANDA "]);
    assert!(view.is_incomplete());
    match view.content() {
        DisplayedContent::Incomplete { partial, error } => {
            assert_eq!(partial, "DEMANDA ");
            assert!(error.contains("500"));
        }
        other => panic!("expected incomplete content, got {:?}", other),
    }
}

#[tokio::test]
async fn test_conflicting_generate_keeps_previous_content() {
    let (transport, store, state) = state();
    store.add("42", "r1", "2025-04-18T16:51:22", "DEMANDA");
    let feed = transport.push_stream();

    let first = Arc::new(state.document("42"));
    let second: DocumentView = state.document("42");
    second.refresh().await.unwrap();

    let run = {
        let first = first.clone();
        tokio::spawn(async move { first.generate(|_| {}).await })
    };
    wait_until(|| state.controller().is_running(&"42".into())).await;

    let err = second.generate(|_| {}).await.unwrap_err();

    assert!(matches!(err, GenerationError::Conflict { .. }));
    assert_eq!(second.content(), persisted("DEMANDA"));
    assert_eq!(transport.opens(), 1);

    feed.finish();
    run.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_rejected_generate_on_same_view_keeps_stream() {
    let (transport, _store, state) = state();
    let feed = transport.push_stream();
    let view = Arc::new(state.document("42"));

    let run = {
        let view = view.clone();
        tokio::spawn(async move { view.generate(|_| {}).await })
    };
    feed.send("DEMANDA CIVIL ");
    wait_until(|| view.content().text() == "DEMANDA CIVIL ").await;

    let mut chunks = 0;
    let err = view.generate(|_| chunks += 1).await.unwrap_err();

    assert!(matches!(err, GenerationError::Conflict { .. }));
    assert_eq!(chunks, 0);
    assert_eq!(
        view.content(),
        DisplayedContent::Streaming {
            text: "DEMANDA CIVIL ".to_string()
        }
    );

    feed.send("CONTRA");
    feed.finish();
    assert_eq!(run.await.unwrap().unwrap(), "DEMANDA CIVIL CONTRA");
    assert_eq!(transport.opens(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_streaming_text_never_shrinks_under_rejected_generates() {
    let (transport, _store, state) = state();
    let feed = transport.push_stream();
    let view = Arc::new(state.document("42"));

    let run = {
        let view = view.clone();
        tokio::spawn(async move { view.generate(|_| {}).await })
    };
    feed.send("DEMANDA ");
    wait_until(|| view.content().text() == "DEMANDA ").await;

    let stop = Arc::new(AtomicBool::new(false));
    let shrinks = Arc::new(AtomicUsize::new(0));
    let sampler = {
        let view = view.clone();
        let stop = stop.clone();
        let shrinks = shrinks.clone();
        std::thread::spawn(move || {
            let mut last = 0;
            while !stop.load(Ordering::SeqCst) {
                let len = view.content().text().len();
                if len < last {
                    shrinks.fetch_add(1, Ordering::SeqCst);
                }
                last = len;
            }
        })
    };

    let duplicates: Vec<_> = (0..2000)
        .map(|_| {
            let view = view.clone();
            tokio::spawn(async move { view.generate(|_| {}).await })
        })
        .collect();
    for part in ["CIVIL ", "CONTRA ", "EMPRESA"] {
        feed.send(part);
    }
    for duplicate in duplicates {
        let err = duplicate.await.unwrap().unwrap_err();
        assert!(matches!(err, GenerationError::Conflict { .. }));
    }
    wait_until(|| view.content().text() == "DEMANDA CIVIL CONTRA EMPRESA").await;

    stop.store(true, Ordering::SeqCst);
    sampler.join().unwrap();
    assert_eq!(shrinks.load(Ordering::SeqCst), 0);
    assert!(view.content().is_streaming());

    feed.finish();
    run.await.unwrap().unwrap();
    assert_eq!(transport.opens(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_incomplete_partial_is_the_views_own_output() {
    for _ in 0..50 {
        let (transport, _store, state) = state();
        let failing = transport.push_stream();
        let next = transport.push_stream();
        let first = Arc::new(state.document("42"));
        let second = Arc::new(state.document("42"));

        let failed = {
            let first = first.clone();
            tokio::spawn(async move { first.generate(|_| {}).await })
        };
        failing.send("PARCIAL ");
        wait_until(|| first.content().text() == "PARCIAL ").await;

        // Retries until the failing run settles, then starts a fresh run at once
        let retry = {
            let second = second.clone();
            tokio::spawn(async move {
                loop {
                    match second.generate(|_| {}).await {
                        Err(GenerationError::Conflict { .. }) => tokio::task::yield_now().await,
                        other => break other,
                    }
                }
            })
        };
        failing.fail(GenerationError::transport(500, "Internal Server Error"));

        assert!(failed.await.unwrap().is_err());
        match first.content() {
            DisplayedContent::Incomplete { partial, error } => {
                assert_eq!(partial, "PARCIAL ");
                assert!(error.contains("500"));
            }
            other => panic!("expected incomplete content, got {:?}", other),
        }

        wait_until(|| second.content().is_streaming()).await;
        next.finish();
        assert_eq!(retry.await.unwrap().unwrap(), "");
    }
}

#[tokio::test]
async fn test_refresh_after_generation_reconfirms_backend() {
    let (transport, store, state) = state();
    transport.push_chunks(&["DEMANDA NUEVA"]);
    let view = state.document("42");

    view.generate(|_| {}).await.unwrap();
    store.add("42", "r9", "2025-05-01T12:00:00", "DEMANDA NUEVA (persistida)");
    view.refresh().await.unwrap();

    assert_eq!(view.content(), persisted("DEMANDA NUEVA (persistida)"));
}
