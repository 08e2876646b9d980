//! Background Fetch Integration Tests
//!
//! Drives the controller with a scripted image source to check:
//! - Superseded fetches never publish
//! - Failures surface as a failed status and an event
//! - Inline and blank backgrounds resolve without retrieval
//! - Loading a stored remote background starts a fetch

mod common;

use std::sync::Arc;

use common::{drain, open_seeded, png, url, ScriptedSource, QUIET_AUTOSAVE};
use emoji_art_core::{Background, Canvas};
use emoji_art_document::{DocumentController, DocumentEvent, FetchStatus, MemoryStore};

const A: &str = "https://img.test/a.png";
const B: &str = "https://img.test/b.png";

// ============================================================================
// Ordering
// ============================================================================

#[tokio::test]
async fn test_superseded_fetch_never_publishes() {
    let source = ScriptedSource::new();
    let gate_a = source.gated(A, png(10, 10));
    let gate_b = source.gated(B, png(2, 3));
    let (doc, _store) = open_seeded(source, QUIET_AUTOSAVE).await;

    doc.set_background(Background::remote(url(A)));
    doc.set_background(Background::remote(url(B)));
    doc.sync().await.expect("sync");

    // Releasing the older fetch first must not show its image.
    gate_a.notify_one();
    tokio::task::yield_now().await;
    doc.sync().await.expect("sync");
    let state = doc.state();
    assert_eq!(state.status, FetchStatus::Fetching);
    assert!(state.image.is_none());

    gate_b.notify_one();
    let state = doc.wait_for_fetch().await.expect("fetch");
    assert_eq!(state.status, FetchStatus::Idle);
    let image = state.image.expect("image");
    assert_eq!((image.width, image.height), (2, 3));
    assert_eq!(state.canvas.background().url(), Some(&url(B)));
}

#[tokio::test]
async fn test_late_completion_of_older_fetch_is_ignored() {
    let source = ScriptedSource::new();
    let gate_a = source.gated(A, png(10, 10));
    source.ok(B, png(2, 3));
    let (doc, _store) = open_seeded(source, QUIET_AUTOSAVE).await;

    doc.set_background(Background::remote(url(A)));
    doc.set_background(Background::remote(url(B)));
    let state = doc.wait_for_fetch().await.expect("fetch");
    let revision = state.revision;
    assert_eq!(state.image.map(|i| i.width), Some(2));

    gate_a.notify_one();
    tokio::task::yield_now().await;
    doc.sync().await.expect("sync");
    let state = doc.state();
    assert_eq!(state.revision, revision);
    assert_eq!(state.image.map(|i| i.width), Some(2));
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_error_status_marks_fetch_failed() {
    let source = ScriptedSource::new();
    source.status(A, 404);
    let (doc, _store) = open_seeded(source, QUIET_AUTOSAVE).await;
    let mut events = doc.events();

    doc.set_background(Background::remote(url(A)));
    let state = doc.wait_for_fetch().await.expect("fetch");
    assert_eq!(state.status, FetchStatus::Failed(url(A)));
    assert!(state.image.is_none());

    let events = drain(&mut events);
    assert!(events.contains(&DocumentEvent::BackgroundFetchFailed { url: url(A) }));
}

#[tokio::test]
async fn test_undecodable_bytes_mark_fetch_failed() {
    let source = ScriptedSource::new();
    source.ok(A, b"<html>not an image</html>".to_vec());
    let (doc, _store) = open_seeded(source, QUIET_AUTOSAVE).await;

    doc.set_background(Background::remote(url(A)));
    let state = doc.wait_for_fetch().await.expect("fetch");
    assert_eq!(state.status, FetchStatus::Failed(url(A)));
}

#[tokio::test]
async fn test_new_background_recovers_from_failure() {
    let source = ScriptedSource::new();
    source.status(A, 500);
    source.ok(B, png(1, 1));
    let (doc, _store) = open_seeded(source, QUIET_AUTOSAVE).await;

    doc.set_background(Background::remote(url(A)));
    doc.wait_for_fetch().await.expect("fetch");
    doc.set_background(Background::remote(url(B)));
    let state = doc.wait_for_fetch().await.expect("fetch");
    assert_eq!(state.status, FetchStatus::Idle);
    assert!(state.image.is_some());
}

// ============================================================================
// Local backgrounds
// ============================================================================

#[tokio::test]
async fn test_inline_background_resolves_immediately() {
    let (doc, _store) = open_seeded(ScriptedSource::new(), QUIET_AUTOSAVE).await;

    doc.set_background(Background::InlineData(png(4, 5)));
    doc.sync().await.expect("sync");
    let state = doc.state();
    assert_eq!(state.status, FetchStatus::Idle);
    let image = state.image.expect("image");
    assert_eq!((image.width, image.height), (4, 5));
}

#[tokio::test]
async fn test_invalid_inline_background_shows_nothing() {
    let (doc, _store) = open_seeded(ScriptedSource::new(), QUIET_AUTOSAVE).await;

    doc.set_background(Background::InlineData(vec![0, 1, 2, 3]));
    doc.sync().await.expect("sync");
    let state = doc.state();
    assert_eq!(state.status, FetchStatus::Idle);
    assert!(state.image.is_none());
    assert!(matches!(
        state.canvas.background(),
        Background::InlineData(_)
    ));
}

#[tokio::test]
async fn test_blank_background_cancels_fetch() {
    let source = ScriptedSource::new();
    let _gate = source.gated(A, png(3, 3));
    let (doc, _store) = open_seeded(source, QUIET_AUTOSAVE).await;

    doc.set_background(Background::remote(url(A)));
    doc.set_background(Background::Blank);
    let state = doc.wait_for_fetch().await.expect("fetch");
    assert_eq!(state.status, FetchStatus::Idle);
    assert!(state.image.is_none());
    assert!(state.canvas.background().is_blank());
}

// ============================================================================
// Loading
// ============================================================================

#[tokio::test]
async fn test_loaded_remote_background_is_fetched() {
    let source = ScriptedSource::new();
    source.ok(A, png(7, 7));
    let canvas = Canvas::seeded().set_background(Background::remote(url(A)));
    let store = MemoryStore::with_contents(canvas.to_json().expect("encode"));

    let doc = DocumentController::open_with(Arc::new(store), source, QUIET_AUTOSAVE).await;
    let state = doc.wait_for_fetch().await.expect("fetch");
    assert_eq!(state.image.map(|i| i.width), Some(7));
    assert_eq!(*state.canvas, canvas);
}
