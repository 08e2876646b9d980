//! Shared helpers for document controller integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use emoji_art_document::{
    DocumentController, DocumentEvent, FetchError, ImageSource, MemoryStore,
};
use tokio::sync::{broadcast, Notify};
use url::Url;

/// Long enough that auto-save never fires during a real-time test.
pub const QUIET_AUTOSAVE: Duration = Duration::from_secs(600);

#[derive(Clone)]
struct Route {
    gate: Option<Arc<Notify>>,
    response: Result<Vec<u8>, u16>,
}

/// Image source answering from a fixed table, optionally holding a response
/// until the test releases it.
#[derive(Default)]
pub struct ScriptedSource {
    routes: Mutex<HashMap<String, Route>>,
}

impl ScriptedSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Answer `url` with `bytes`.
    pub fn ok(&self, url: &str, bytes: Vec<u8>) {
        self.route(url, None, Ok(bytes));
    }

    /// Answer `url` with an HTTP error status.
    pub fn status(&self, url: &str, status: u16) {
        self.route(url, None, Err(status));
    }

    /// Answer `url` with `bytes` once the returned gate is notified.
    pub fn gated(&self, url: &str, bytes: Vec<u8>) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.route(url, Some(Arc::clone(&gate)), Ok(bytes));
        gate
    }

    fn route(&self, url: &str, gate: Option<Arc<Notify>>, response: Result<Vec<u8>, u16>) {
        self.routes
            .lock()
            .expect("routes")
            .insert(url.to_string(), Route { gate, response });
    }
}

#[async_trait]
impl ImageSource for ScriptedSource {
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        let route = self.routes.lock().expect("routes").get(url.as_str()).cloned();
        let Some(route) = route else {
            return Err(FetchError::Status {
                url: url.clone(),
                status: 404,
            });
        };
        if let Some(gate) = route.gate {
            gate.notified().await;
        }
        route.response.map_err(|status| FetchError::Status {
            url: url.clone(),
            status,
        })
    }
}

/// Encode a blank PNG of the given dimensions.
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let mut out = std::io::Cursor::new(Vec::new());
    image::RgbaImage::new(width, height)
        .write_to(&mut out, image::ImageFormat::Png)
        .expect("encode png");
    out.into_inner()
}

pub fn url(s: &str) -> Url {
    Url::parse(s).expect("url")
}

/// Open a seeded document backed by a fresh in-memory store.
pub async fn open_seeded(
    source: Arc<ScriptedSource>,
    autosave: Duration,
) -> (DocumentController, MemoryStore) {
    let store = MemoryStore::new();
    let controller =
        DocumentController::open_with(Arc::new(store.clone()), source, autosave).await;
    (controller, store)
}

/// Drain every event currently queued on `rx`.
pub fn drain(rx: &mut broadcast::Receiver<DocumentEvent>) -> Vec<DocumentEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
