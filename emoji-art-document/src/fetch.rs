//! Background fetch engine.
//!
//! Resolves the document's background reference into a decoded image.
//! Every reference change bumps a generation counter; a completion only
//! publishes if it carries the current generation, so the outcome of a
//! superseded fetch is never observable even if its task outlives the abort.

use std::sync::Arc;

use emoji_art_core::Background;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use url::Url;

use crate::image::{decode_image, BackgroundImage};
use crate::{FetchError, ImageSource};

/// Progress of the background image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "url", rename_all = "lowercase")]
pub enum FetchStatus {
    /// Nothing is being retrieved.
    #[default]
    Idle,
    /// A remote image is being retrieved.
    Fetching,
    /// Retrieval or decoding of the URL failed.
    Failed(Url),
}

/// Outcome of one retrieval, sent back to the engine's owner.
#[derive(Debug)]
pub struct FetchCompletion {
    generation: u64,
    url: Url,
    result: Result<BackgroundImage, FetchError>,
}

/// State machine owning the published background image and status.
pub struct FetchEngine {
    source: Arc<dyn ImageSource>,
    completions: mpsc::UnboundedSender<FetchCompletion>,
    generation: u64,
    status: FetchStatus,
    image: Option<Arc<BackgroundImage>>,
    in_flight: Option<JoinHandle<()>>,
}

impl FetchEngine {
    /// Create an idle engine. Completions of spawned fetches are delivered to
    /// `completions` and must be handed back through [`FetchEngine::complete`].
    #[must_use]
    pub fn new(
        source: Arc<dyn ImageSource>,
        completions: mpsc::UnboundedSender<FetchCompletion>,
    ) -> Self {
        Self {
            source,
            completions,
            generation: 0,
            status: FetchStatus::Idle,
            image: None,
            in_flight: None,
        }
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> &FetchStatus {
        &self.status
    }

    /// Current decoded image, if any.
    #[must_use]
    pub fn image(&self) -> Option<&Arc<BackgroundImage>> {
        self.image.as_ref()
    }

    /// Generation of the most recent reference.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Switch to a new background reference.
    ///
    /// Cancels any in-flight fetch. Blank and inline references resolve
    /// immediately; remote references move to [`FetchStatus::Fetching`] and
    /// spawn a retrieval on the current Tokio runtime.
    pub fn set_reference(&mut self, background: &Background) {
        self.cancel_in_flight();
        self.generation += 1;
        self.image = None;

        match background {
            Background::Blank => {
                self.status = FetchStatus::Idle;
            }
            Background::InlineData(bytes) => {
                self.status = FetchStatus::Idle;
                match decode_image(bytes) {
                    Ok(image) => self.image = Some(Arc::new(image)),
                    Err(e) => tracing::debug!("Ignoring undecodable inline background: {e}"),
                }
            }
            Background::RemoteUrl(url) => {
                self.status = FetchStatus::Fetching;
                self.in_flight = Some(self.spawn_fetch(url.clone()));
            }
        }
    }

    fn spawn_fetch(&self, url: Url) -> JoinHandle<()> {
        let generation = self.generation;
        let source = Arc::clone(&self.source);
        let completions = self.completions.clone();
        tracing::debug!("Fetching background {url} (generation {generation})");

        tokio::spawn(async move {
            let result = match source.fetch(&url).await {
                Ok(bytes) => tokio::task::spawn_blocking(move || decode_image(&bytes))
                    .await
                    .unwrap_or_else(|e| Err(FetchError::Decode(e.to_string()))),
                Err(e) => Err(e),
            };
            // The owner may have shut down; nothing left to publish to.
            let _ = completions.send(FetchCompletion {
                generation,
                url,
                result,
            });
        })
    }

    /// Apply a finished retrieval. Returns `true` if the published image or
    /// status changed; stale completions are discarded and return `false`.
    pub fn complete(&mut self, completion: FetchCompletion) -> bool {
        if completion.generation != self.generation {
            tracing::debug!(
                "Discarding stale background fetch of {} (generation {}, current {})",
                completion.url,
                completion.generation,
                self.generation
            );
            return false;
        }

        self.in_flight = None;
        match completion.result {
            Ok(image) => {
                tracing::info!(
                    "Background {} loaded ({}x{})",
                    completion.url,
                    image.width,
                    image.height
                );
                self.status = FetchStatus::Idle;
                self.image = Some(Arc::new(image));
            }
            Err(e) => {
                tracing::warn!("Background fetch of {} failed: {e}", completion.url);
                self.status = FetchStatus::Failed(completion.url);
                self.image = None;
            }
        }
        true
    }

    fn cancel_in_flight(&mut self) {
        if let Some(task) = self.in_flight.take() {
            task.abort();
        }
    }
}

impl Drop for FetchEngine {
    fn drop(&mut self) {
        self.cancel_in_flight();
    }
}

impl std::fmt::Debug for FetchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchEngine")
            .field("generation", &self.generation)
            .field("status", &self.status)
            .field("image", &self.image)
            .field("in_flight", &self.in_flight.is_some())
            .finish_non_exhaustive()
    }
}
