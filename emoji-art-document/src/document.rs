//! Document controller.
//!
//! A single owner task holds the current [`Canvas`] snapshot, the background
//! [`FetchEngine`] and the auto-save timer. Callers talk to it through a
//! cloneable [`DocumentController`]: intents are queued without waiting, and
//! every change is republished on a `watch` channel as a [`DocumentState`].
//! Fetches and writes run as separate tasks whose completions are sent back
//! to the owner before they touch published state.

use std::sync::Arc;
use std::time::Duration;

use emoji_art_core::{Background, Canvas, ElementId, Mutation};
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use url::Url;

use crate::fetch::{FetchCompletion, FetchEngine, FetchStatus};
use crate::image::BackgroundImage;
use crate::persist::{
    encode_canvas, load_canvas, sleep_until_deadline, Debounce, FileStore, SnapshotStore,
};
use crate::{DocumentConfig, DocumentError, FetchError, HttpImageSource, ImageSource, PersistError};

/// Capacity of the event broadcast channel.
const EVENT_CHANNEL_CAPACITY: usize = 100;

/// Everything an observer needs to present the document.
#[derive(Debug, Clone)]
pub struct DocumentState {
    /// Current snapshot.
    pub canvas: Arc<Canvas>,
    /// Decoded background image, if one is available.
    pub image: Option<Arc<BackgroundImage>>,
    /// Background retrieval status.
    pub status: FetchStatus,
    /// Increments on every publication.
    pub revision: u64,
}

/// Notifications that are not part of the published state.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentEvent {
    /// An intent changed the document; `inverse` undoes it.
    Applied {
        /// Mutation restoring the previous snapshot.
        inverse: Mutation,
    },
    /// The document was written.
    Saved {
        /// State revision that was written.
        revision: u64,
        /// Encoded size.
        bytes: usize,
    },
    /// Writing the document failed. The in-memory snapshot is unaffected.
    SaveFailed {
        /// State revision that failed to write.
        revision: u64,
        /// Error description.
        error: String,
    },
    /// The background image at `url` could not be loaded.
    BackgroundFetchFailed {
        /// URL that failed.
        url: Url,
    },
}

enum Command {
    Apply(Mutation),
    Sync(oneshot::Sender<()>),
    Flush(oneshot::Sender<Result<bool, PersistError>>),
    Shutdown(oneshot::Sender<()>),
}

type SaveReply = oneshot::Sender<Result<bool, PersistError>>;

/// A write for the writer task. `bytes: None` is a barrier that only
/// acknowledges once earlier writes finished.
struct SaveRequest {
    revision: u64,
    bytes: Option<Vec<u8>>,
    reply: Option<SaveReply>,
}

struct SaveOutcome {
    revision: u64,
    bytes: usize,
    result: Result<(), String>,
}

/// Handle to a running document.
#[derive(Debug, Clone)]
pub struct DocumentController {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<DocumentState>,
    events: broadcast::Sender<DocumentEvent>,
}

impl DocumentController {
    /// Open the document described by `config`: read it from its file,
    /// fetch backgrounds over HTTP, auto-save back to the same file.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the HTTP client cannot be built.
    pub async fn open(config: &DocumentConfig) -> Result<Self, FetchError> {
        let source = HttpImageSource::new(config)?;
        Ok(Self::open_with(
            Arc::new(FileStore::from_config(config)),
            Arc::new(source),
            config.autosave_interval,
        )
        .await)
    }

    /// Open a document with explicit collaborators.
    ///
    /// Missing or unusable stored data starts a seeded document.
    pub async fn open_with(
        store: Arc<dyn SnapshotStore>,
        source: Arc<dyn ImageSource>,
        autosave_interval: Duration,
    ) -> Self {
        let canvas = load_canvas(store.as_ref()).await;
        Self::spawn(canvas, store, source, autosave_interval)
    }

    /// Start the owner task for `canvas` on the current Tokio runtime.
    #[must_use]
    pub fn spawn(
        canvas: Canvas,
        store: Arc<dyn SnapshotStore>,
        source: Arc<dyn ImageSource>,
        autosave_interval: Duration,
    ) -> Self {
        let (fetch_tx, fetch_rx) = mpsc::unbounded_channel();
        let mut fetch = FetchEngine::new(source, fetch_tx);
        if !canvas.background().is_blank() {
            fetch.set_reference(canvas.background());
        }

        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        let (saves, writer) = spawn_writer(store, outcome_tx);

        let canvas = Arc::new(canvas);
        let (state_tx, state_rx) = watch::channel(DocumentState {
            canvas: Arc::clone(&canvas),
            image: fetch.image().cloned(),
            status: fetch.status().clone(),
            revision: 0,
        });
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (commands, command_rx) = mpsc::unbounded_channel();

        let task = ControllerTask {
            canvas,
            fetch,
            autosave: Debounce::new(autosave_interval),
            revision: 0,
            state_tx,
            events: events.clone(),
            saves: Some(saves),
            writer: Some(writer),
        };
        tokio::spawn(task.run(command_rx, fetch_rx, outcome_rx));

        Self {
            commands,
            state: state_rx,
            events,
        }
    }

    /// Place an emoji. Invalid input is ignored.
    pub fn add_emoji(&self, text: &str, at: (i32, i32), size: i64) {
        self.apply(Mutation::Add {
            text: text.to_string(),
            at,
            size,
        });
    }

    /// Move an element by canvas-space deltas. Unknown ids are ignored.
    pub fn move_emoji(&self, id: ElementId, dx: i32, dy: i32) {
        self.apply(Mutation::Move { id, dx, dy });
    }

    /// Scale an element. Unknown ids and non-positive factors are ignored.
    pub fn scale_emoji(&self, id: ElementId, factor: f64) {
        self.apply(Mutation::Resize { id, factor });
    }

    /// Replace the background.
    pub fn set_background(&self, background: Background) {
        self.apply(Mutation::SetBackground { background });
    }

    /// Queue any mutation.
    ///
    /// Mutations that fail against the current snapshot are dropped without
    /// notifying observers; UI callers validate before calling.
    pub fn apply(&self, mutation: Mutation) {
        if self.commands.send(Command::Apply(mutation)).is_err() {
            tracing::debug!("Document controller closed, dropping intent");
        }
    }

    /// Latest published state.
    #[must_use]
    pub fn state(&self) -> DocumentState {
        self.state.borrow().clone()
    }

    /// Latest published snapshot.
    #[must_use]
    pub fn canvas(&self) -> Arc<Canvas> {
        Arc::clone(&self.state.borrow().canvas)
    }

    /// Receiver notified on every published change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<DocumentState> {
        self.state.clone()
    }

    /// Receiver for [`DocumentEvent`]s emitted from now on.
    #[must_use]
    pub fn events(&self) -> broadcast::Receiver<DocumentEvent> {
        self.events.subscribe()
    }

    /// Resolve once every intent queued before this call has been processed.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Closed`] if the controller has stopped.
    pub async fn sync(&self) -> Result<(), DocumentError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(Command::Sync(tx))
            .map_err(|_| DocumentError::Closed)?;
        rx.await.map_err(|_| DocumentError::Closed)
    }

    /// Resolve with the first state, after all queued intents, whose
    /// background status is not [`FetchStatus::Fetching`].
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Closed`] if the controller stops first.
    pub async fn wait_for_fetch(&self) -> Result<DocumentState, DocumentError> {
        self.sync().await?;
        let mut rx = self.state.clone();
        let state = rx
            .wait_for(|s| s.status != FetchStatus::Fetching)
            .await
            .map_err(|_| DocumentError::Closed)?
            .clone();
        Ok(state)
    }

    /// Write pending changes now instead of waiting for the auto-save.
    ///
    /// Returns `true` if a write happened, `false` if nothing was pending.
    /// Either way, earlier writes have completed when this resolves.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Persist`] if the write fails and
    /// [`DocumentError::Closed`] if the controller has stopped.
    pub async fn flush(&self) -> Result<bool, DocumentError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(Command::Flush(tx))
            .map_err(|_| DocumentError::Closed)?;
        Ok(rx.await.map_err(|_| DocumentError::Closed)??)
    }

    /// Write pending changes and stop the owner task.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Closed`] if the controller already stopped.
    pub async fn shutdown(&self) -> Result<(), DocumentError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(Command::Shutdown(tx))
            .map_err(|_| DocumentError::Closed)?;
        rx.await.map_err(|_| DocumentError::Closed)
    }
}

/// Run writes one at a time, in request order, reporting each outcome.
fn spawn_writer(
    store: Arc<dyn SnapshotStore>,
    outcomes: mpsc::UnboundedSender<SaveOutcome>,
) -> (mpsc::UnboundedSender<SaveRequest>, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<SaveRequest>();
    let writer = tokio::spawn(async move {
        while let Some(SaveRequest {
            revision,
            bytes,
            reply,
        }) = rx.recv().await
        {
            let result = match bytes {
                None => Ok(false),
                Some(bytes) => {
                    let len = bytes.len();
                    let result = store.save(bytes).await;
                    match &result {
                        Ok(()) => tracing::debug!(
                            "Saved revision {revision} to {} ({len} bytes)",
                            store.location()
                        ),
                        Err(e) => tracing::warn!(
                            "Failed to save revision {revision} to {}: {e}",
                            store.location()
                        ),
                    }
                    // The owner may already be gone during shutdown.
                    let _ = outcomes.send(SaveOutcome {
                        revision,
                        bytes: len,
                        result: result.as_ref().map(|_| ()).map_err(ToString::to_string),
                    });
                    result.map(|()| true)
                }
            };
            if let Some(reply) = reply {
                let _ = reply.send(result);
            }
        }
    });
    (tx, writer)
}

struct ControllerTask {
    canvas: Arc<Canvas>,
    fetch: FetchEngine,
    autosave: Debounce,
    revision: u64,
    state_tx: watch::Sender<DocumentState>,
    events: broadcast::Sender<DocumentEvent>,
    saves: Option<mpsc::UnboundedSender<SaveRequest>>,
    writer: Option<JoinHandle<()>>,
}

impl ControllerTask {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut fetches: mpsc::UnboundedReceiver<FetchCompletion>,
        mut outcomes: mpsc::UnboundedReceiver<SaveOutcome>,
    ) {
        tracing::debug!(
            "Document controller started (autosave every {:?})",
            self.autosave.interval()
        );
        loop {
            let deadline = self.autosave.deadline();
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Apply(mutation)) => self.apply(mutation),
                    Some(Command::Sync(reply)) => {
                        let _ = reply.send(());
                    }
                    Some(Command::Flush(reply)) => self.flush(reply),
                    Some(Command::Shutdown(reply)) => {
                        self.close().await;
                        let _ = reply.send(());
                        return;
                    }
                    None => {
                        self.close().await;
                        return;
                    }
                },
                Some(completion) = fetches.recv() => self.on_fetch_complete(completion),
                Some(outcome) = outcomes.recv() => self.on_save_outcome(outcome),
                () = sleep_until_deadline(deadline) => {
                    self.autosave.cancel();
                    self.request_save(None);
                }
            }
        }
    }

    fn apply(&mut self, mutation: Mutation) {
        let (next, inverse) = match mutation.apply(&self.canvas) {
            Ok(applied) => applied,
            Err(e) => {
                tracing::debug!("Dropping intent: {e}");
                return;
            }
        };

        let background_changed = next.background() != self.canvas.background();
        self.canvas = Arc::new(next);
        if background_changed {
            tracing::debug!("Background set to {}", self.canvas.background());
            self.fetch.set_reference(self.canvas.background());
        }
        self.autosave.restart();
        self.publish();
        let _ = self.events.send(DocumentEvent::Applied { inverse });
    }

    fn on_fetch_complete(&mut self, completion: FetchCompletion) {
        if !self.fetch.complete(completion) {
            return;
        }
        if let FetchStatus::Failed(url) = self.fetch.status() {
            let _ = self
                .events
                .send(DocumentEvent::BackgroundFetchFailed { url: url.clone() });
        }
        self.publish();
    }

    fn on_save_outcome(&self, outcome: SaveOutcome) {
        let event = match outcome.result {
            Ok(()) => DocumentEvent::Saved {
                revision: outcome.revision,
                bytes: outcome.bytes,
            },
            Err(error) => DocumentEvent::SaveFailed {
                revision: outcome.revision,
                error,
            },
        };
        let _ = self.events.send(event);
    }

    fn flush(&mut self, reply: SaveReply) {
        if self.autosave.cancel() {
            self.request_save(Some(reply));
        } else {
            self.send_save(SaveRequest {
                revision: self.revision,
                bytes: None,
                reply: Some(reply),
            });
        }
    }

    fn request_save(&mut self, reply: Option<SaveReply>) {
        match encode_canvas(&self.canvas) {
            Ok(bytes) => self.send_save(SaveRequest {
                revision: self.revision,
                bytes: Some(bytes),
                reply,
            }),
            Err(e) => {
                tracing::warn!("Failed to encode revision {}: {e}", self.revision);
                let _ = self.events.send(DocumentEvent::SaveFailed {
                    revision: self.revision,
                    error: e.to_string(),
                });
                if let Some(reply) = reply {
                    let _ = reply.send(Err(e));
                }
            }
        }
    }

    fn send_save(&self, request: SaveRequest) {
        let Some(saves) = &self.saves else {
            return;
        };
        if let Err(mpsc::error::SendError(request)) = saves.send(request) {
            tracing::warn!("Document writer stopped, dropping save");
            if let Some(reply) = request.reply {
                let _ = reply.send(Err(PersistError::Rejected("writer stopped".into())));
            }
        }
    }

    async fn close(&mut self) {
        if self.autosave.cancel() {
            self.request_save(None);
        }
        // Dropping the sender lets the writer drain and exit.
        self.saves = None;
        if let Some(writer) = self.writer.take() {
            if let Err(e) = writer.await {
                tracing::warn!("Document writer ended abnormally: {e}");
            }
        }
        tracing::debug!("Document controller stopped at revision {}", self.revision);
    }

    fn publish(&mut self) {
        self.revision += 1;
        self.state_tx.send_replace(DocumentState {
            canvas: Arc::clone(&self.canvas),
            image: self.fetch.image().cloned(),
            status: self.fetch.status().clone(),
            revision: self.revision,
        });
    }
}
