//! Snapshot persistence and the auto-save debounce.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use emoji_art_core::Canvas;
use tokio::time::Instant;

use crate::{DocumentConfig, PersistError};

/// Where serialized snapshots are read from and written to.
#[async_trait]
pub trait SnapshotStore: Send + Sync + 'static {
    /// Read the stored snapshot bytes, or `None` if nothing was stored yet.
    ///
    /// # Errors
    ///
    /// Returns a [`PersistError`] if the store exists but cannot be read.
    async fn load(&self) -> Result<Option<Vec<u8>>, PersistError>;

    /// Replace the stored snapshot.
    ///
    /// # Errors
    ///
    /// Returns a [`PersistError`] if the write fails.
    async fn save(&self, bytes: Vec<u8>) -> Result<(), PersistError>;

    /// Human-readable location for logs.
    fn location(&self) -> String;
}

/// Stores the document as a single JSON file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Store at an explicit path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the configured document path.
    #[must_use]
    pub fn from_config(config: &DocumentConfig) -> Self {
        Self::new(config.document_path())
    }

    /// Path of the document file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl SnapshotStore for FileStore {
    async fn load(&self) -> Result<Option<Vec<u8>>, PersistError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, bytes: Vec<u8>) -> Result<(), PersistError> {
        if let Some(dir) = self.path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        // Write aside and rename so a crash never leaves a torn document.
        let temp = self.temp_path();
        tokio::fs::write(&temp, bytes).await?;
        tokio::fs::rename(&temp, &self.path).await?;
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

#[derive(Debug, Default)]
struct MemoryInner {
    current: Option<Vec<u8>>,
    writes: Vec<Vec<u8>>,
    reject_writes: bool,
}

/// In-memory store that records every write.
///
/// Cloned handles share the same contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<MemoryInner>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `bytes`.
    #[must_use]
    pub fn with_contents(bytes: Vec<u8>) -> Self {
        let store = Self::new();
        store.write_inner().current = Some(bytes);
        store
    }

    /// Make subsequent writes fail (or succeed again).
    pub fn set_reject_writes(&self, reject: bool) {
        self.write_inner().reject_writes = reject;
    }

    /// Current stored bytes.
    #[must_use]
    pub fn contents(&self) -> Option<Vec<u8>> {
        self.read_inner().current.clone()
    }

    /// Every successful write, oldest first.
    #[must_use]
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.read_inner().writes.clone()
    }

    fn read_inner(&self) -> std::sync::RwLockReadGuard<'_, MemoryInner> {
        self.inner
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn write_inner(&self) -> std::sync::RwLockWriteGuard<'_, MemoryInner> {
        self.inner
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn load(&self) -> Result<Option<Vec<u8>>, PersistError> {
        Ok(self.contents())
    }

    async fn save(&self, bytes: Vec<u8>) -> Result<(), PersistError> {
        let mut inner = self.write_inner();
        if inner.reject_writes {
            return Err(PersistError::Rejected("memory store is read-only".into()));
        }
        inner.current = Some(bytes.clone());
        inner.writes.push(bytes);
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}

/// Load the stored canvas, falling back to the seeded default when nothing
/// is stored or the stored data cannot be used.
pub async fn load_canvas(store: &dyn SnapshotStore) -> Canvas {
    match store.load().await {
        Ok(Some(bytes)) => match Canvas::from_json(&bytes) {
            Ok(canvas) => {
                tracing::info!(
                    "Loaded document from {} ({} elements)",
                    store.location(),
                    canvas.len()
                );
                canvas
            }
            Err(e) => {
                tracing::warn!(
                    "Stored document at {} is unusable, starting fresh: {e}",
                    store.location()
                );
                Canvas::seeded()
            }
        },
        Ok(None) => {
            tracing::info!("No document at {}, starting fresh", store.location());
            Canvas::seeded()
        }
        Err(e) => {
            tracing::warn!(
                "Failed to read document at {}, starting fresh: {e}",
                store.location()
            );
            Canvas::seeded()
        }
    }
}

/// Serialize a canvas for storage.
///
/// # Errors
///
/// Returns [`PersistError::Serialize`] if encoding fails.
pub fn encode_canvas(canvas: &Canvas) -> Result<Vec<u8>, PersistError> {
    Ok(canvas.to_json()?)
}

/// Single-shot, restartable coalescing timer.
#[derive(Debug, Clone)]
pub struct Debounce {
    interval: Duration,
    deadline: Option<Instant>,
}

impl Debounce {
    /// Create a disarmed timer.
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            deadline: None,
        }
    }

    /// Coalescing interval.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Arm (or re-arm) the timer a full interval from now.
    pub fn restart(&mut self) {
        self.deadline = Some(Instant::now() + self.interval);
    }

    /// Disarm the timer. Returns `true` if it was armed.
    pub fn cancel(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    /// Check if the timer is armed.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// When the timer fires, if armed.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
}

/// Resolve when `deadline` passes; never resolves for `None`.
pub async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileStore::new(dir.path().join("nested").join("doc.json"));
        assert!(store.load().await.expect("load").is_none());

        store.save(b"{}".to_vec()).await.expect("save");
        assert_eq!(store.load().await.expect("load"), Some(b"{}".to_vec()));
        assert!(!store.temp_path().exists());
    }

    #[tokio::test]
    async fn test_load_canvas_falls_back_on_corruption() {
        let store = MemoryStore::with_contents(b"not json".to_vec());
        assert_eq!(load_canvas(&store).await.len(), 2);

        let empty = MemoryStore::new();
        assert_eq!(load_canvas(&empty).await.len(), 2);
    }

    #[tokio::test]
    async fn test_load_canvas_reads_stored_document() {
        let canvas = Canvas::new().add_element("🌵", (1, 2), 30).expect("add");
        let store = MemoryStore::with_contents(encode_canvas(&canvas).expect("encode"));
        assert_eq!(load_canvas(&store).await, canvas);
    }

    #[tokio::test]
    async fn test_memory_store_rejects_when_asked() {
        let store = MemoryStore::new();
        store.set_reject_writes(true);
        assert!(matches!(
            store.save(vec![1]).await,
            Err(PersistError::Rejected(_))
        ));
        store.set_reject_writes(false);
        store.save(vec![2]).await.expect("save");
        assert_eq!(store.writes(), vec![vec![2]]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_restart_pushes_deadline() {
        let mut debounce = Debounce::new(Duration::from_secs(5));
        assert!(!debounce.is_armed());

        debounce.restart();
        let first = debounce.deadline().expect("armed");
        tokio::time::advance(Duration::from_secs(3)).await;
        debounce.restart();
        let second = debounce.deadline().expect("armed");
        assert_eq!(second - first, Duration::from_secs(3));

        assert!(debounce.cancel());
        assert!(!debounce.cancel());
    }
}
