//! # Emoji Art Document
//!
//! Runtime owner of an emoji art document.
//!
//! ## Architecture
//!
//! ```text
//!   intents ──► DocumentController ──► owner task ──► watch<DocumentState>
//!                                        │   ▲
//!                       set_reference    │   │ completions
//!                                        ▼   │
//!                                    FetchEngine ──► ImageSource
//!                                        │
//!                       debounce expiry  ▼
//!                                    writer task ──► SnapshotStore
//! ```
//!
//! The owner task is the only place the snapshot changes. Background
//! retrieval and writes run concurrently and report back to it, so a stale
//! fetch can never overwrite a newer background and writes land in order.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod document;
pub mod error;
pub mod fetch;
pub mod image;
pub mod persist;
pub mod source;

pub use config::DocumentConfig;
pub use document::{DocumentController, DocumentEvent, DocumentState};
pub use error::{DocumentError, FetchError, PersistError};
pub use fetch::{FetchCompletion, FetchEngine, FetchStatus};
pub use crate::image::{decode_image, BackgroundImage, ImageFormat};
pub use persist::{load_canvas, Debounce, FileStore, MemoryStore, SnapshotStore};
pub use source::{HttpImageSource, ImageSource};
