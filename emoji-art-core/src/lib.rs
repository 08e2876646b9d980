//! # Emoji Art Core
//!
//! Document model for an emoji drawing canvas.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               emoji-art-core                │
//! ├─────────────────────────────────────────────┤
//! │  Canvas Model    │  Coordinate Transform    │
//! │  - Elements      │  - Canvas <-> view       │
//! │  - Background    │  - Pan / zoom state      │
//! │  - JSON codec    │  - Zoom to fit           │
//! ├─────────────────────────────────────────────┤
//! │  Mutations       │  Palettes                │
//! │  - Undo inverses │  - Deduplicated emoji    │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Every operation on [`Canvas`] is pure: it borrows the current snapshot and
//! returns the next one, so an owner can replace its snapshot wholesale.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod background;
pub mod canvas;
pub mod command;
pub mod element;
pub mod emoji;
pub mod error;
pub mod palette;
pub mod transform;

pub use background::{Background, DropAction, DropPayload};
pub use canvas::Canvas;
pub use command::Mutation;
pub use element::{Element, ElementId};
pub use error::{ArtError, ArtResult};
pub use palette::{Palette, PaletteStore};
pub use transform::{Point, Size, Vector, ViewTransform, Viewport};

/// Core crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
