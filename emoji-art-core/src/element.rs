//! Canvas elements - the emoji placed on a document.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{emoji, ArtError, ArtResult};

/// Unique identifier for an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(Uuid);

impl ElementId {
    /// Create a new unique element ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from an existing UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// The underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ElementId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// An emoji placed on the canvas.
///
/// Coordinates are canvas space with the origin at the center of the
/// document. `size` is the nominal point size before zoom.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Element {
    /// Unique identifier.
    pub id: ElementId,
    /// A single emoji grapheme.
    pub text: String,
    /// Horizontal position.
    pub x: i32,
    /// Vertical position.
    pub y: i32,
    /// Nominal size, always positive.
    pub size: u32,
}

impl Element {
    /// Create a new element with a freshly minted id.
    ///
    /// # Errors
    ///
    /// Returns [`ArtError::InvalidInput`] if `text` is not a single emoji or
    /// `size` is not positive.
    pub fn new(text: &str, x: i32, y: i32, size: i64) -> ArtResult<Self> {
        let text = emoji::single_emoji(text)?.to_string();
        let size = checked_size(size)?;
        Ok(Self {
            id: ElementId::new(),
            text,
            x,
            y,
            size,
        })
    }

    /// Check the invariants a decoded or re-inserted element must hold.
    ///
    /// # Errors
    ///
    /// Returns [`ArtError::InvalidInput`] naming the violated invariant.
    pub fn validate(&self) -> ArtResult<()> {
        emoji::single_emoji(&self.text)?;
        if self.size == 0 {
            return Err(ArtError::InvalidInput(format!(
                "element {} has zero size",
                self.id
            )));
        }
        Ok(())
    }

    /// Return a copy moved by the given canvas-space deltas.
    #[must_use]
    pub fn moved_by(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
            ..self.clone()
        }
    }

    /// Return a copy scaled by `factor`, rounded half away from zero and
    /// clamped to at least 1.
    ///
    /// # Errors
    ///
    /// Returns [`ArtError::InvalidInput`] if `factor` is not a positive finite number.
    pub fn scaled_by(&self, factor: f64) -> ArtResult<Self> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(ArtError::InvalidInput(format!(
                "scale factor must be positive, got {factor}"
            )));
        }
        let scaled = (f64::from(self.size) * factor).round();
        // Clamped into u32 range before the cast.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let size = scaled.clamp(1.0, f64::from(u32::MAX)) as u32;
        Ok(Self {
            size,
            ..self.clone()
        })
    }
}

/// Convert a caller-supplied size into a positive `u32`.
///
/// # Errors
///
/// Returns [`ArtError::InvalidInput`] if `size <= 0` or it does not fit.
pub fn checked_size(size: i64) -> ArtResult<u32> {
    match u32::try_from(size) {
        Ok(s) if s > 0 => Ok(s),
        _ => Err(ArtError::InvalidInput(format!(
            "size must be positive, got {size}"
        ))),
    }
}
