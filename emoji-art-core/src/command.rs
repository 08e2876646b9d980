//! Mutation commands with undo inverses.
//!
//! Applying a [`Mutation`] to a snapshot yields the next snapshot together
//! with the mutation that turns it back into the original. Callers that want
//! undo keep the inverses; the core itself keeps no history.

use serde::{Deserialize, Serialize};

use crate::{ArtError, ArtResult, Background, Canvas, Element, ElementId};

/// A single edit to a canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Mutation {
    /// Place a new emoji on top.
    Add {
        /// Emoji grapheme.
        text: String,
        /// Canvas-space position.
        at: (i32, i32),
        /// Nominal size.
        size: i64,
    },
    /// Re-insert a known element at a z-position.
    Insert {
        /// The element, including its id.
        element: Element,
        /// Z-position.
        index: usize,
    },
    /// Remove an element.
    Remove {
        /// Element to remove.
        id: ElementId,
    },
    /// Move an element by canvas-space deltas.
    Move {
        /// Element to move.
        id: ElementId,
        /// Horizontal delta.
        dx: i32,
        /// Vertical delta.
        dy: i32,
    },
    /// Scale an element's size.
    Resize {
        /// Element to resize.
        id: ElementId,
        /// Positive scale factor.
        factor: f64,
    },
    /// Set an element's size.
    SetSize {
        /// Element to resize.
        id: ElementId,
        /// New size.
        size: u32,
    },
    /// Replace the background.
    SetBackground {
        /// New background reference.
        background: Background,
    },
}

impl Mutation {
    /// Apply to `canvas`, returning the next snapshot and the inverse mutation.
    ///
    /// # Errors
    ///
    /// Propagates the [`ArtError`] of the underlying canvas operation; the
    /// input snapshot is never modified.
    pub fn apply(&self, canvas: &Canvas) -> ArtResult<(Canvas, Mutation)> {
        match self {
            Self::Add { text, at, size } => {
                let next = canvas.add_element(text, *at, *size)?;
                let id = next
                    .elements()
                    .last()
                    .map(|e| e.id)
                    .ok_or_else(|| ArtError::InvalidInput("add produced no element".into()))?;
                Ok((next, Self::Remove { id }))
            }
            Self::Insert { element, index } => {
                let next = canvas.insert_element(element.clone(), *index)?;
                Ok((next, Self::Remove { id: element.id }))
            }
            Self::Remove { id } => {
                let index = canvas.index_of(*id).ok_or(ArtError::NotFound(*id))?;
                let element = canvas.elements()[index].clone();
                let next = canvas.remove_element(*id)?;
                Ok((next, Self::Insert { element, index }))
            }
            Self::Move { id, dx, dy } => {
                let next = canvas.move_element(*id, *dx, *dy)?;
                let inverse = Self::Move {
                    id: *id,
                    dx: dx.saturating_neg(),
                    dy: dy.saturating_neg(),
                };
                Ok((next, inverse))
            }
            Self::Resize { id, factor } => {
                let old = size_of(canvas, *id)?;
                let next = canvas.resize_element(*id, *factor)?;
                Ok((next, Self::SetSize { id: *id, size: old }))
            }
            Self::SetSize { id, size } => {
                let old = size_of(canvas, *id)?;
                let next = canvas.set_element_size(*id, *size)?;
                Ok((next, Self::SetSize { id: *id, size: old }))
            }
            Self::SetBackground { background } => {
                let inverse = Self::SetBackground {
                    background: canvas.background().clone(),
                };
                Ok((canvas.set_background(background.clone()), inverse))
            }
        }
    }

    /// Element the mutation targets, if any.
    #[must_use]
    pub fn target(&self) -> Option<ElementId> {
        match self {
            Self::Add { .. } | Self::SetBackground { .. } => None,
            Self::Insert { element, .. } => Some(element.id),
            Self::Remove { id }
            | Self::Move { id, .. }
            | Self::Resize { id, .. }
            | Self::SetSize { id, .. } => Some(*id),
        }
    }
}

fn size_of(canvas: &Canvas, id: ElementId) -> ArtResult<u32> {
    canvas
        .element(id)
        .map(|e| e.size)
        .ok_or(ArtError::NotFound(id))
}
