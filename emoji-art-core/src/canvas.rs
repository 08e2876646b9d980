//! Canvas snapshots.
//!
//! A [`Canvas`] is an immutable value: every operation borrows the current
//! snapshot and returns the next one, leaving the original untouched.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{ArtError, ArtResult, Background, Element, ElementId};

/// One complete state of an emoji art document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Canvas {
    /// What sits underneath the elements.
    background: Background,
    /// Placed elements; later entries are drawn on top.
    elements: Vec<Element>,
}

impl Canvas {
    /// Create an empty canvas with a blank background.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The starting document: a 🦖 and a 🦕 over a blank background.
    #[must_use]
    pub fn seeded() -> Self {
        let seeds = [("🦖", -200, -100, 80), ("🦕", 50, 100, 40)];
        let elements = seeds
            .into_iter()
            .filter_map(|(text, x, y, size)| Element::new(text, x, y, size).ok())
            .collect();
        Self {
            background: Background::Blank,
            elements,
        }
    }

    /// The current background reference.
    #[must_use]
    pub fn background(&self) -> &Background {
        &self.background
    }

    /// All elements in z-order (bottom first).
    #[must_use]
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Get an element by ID.
    #[must_use]
    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == id)
    }

    /// Z-position of an element.
    #[must_use]
    pub fn index_of(&self, id: ElementId) -> Option<usize> {
        self.elements.iter().position(|e| e.id == id)
    }

    /// Get the number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Check if the canvas has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Append a new emoji on top of all others.
    ///
    /// # Errors
    ///
    /// Returns [`ArtError::InvalidInput`] if `text` is not a single emoji or
    /// `size <= 0`.
    pub fn add_element(&self, text: &str, at: (i32, i32), size: i64) -> ArtResult<Self> {
        let element = Element::new(text, at.0, at.1, size)?;
        let mut next = self.clone();
        next.elements.push(element);
        Ok(next)
    }

    /// Re-insert an existing element at a z-position (clamped to the end).
    ///
    /// # Errors
    ///
    /// Returns [`ArtError::InvalidInput`] if the element is invalid or its id
    /// is already present.
    pub fn insert_element(&self, element: Element, index: usize) -> ArtResult<Self> {
        element.validate()?;
        if self.element(element.id).is_some() {
            return Err(ArtError::InvalidInput(format!(
                "element {} already exists",
                element.id
            )));
        }
        let mut next = self.clone();
        let index = index.min(next.elements.len());
        next.elements.insert(index, element);
        Ok(next)
    }

    /// Remove an element.
    ///
    /// # Errors
    ///
    /// Returns [`ArtError::NotFound`] if the element is absent.
    pub fn remove_element(&self, id: ElementId) -> ArtResult<Self> {
        let index = self.index_of(id).ok_or(ArtError::NotFound(id))?;
        let mut next = self.clone();
        next.elements.remove(index);
        Ok(next)
    }

    /// Move an element by canvas-space deltas.
    ///
    /// # Errors
    ///
    /// Returns [`ArtError::NotFound`] if the element is absent.
    pub fn move_element(&self, id: ElementId, dx: i32, dy: i32) -> ArtResult<Self> {
        self.replace_element(id, |e| Ok(e.moved_by(dx, dy)))
    }

    /// Scale an element's size by `factor`.
    ///
    /// # Errors
    ///
    /// Returns [`ArtError::NotFound`] if the element is absent and
    /// [`ArtError::InvalidInput`] if `factor` is not positive.
    pub fn resize_element(&self, id: ElementId, factor: f64) -> ArtResult<Self> {
        self.replace_element(id, |e| e.scaled_by(factor))
    }

    /// Set an element's size directly.
    ///
    /// # Errors
    ///
    /// Returns [`ArtError::NotFound`] if the element is absent and
    /// [`ArtError::InvalidInput`] if `size` is zero.
    pub fn set_element_size(&self, id: ElementId, size: u32) -> ArtResult<Self> {
        if size == 0 {
            return Err(ArtError::InvalidInput("size must be positive, got 0".into()));
        }
        self.replace_element(id, |e| {
            Ok(Element {
                size,
                ..e.clone()
            })
        })
    }

    /// Replace the background.
    #[must_use]
    pub fn set_background(&self, background: Background) -> Self {
        Self {
            background,
            elements: self.elements.clone(),
        }
    }

    fn replace_element<F>(&self, id: ElementId, f: F) -> ArtResult<Self>
    where
        F: FnOnce(&Element) -> ArtResult<Element>,
    {
        let index = self.index_of(id).ok_or(ArtError::NotFound(id))?;
        let updated = f(&self.elements[index])?;
        let mut next = self.clone();
        next.elements[index] = updated;
        Ok(next)
    }

    /// Check snapshot invariants: unique ids, valid elements.
    ///
    /// # Errors
    ///
    /// Returns [`ArtError::CorruptData`] describing the first violation.
    pub fn validate(&self) -> ArtResult<()> {
        let mut seen = HashSet::with_capacity(self.elements.len());
        for element in &self.elements {
            if !seen.insert(element.id) {
                return Err(ArtError::CorruptData(format!(
                    "duplicate element id {}",
                    element.id
                )));
            }
            element
                .validate()
                .map_err(|e| ArtError::CorruptData(e.to_string()))?;
        }
        Ok(())
    }

    /// Serialize the canvas to pretty-printed JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> ArtResult<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Deserialize a canvas from JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ArtError::CorruptData`] if the bytes are not a valid canvas.
    pub fn from_json(bytes: &[u8]) -> ArtResult<Self> {
        let canvas: Self = serde_json::from_slice(bytes)?;
        canvas.validate()?;
        Ok(canvas)
    }
}
