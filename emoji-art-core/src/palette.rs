//! Emoji palettes offered to the user when placing elements.

use serde::{Deserialize, Serialize};

use crate::{emoji, ArtResult};

/// A named set of emoji.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Palette {
    /// Identifier, unique within its store.
    pub id: u32,
    /// Display name.
    pub name: String,
    /// Emoji graphemes without repeats.
    pub emojis: String,
}

const DEFAULT_PALETTES: &[(&str, &str)] = &[
    ("Vehicles", "🚙🚗🚘🚕🚖🏎🚚🛻🚛🚐🚓🚔🚑🚒🚀✈️🛫🛬🛩🚁🛸🚲🏍🛶⛵️🚤🛥🛳⛴🚢🚂🚝🚅🚆🚊🚉🚇🛺🚜"),
    ("Sports", "🏈⚾️🏀⚽️🎾🏐🥏🏓⛳️🥅🥌🏂⛷🎳"),
    ("Music", "🎼🎤🎹🪘🥁🎺🪗🪕🎻"),
    ("Animals", "🐥🐣🐂🐄🐎🐖🐏🐑🦙🐐🐓🐁🐀🐒🦆🦅🦉🦇🐢🐍🦎🦖🦕🐅🐆🦓🦍🦧🦣🐘🦛🦏🐪🐫🦒🦘🦬🐃🦌🐕🐩🦮🐈🦤🦢🦩🕊🦝🦨🦡🦫🦦🦥🐿🦔"),
    ("Animal Faces", "🐵🙈🙊🙉🐶🐱🐭🐹🐰🦊🐻🐼🐻‍❄️🐨🐯🦁🐮🐷🐸🐲"),
    ("Flora", "🌲🌴🌿☘️🍀🍁🍄🌾💐🌷🌹🥀🌺🌸🌼🌻"),
    ("Weather", "☀️🌤⛅️🌥☁️🌦🌧⛈🌩🌨❄️💨☔️💧💦🌊☂️🌫🌪"),
    ("Faces", "😀😃😄😁😆😅😂🤣🥲☺️😊😇🙂🙃😉😌😍🥰😘😗😙😚😋😛😝😜🤪🤨🧐🤓😎🥸🤩🥳😏😞😔😟😕🙁☹️😣😖😫😩🥺😢😭😤😠😡🤯😳🥶😥😓🤗🤔🤭🤫🤥😬🙄😯😧🥱😴🤮😷🤧🤒🤠"),
];

/// An ordered, never-empty collection of palettes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaletteStore {
    /// Store name, used to key its persisted form.
    pub name: String,
    palettes: Vec<Palette>,
}

impl PaletteStore {
    /// Create a store filled with the default palettes.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let mut store = Self {
            name: name.into(),
            palettes: Vec::new(),
        };
        for (palette_name, emojis) in DEFAULT_PALETTES {
            store.insert_palette(palette_name, emojis, usize::MAX);
        }
        store
    }

    /// All palettes in display order.
    #[must_use]
    pub fn palettes(&self) -> &[Palette] {
        &self.palettes
    }

    /// Number of palettes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.palettes.len()
    }

    /// Always `false` once constructed; present for API symmetry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.palettes.is_empty()
    }

    /// Palette at `index`, wrapping around past the end.
    ///
    /// Returns `None` only for an empty store.
    #[must_use]
    pub fn palette(&self, index: usize) -> Option<&Palette> {
        let count = self.palettes.len();
        if count == 0 {
            return None;
        }
        self.palettes.get(index % count)
    }

    /// Index following `index`, wrapping to the first palette.
    #[must_use]
    pub fn next_index(&self, index: usize) -> usize {
        if self.palettes.is_empty() {
            0
        } else {
            (index + 1) % self.palettes.len()
        }
    }

    /// Position of the palette with `id`.
    #[must_use]
    pub fn index_of(&self, id: u32) -> Option<usize> {
        self.palettes.iter().position(|p| p.id == id)
    }

    /// Insert a palette at `index` (clamped), returning its index.
    ///
    /// Non-emoji characters and repeats are dropped from `emojis`.
    pub fn insert_palette(&mut self, name: &str, emojis: &str, index: usize) -> usize {
        let id = self.palettes.iter().map(|p| p.id).max().unwrap_or(0) + 1;
        let index = index.min(self.palettes.len());
        self.palettes.insert(
            index,
            Palette {
                id,
                name: name.to_string(),
                emojis: emoji::emoji_only(emojis),
            },
        );
        index
    }

    /// Remove the palette at `index`.
    ///
    /// The last remaining palette is never removed.
    pub fn remove_palette(&mut self, index: usize) -> Option<Palette> {
        if self.palettes.len() > 1 && index < self.palettes.len() {
            Some(self.palettes.remove(index))
        } else {
            None
        }
    }

    /// Rename the palette at `index`. Returns `false` if out of range.
    pub fn rename(&mut self, index: usize, name: &str) -> bool {
        match self.palettes.get_mut(index) {
            Some(p) => {
                name.clone_into(&mut p.name);
                true
            }
            None => false,
        }
    }

    /// Prepend emoji to the palette at `index`, dropping repeats.
    /// Returns `false` if out of range.
    pub fn add_emojis(&mut self, index: usize, emojis: &str) -> bool {
        match self.palettes.get_mut(index) {
            Some(p) => {
                p.emojis = emoji::emoji_only(&format!("{emojis}{}", p.emojis));
                true
            }
            None => false,
        }
    }

    /// Remove one emoji from the palette at `index`. Returns `false` if the
    /// palette or emoji was not found.
    pub fn remove_emoji(&mut self, index: usize, emoji: &str) -> bool {
        use unicode_segmentation::UnicodeSegmentation;

        let Some(p) = self.palettes.get_mut(index) else {
            return false;
        };
        let before = p.emojis.len();
        p.emojis = p.emojis.graphemes(true).filter(|g| *g != emoji).collect();
        p.emojis.len() != before
    }

    /// Serialize the store to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> ArtResult<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Deserialize a store, re-seeding defaults if it holds no palettes.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ArtError::CorruptData`] if the bytes are malformed.
    pub fn from_json(bytes: &[u8]) -> ArtResult<Self> {
        let store: Self = serde_json::from_slice(bytes)?;
        if store.palettes.is_empty() {
            tracing::debug!("Palette store {} was empty, restoring defaults", store.name);
            return Ok(Self::new(store.name));
        }
        Ok(store)
    }
}
