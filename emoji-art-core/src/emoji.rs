//! Emoji grapheme validation.
//!
//! Elements hold exactly one extended grapheme cluster. A cluster counts as an
//! emoji when its first scalar carries the emoji property and either sits above
//! the legacy symbol block (U+238C) or is followed by more scalars (keycaps,
//! variation selectors, ZWJ sequences, flags).

use unicode_segmentation::UnicodeSegmentation;

use crate::{ArtError, ArtResult};

/// Scalars at or below this value only count as emoji inside a multi-scalar
/// cluster ("1" is not an emoji, "1\u{FE0F}\u{20E3}" is).
const LEGACY_SYMBOL_CEILING: u32 = 0x238C;

fn has_emoji_property(c: char) -> bool {
    let u = u32::from(c);
    matches!(
        u,
        0x0023
            | 0x002A
            | 0x0030..=0x0039
            | 0x00A9
            | 0x00AE
            | 0x203C
            | 0x2049
            | 0x2122
            | 0x2139
            | 0x2194..=0x2199
            | 0x21A9..=0x21AA
            | 0x231A..=0x231B
            | 0x2328
            | 0x23CF
            | 0x23E9..=0x23F3
            | 0x23F8..=0x23FA
            | 0x24C2
            | 0x25AA..=0x25AB
            | 0x25B6
            | 0x25C0
            | 0x25FB..=0x25FE
            | 0x2600..=0x27BF
            | 0x2934..=0x2935
            | 0x2B05..=0x2B07
            | 0x2B1B..=0x2B1C
            | 0x2B50
            | 0x2B55
            | 0x3030
            | 0x303D
            | 0x3297
            | 0x3299
            | 0x1F000..=0x1FAFF
    )
}

/// Returns `true` if `grapheme` is a single cluster that renders as an emoji.
#[must_use]
pub fn is_emoji_grapheme(grapheme: &str) -> bool {
    let mut scalars = grapheme.chars();
    let Some(first) = scalars.next() else {
        return false;
    };
    has_emoji_property(first) && (u32::from(first) > LEGACY_SYMBOL_CEILING || scalars.next().is_some())
}

/// Validate that `text` is exactly one emoji grapheme.
///
/// # Errors
///
/// Returns [`ArtError::InvalidInput`] if `text` is empty, holds more than one
/// grapheme cluster, or the cluster is not an emoji.
pub fn single_emoji(text: &str) -> ArtResult<&str> {
    let mut graphemes = text.graphemes(true);
    match (graphemes.next(), graphemes.next()) {
        (Some(g), None) if is_emoji_grapheme(g) => Ok(g),
        (Some(_), None) => Err(ArtError::InvalidInput(format!("{text:?} is not an emoji"))),
        (None, _) => Err(ArtError::InvalidInput("empty emoji text".to_string())),
        (Some(_), Some(_)) => Err(ArtError::InvalidInput(format!(
            "{text:?} holds more than one grapheme"
        ))),
    }
}

/// First grapheme of `text` if it is an emoji.
///
/// Dropped text is accepted when it starts with an emoji; the rest is ignored.
#[must_use]
pub fn leading_emoji(text: &str) -> Option<&str> {
    text.graphemes(true).next().filter(|g| is_emoji_grapheme(g))
}

/// Remove repeated graphemes, keeping the first occurrence of each.
#[must_use]
pub fn dedup_graphemes(text: &str) -> String {
    let mut seen: Vec<&str> = Vec::new();
    for g in text.graphemes(true) {
        if !seen.contains(&g) {
            seen.push(g);
        }
    }
    seen.concat()
}

/// Keep only the emoji graphemes of `text`, deduplicated.
#[must_use]
pub fn emoji_only(text: &str) -> String {
    let filtered: String = text
        .graphemes(true)
        .filter(|g| is_emoji_grapheme(g))
        .collect();
    dedup_graphemes(&filtered)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_common_emoji() {
        for e in ["🦖", "🦕", "❤", "☀️", "🚗", "🇨🇦", "👩‍🚀", "👍🏽", "1️⃣"] {
            assert!(single_emoji(e).is_ok(), "{e} should be accepted");
        }
    }

    #[test]
    fn test_rejects_plain_text() {
        assert!(single_emoji("a").is_err());
        assert!(single_emoji("1").is_err());
        assert!(single_emoji("#").is_err());
        assert!(single_emoji("©").is_err());
        assert!(single_emoji("").is_err());
    }

    #[test]
    fn test_rejects_multiple_graphemes() {
        let err = single_emoji("🦖🦕").unwrap_err();
        assert!(matches!(err, ArtError::InvalidInput(_)));
    }

    #[test]
    fn test_leading_emoji() {
        assert_eq!(leading_emoji("🦖 roar"), Some("🦖"));
        assert_eq!(leading_emoji("roar 🦖"), None);
        assert_eq!(leading_emoji(""), None);
    }

    #[test]
    fn test_dedup_graphemes_keeps_first_occurrence() {
        assert_eq!(dedup_graphemes("🐶🐱🐶🐭🐱"), "🐶🐱🐭");
        assert_eq!(dedup_graphemes("👩‍🚀👩👩‍🚀"), "👩‍🚀👩");
    }

    #[test]
    fn test_emoji_only_filters_text() {
        assert_eq!(emoji_only("a🐶b🐶c🌵"), "🐶🌵");
    }
}
