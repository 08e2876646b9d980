//! Background references and drop-payload classification.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::emoji;

/// What (if anything) sits underneath the emoji on a canvas.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Background {
    /// No background image.
    #[default]
    Blank,
    /// Encoded image bytes embedded in the document.
    InlineData(#[serde(with = "base64_bytes")] Vec<u8>),
    /// An image to retrieve from a URL.
    RemoteUrl(Url),
}

impl Background {
    /// Build a remote reference, unwrapping search-engine redirect links to
    /// the image they point at.
    #[must_use]
    pub fn remote(url: Url) -> Self {
        Self::RemoteUrl(image_url(&url))
    }

    /// Check if this is the blank background.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Blank)
    }

    /// The remote URL, if this reference is one.
    #[must_use]
    pub fn url(&self) -> Option<&Url> {
        match self {
            Self::RemoteUrl(url) => Some(url),
            _ => None,
        }
    }

    /// Short variant name for logging.
    #[must_use]
    pub fn variant_name(&self) -> &'static str {
        match self {
            Self::Blank => "blank",
            Self::InlineData(_) => "inline_data",
            Self::RemoteUrl(_) => "remote_url",
        }
    }
}

impl std::fmt::Display for Background {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Blank => write!(f, "blank"),
            Self::InlineData(bytes) => write!(f, "inline image ({} bytes)", bytes.len()),
            Self::RemoteUrl(url) => write!(f, "{url}"),
        }
    }
}

/// Resolve the image a dropped link refers to.
///
/// Image search results link to a results page carrying the real image in an
/// `imgurl` query parameter; any other URL is returned unchanged.
#[must_use]
pub fn image_url(url: &Url) -> Url {
    url.query_pairs()
        .find(|(key, _)| key == "imgurl")
        .and_then(|(_, value)| Url::parse(&value).ok())
        .unwrap_or_else(|| url.clone())
}

/// One representation offered by a drag-and-drop or pasteboard source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropPayload {
    /// A URL (usually a link to an image).
    Url(Url),
    /// Encoded image bytes.
    ImageData(Vec<u8>),
    /// Plain text.
    Text(String),
}

/// What a drop should do to the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropAction {
    /// Replace the background.
    SetBackground(Background),
    /// Place a new emoji at the drop location.
    AddEmoji(String),
}

impl DropPayload {
    /// Pick the action for a set of offered payloads.
    ///
    /// URLs win over image bytes, which win over text. Text only produces an
    /// action when it starts with an emoji. Returns `None` if nothing usable
    /// was offered.
    #[must_use]
    pub fn classify(payloads: &[DropPayload]) -> Option<DropAction> {
        let url = payloads.iter().find_map(|p| match p {
            Self::Url(url) => Some(DropAction::SetBackground(Background::remote(url.clone()))),
            _ => None,
        });
        let image = || {
            payloads.iter().find_map(|p| match p {
                Self::ImageData(bytes) => Some(DropAction::SetBackground(Background::InlineData(
                    bytes.clone(),
                ))),
                _ => None,
            })
        };
        let text = || {
            payloads.iter().find_map(|p| match p {
                Self::Text(text) => {
                    emoji::leading_emoji(text).map(|e| DropAction::AddEmoji(e.to_string()))
                }
                _ => None,
            })
        };
        url.or_else(image).or_else(text)
    }
}

/// Serde adapter storing bytes as a standard base64 string.
mod base64_bytes {
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&base64::engine::general_purpose::STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(serde::de::Error::custom)
    }
}
