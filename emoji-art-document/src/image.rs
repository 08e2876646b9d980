//! Background image decoding.
//!
//! Supports raw encoded bytes and `data:` URIs (base64 or percent-encoded).

use base64::Engine;

use crate::FetchError;

/// A decoded background image ready for presentation.
#[derive(Clone, PartialEq, Eq)]
pub struct BackgroundImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// RGBA pixel data (4 bytes per pixel).
    pub rgba: Vec<u8>,
    /// Format the image was encoded in.
    pub format: ImageFormat,
}

impl std::fmt::Debug for BackgroundImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("rgba_len", &self.rgba.len())
            .finish()
    }
}

impl BackgroundImage {
    /// Image dimensions as floating-point size, for zoom-to-fit.
    #[must_use]
    pub fn size(&self) -> emoji_art_core::Size {
        emoji_art_core::Size::new(f64::from(self.width), f64::from(self.height))
    }
}

/// Encoded image formats recognized by their magic bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// PNG with alpha support.
    Png,
    /// JPEG (no alpha).
    Jpeg,
    /// GIF.
    Gif,
    /// WebP (alpha support).
    WebP,
    /// Unknown/other format.
    Unknown,
}

impl ImageFormat {
    /// Detect format from magic bytes.
    #[must_use]
    pub fn from_magic_bytes(data: &[u8]) -> Self {
        if data.len() < 4 {
            return Self::Unknown;
        }

        // PNG: 89 50 4E 47
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Self::Png;
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Self::Jpeg;
        }

        if data.starts_with(b"GIF8") {
            return Self::Gif;
        }

        // WebP: RIFF....WEBP
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Self::WebP;
        }

        Self::Unknown
    }
}

/// Decode encoded image bytes.
///
/// # Errors
///
/// Returns [`FetchError::Decode`] if the image cannot be decoded.
pub fn decode_image(data: &[u8]) -> Result<BackgroundImage, FetchError> {
    let format = ImageFormat::from_magic_bytes(data);

    let img = image::load_from_memory(data).map_err(|e| FetchError::Decode(e.to_string()))?;

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();

    Ok(BackgroundImage {
        width,
        height,
        rgba: rgba.into_raw(),
        format,
    })
}

/// Extract the payload bytes of a `data:` URI.
///
/// Supports forms like `data:image/png;base64,iVBORw0KGgo...` and
/// percent-encoded payloads.
///
/// # Errors
///
/// Returns [`FetchError::InvalidDataUri`] if the URI is malformed.
pub fn data_uri_bytes(uri: &str) -> Result<Vec<u8>, FetchError> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| FetchError::InvalidDataUri("not a data URI".to_string()))?;

    let (metadata, payload) = rest
        .split_once(',')
        .ok_or_else(|| FetchError::InvalidDataUri("missing comma".to_string()))?;

    if metadata.ends_with(";base64") {
        base64::engine::general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| FetchError::InvalidDataUri(format!("bad base64: {e}")))
    } else {
        percent_decode(payload)
    }
}

fn percent_decode(input: &str) -> Result<Vec<u8>, FetchError> {
    let bytes = input.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let byte = bytes
                .get(i + 1..i + 3)
                .and_then(|hex| std::str::from_utf8(hex).ok())
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                .ok_or_else(|| FetchError::InvalidDataUri("bad percent escape".to_string()))?;
            result.push(byte);
            i += 3;
        } else {
            result.push(bytes[i]);
            i += 1;
        }
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Minimal valid PNG (1x1 red pixel)
    const PNG_BASE64: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8DwHwAFBQIAX8jx0gAAAABJRU5ErkJggg==";

    #[test]
    fn test_format_detection_from_magic_bytes() {
        assert_eq!(
            ImageFormat::from_magic_bytes(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]),
            ImageFormat::Png
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(&[0xFF, 0xD8, 0xFF, 0xE0]),
            ImageFormat::Jpeg
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(b"RIFF\x00\x00\x00\x00WEBP"),
            ImageFormat::WebP
        );
        assert_eq!(ImageFormat::from_magic_bytes(b"GIF89a"), ImageFormat::Gif);
        assert_eq!(ImageFormat::from_magic_bytes(b"xy"), ImageFormat::Unknown);
    }

    #[test]
    fn test_data_uri_decodes_png() {
        let bytes = data_uri_bytes(&format!("data:image/png;base64,{PNG_BASE64}")).expect("bytes");
        let image = decode_image(&bytes).expect("decode");
        assert_eq!((image.width, image.height), (1, 1));
        assert_eq!(image.format, ImageFormat::Png);
        assert_eq!(image.rgba.len(), 4);
    }

    #[test]
    fn test_invalid_data_uri() {
        assert!(data_uri_bytes("not a data uri").is_err());
        assert!(data_uri_bytes("data:image/png").is_err());
        assert!(data_uri_bytes("data:text/plain,%zz").is_err());
    }

    #[test]
    fn test_percent_encoded_payload() {
        assert_eq!(
            data_uri_bytes("data:text/plain,a%20b").expect("bytes"),
            b"a b".to_vec()
        );
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            decode_image(b"definitely not an image"),
            Err(FetchError::Decode(_))
        ));
    }
}
