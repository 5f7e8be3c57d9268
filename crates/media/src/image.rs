//! Image type detection from file contents.
//!
//! The declared content type and file name of an upload are ignored; only the
//! leading magic bytes decide what a file is.

use crate::MediaError;

/// Accepted image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    /// JPEG (`FF D8 FF`).
    Jpeg,
    /// PNG (`89 50 4E 47 0D 0A 1A 0A`).
    Png,
    /// WebP (`RIFF....WEBP`).
    Webp,
}

const PNG_SIGNATURE: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

impl ImageKind {
    /// Detect the format from the first bytes of a file.
    #[must_use]
    pub fn sniff(data: &[u8]) -> Option<Self> {
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(Self::Jpeg)
        } else if data.starts_with(PNG_SIGNATURE) {
            Some(Self::Png)
        } else if data.len() >= 12
            && data.starts_with(b"RIFF")
            && data.get(8..12) == Some(b"WEBP".as_slice())
        {
            Some(Self::Webp)
        } else {
            None
        }
    }

    /// File extension used for stored objects.
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Webp => "webp",
        }
    }

    /// MIME type.
    #[must_use]
    pub const fn content_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Webp => "image/webp",
        }
    }

    /// Reverse of [`Self::extension`], for serving stored objects.
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        let ext = path.rsplit_once('.')?.1.to_ascii_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "webp" => Some(Self::Webp),
            _ => None,
        }
    }
}

/// Check an uploaded image against the size limit and accepted formats.
///
/// # Errors
///
/// Returns `Empty`, `TooLarge` or `UnsupportedType`.
pub fn validate_image(data: &[u8], max_bytes: usize) -> Result<ImageKind, MediaError> {
    if data.is_empty() {
        return Err(MediaError::Empty);
    }
    if data.len() > max_bytes {
        return Err(MediaError::TooLarge { max_bytes });
    }
    ImageKind::sniff(data).ok_or(MediaError::UnsupportedType)
}

#[cfg(test)]
mod tests {
    use super::*;

    const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];
    const WEBP: &[u8] = b"RIFF\x24\x00\x00\x00WEBPVP8 ";

    #[test]
    fn test_sniff_formats() {
        assert_eq!(ImageKind::sniff(JPEG), Some(ImageKind::Jpeg));
        assert_eq!(ImageKind::sniff(PNG_SIGNATURE), Some(ImageKind::Png));
        assert_eq!(ImageKind::sniff(WEBP), Some(ImageKind::Webp));
        assert_eq!(ImageKind::sniff(b"GIF89a......"), None);
        assert_eq!(ImageKind::sniff(b"RIFF\x24\x00\x00\x00WAVE"), None);
        assert_eq!(ImageKind::sniff(b"%PDF-1.7"), None);
    }

    #[test]
    fn test_validate_limits() {
        assert!(matches!(validate_image(&[], 10), Err(MediaError::Empty)));
        assert!(matches!(
            validate_image(JPEG, 3),
            Err(MediaError::TooLarge { max_bytes: 3 })
        ));
        assert!(matches!(
            validate_image(b"plain text", 100),
            Err(MediaError::UnsupportedType)
        ));
        assert!(matches!(validate_image(JPEG, JPEG.len()), Ok(ImageKind::Jpeg)));
    }

    #[test]
    fn test_from_path() {
        assert_eq!(ImageKind::from_path("products/a.JPG"), Some(ImageKind::Jpeg));
        assert_eq!(ImageKind::from_path("products/a.webp"), Some(ImageKind::Webp));
        assert_eq!(ImageKind::from_path("products/readme"), None);
    }
}
