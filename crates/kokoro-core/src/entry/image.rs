//! Image attachment preconditions.
//!
//! Both limits mirror the backend's upload checks; enforcing them here means
//! an oversized or unsupported file is rejected before any network call.

use crate::error::{KokoroError, Result};

/// Maximum accepted image size (5 MB).
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Content types the storage backend accepts.
pub const ALLOWED_IMAGE_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/gif", "image/webp"];

/// A validated image file ready for upload.
///
/// Construction is the validation gate: an `ImageUpload` in hand has already
/// passed the size and content-type preconditions.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageUpload {
    file_name: String,
    content_type: String,
    bytes: Vec<u8>,
}

impl ImageUpload {
    /// Validates and wraps an image file.
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<Self> {
        let content_type = content_type.into();
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(KokoroError::validation(
                "image must be 5 MB or smaller".to_string(),
            ));
        }
        if !ALLOWED_IMAGE_TYPES.contains(&content_type.as_str()) {
            return Err(KokoroError::validation(format!(
                "unsupported image type '{}': only JPEG, PNG, GIF and WebP are accepted",
                content_type
            )));
        }
        Ok(Self {
            file_name: file_name.into(),
            content_type,
            bytes,
        })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Guesses a content type from a file extension, for surfaces that read
/// images from disk. Unknown extensions yield `None` and are rejected.
pub fn content_type_for_extension(ext: &str) -> Option<&'static str> {
    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_small_png() {
        let upload = ImageUpload::new("photo.png", "image/png", vec![0u8; 1024]).unwrap();
        assert_eq!(upload.file_name(), "photo.png");
        assert_eq!(upload.content_type(), "image/png");
    }

    #[test]
    fn test_rejects_oversized_image() {
        let err = ImageUpload::new("big.jpg", "image/jpeg", vec![0u8; MAX_IMAGE_BYTES + 1])
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_accepts_exactly_five_megabytes() {
        assert!(ImageUpload::new("edge.jpg", "image/jpeg", vec![0u8; MAX_IMAGE_BYTES]).is_ok());
    }

    #[test]
    fn test_rejects_unsupported_type() {
        let err = ImageUpload::new("doc.pdf", "application/pdf", vec![0u8; 10]).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_extension_mapping() {
        assert_eq!(content_type_for_extension("JPG"), Some("image/jpeg"));
        assert_eq!(content_type_for_extension("webp"), Some("image/webp"));
        assert_eq!(content_type_for_extension("bmp"), None);
    }
}
