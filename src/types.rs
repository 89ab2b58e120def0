//! Image handles owned by the widget controller

use crate::error::{BgRemovalError, Result};
use image::{DynamicImage, ImageFormat};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// MIME filter applied by file pickers that feed the widget
pub const ACCEPTED_MIME: &str = "image/*";

/// Check a MIME type against the picker filter
///
/// The controller never calls this; a non-image selection is accepted and
/// fails later at preview or at the remote call.
#[must_use]
pub fn is_accepted_image(mime: &str) -> bool {
    mime.trim().to_ascii_lowercase().starts_with("image/")
}

/// In-memory copy of the user's selected file
#[derive(Clone, PartialEq, Eq)]
pub struct SourceImage {
    bytes: Arc<[u8]>,
    file_name: String,
    mime_type: String,
}

impl SourceImage {
    /// Wrap bytes read by a file picker
    ///
    /// The MIME type is guessed from the file name extension and falls back to
    /// `application/octet-stream`.
    pub fn new<B, S>(bytes: B, file_name: S) -> Self
    where
        B: Into<Arc<[u8]>>,
        S: Into<String>,
    {
        let file_name = file_name.into();
        let mime_type = ImageFormat::from_path(Path::new(&file_name))
            .map(|format| format.to_mime_type().to_string())
            .unwrap_or_else(|_| "application/octet-stream".to_string());
        Self {
            bytes: bytes.into(),
            file_name,
            mime_type,
        }
    }

    /// Override the guessed MIME type (e.g. with the one a browser reported)
    #[must_use]
    pub fn with_mime_type<S: Into<String>>(mut self, mime_type: S) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    #[must_use]
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Decode the source for display
    ///
    /// # Errors
    /// - The bytes are not a decodable image (broken preview)
    pub fn preview(&self) -> Result<DynamicImage> {
        decode_preview(&self.bytes)
    }

    /// Derive the upload payload
    ///
    /// The bytes are sent as-is under the configured upload name and MIME type,
    /// whatever the original container format was.
    #[must_use]
    pub fn to_payload(&self, upload_name: &str, upload_mime: &str) -> UploadPayload {
        UploadPayload {
            bytes: Arc::clone(&self.bytes),
            file_name: upload_name.to_string(),
            mime_type: upload_mime.to_string(),
        }
    }
}

impl fmt::Debug for SourceImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceImage")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Binary body submitted to the remote service
#[derive(Clone, PartialEq, Eq)]
pub struct UploadPayload {
    pub bytes: Arc<[u8]>,
    pub file_name: String,
    pub mime_type: String,
}

impl fmt::Debug for UploadPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadPayload")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Result returned by the remote service
#[derive(Clone, PartialEq, Eq)]
pub struct ProcessedImage {
    bytes: Arc<[u8]>,
    content_type: Option<String>,
}

impl ProcessedImage {
    pub fn new<B: Into<Arc<[u8]>>>(bytes: B, content_type: Option<String>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type,
        }
    }

    /// Locally addressable handle to the returned bytes
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Content type reported by the service, if any
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Decode the result for display
    ///
    /// # Errors
    /// - The service returned bytes that are not a decodable image
    pub fn preview(&self) -> Result<DynamicImage> {
        decode_preview(&self.bytes)
    }
}

impl fmt::Debug for ProcessedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessedImage")
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

fn decode_preview(bytes: &[u8]) -> Result<DynamicImage> {
    if bytes.is_empty() {
        return Err(BgRemovalError::processing("Cannot preview an empty image"));
    }
    Ok(image::load_from_memory(bytes)?)
}
