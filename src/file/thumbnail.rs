//! Thumbnail generation.
//!
//! Thumbnails are a fixed square; the source aspect ratio is not kept so
//! the client can lay them out on a uniform grid.

use std::io::Cursor;
use std::sync::Arc;

use image::{imageops::FilterType, ImageFormat};
use tokio::sync::Semaphore;

use crate::{FileboxError, Result};

/// Render a `size`×`size` thumbnail of an encoded image.
///
/// The thumbnail is encoded in the source format when an encoder for it is
/// available and as PNG otherwise.
pub fn render_thumbnail(source: &[u8], size: u32) -> Result<Vec<u8>> {
    let format = image::guess_format(source)?;
    let img = image::load_from_memory_with_format(source, format)?;
    let thumb = img.resize_exact(size, size, FilterType::Triangle);

    let mut out = Cursor::new(Vec::new());
    if thumb.write_to(&mut out, format).is_ok() {
        return Ok(out.into_inner());
    }

    tracing::debug!(?format, "No encoder for source format, using PNG");
    let mut out = Cursor::new(Vec::new());
    thumb.write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}

/// MIME type of an encoded image, sniffed from its bytes.
pub fn image_mime_type(bytes: &[u8]) -> &'static str {
    image::guess_format(bytes)
        .map(|f| f.to_mime_type())
        .unwrap_or("application/octet-stream")
}

/// Whether a declared content type is an image type.
pub fn is_image_content_type(content_type: &str) -> bool {
    content_type.starts_with("image/")
}

/// Generates thumbnails on the blocking pool, bounded by a semaphore.
#[derive(Debug, Clone)]
pub struct ThumbnailGenerator {
    size: u32,
    permits: Arc<Semaphore>,
}

impl ThumbnailGenerator {
    /// Create a generator producing `size`×`size` thumbnails, with at most
    /// `max_concurrent` renders in flight.
    pub fn new(size: u32, max_concurrent: usize) -> Self {
        Self {
            size,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// Render a thumbnail of `source`.
    pub async fn generate(&self, source: Vec<u8>) -> Result<Vec<u8>> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| FileboxError::Io(std::io::Error::other(e)))?;

        let size = self.size;
        tokio::task::spawn_blocking(move || render_thumbnail(&source, size))
            .await
            .map_err(|e| FileboxError::Io(std::io::Error::other(e)))?
    }
}
