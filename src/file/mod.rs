//! File management module for Filebox.
//!
//! This module provides:
//! - Flat storage of uploaded files and their thumbnails
//! - File name validation
//! - Thumbnail rendering
//! - Per-name locking of mutating operations

mod locks;
mod name;
mod storage;
mod thumbnail;

pub use locks::{NameGuard, NameLocks};
pub use name::{extension_of, validate_file_name};
pub use storage::{DeleteOutcome, FileStorage, RenameOutcome, StoredFile};
pub use thumbnail::{image_mime_type, is_image_content_type, render_thumbnail, ThumbnailGenerator};

/// Maximum length of a file name in bytes.
pub const MAX_FILENAME_BYTES: usize = 255;

/// Default thumbnail edge length in pixels.
pub const DEFAULT_THUMBNAIL_SIZE: u32 = 100;
