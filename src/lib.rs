//! Filebox - a minimal file storage manager.
//!
//! Files are stored flat under an uploads directory and served over HTTP,
//! with 100×100 thumbnails kept for uploaded images.

pub mod auth;
pub mod config;
pub mod error;
pub mod file;
pub mod logging;
pub mod web;

pub use auth::{hash_password, validate_password, verify_password, PasswordError};
pub use config::Config;
pub use error::{FileboxError, Result};
pub use file::{validate_file_name, FileStorage, StoredFile, ThumbnailGenerator};
pub use web::WebServer;
