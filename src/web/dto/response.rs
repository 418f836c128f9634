//! Response DTOs for Web API.

use serde::Serialize;
use utoipa::ToSchema;

use crate::file::StoredFile;

// ============================================================================
// Generic Response Wrappers
// ============================================================================

/// Generic API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a new API response.
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Plain message response.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    /// Human-readable result.
    pub message: String,
}

impl MessageResponse {
    /// Create a new message response.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// ============================================================================
// Auth DTOs
// ============================================================================

/// Login response.
#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    /// Access token (JWT).
    pub access_token: String,
    /// Always `Bearer`.
    pub token_type: String,
    /// Access token expiry in seconds.
    pub expires_in: u64,
}

/// Current session response (for /api/auth/me).
#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    /// Token subject.
    pub sub: String,
    /// Token expiry (RFC 3339).
    pub expires_at: String,
}

// ============================================================================
// File DTOs
// ============================================================================

/// Upload response.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// Human-readable result.
    pub message: String,
    /// Name the file was stored under.
    pub file_name: String,
}

/// Single entry of the file listing.
#[derive(Debug, Serialize, ToSchema)]
pub struct FileEntry {
    /// File name.
    pub name: String,
    /// Extension including the dot, or empty.
    #[serde(rename = "type")]
    pub file_type: String,
    /// Size in bytes.
    pub size: u64,
}

impl From<StoredFile> for FileEntry {
    fn from(file: StoredFile) -> Self {
        Self {
            name: file.name,
            file_type: file.extension,
            size: file.size,
        }
    }
}

/// File listing response.
#[derive(Debug, Serialize, ToSchema)]
pub struct FileListResponse {
    /// Stored files, sorted by name.
    pub files: Vec<FileEntry>,
}

/// Rename response.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RenameResponse {
    /// Always true on success.
    pub success: bool,
    /// Human-readable result.
    pub message: String,
    /// Previous file name.
    pub old_name: String,
    /// New file name.
    pub new_name: String,
    /// Previous thumbnail name, when a thumbnail was moved.
    pub old_thumbnail_name: Option<String>,
    /// New thumbnail name, when a thumbnail was moved.
    pub new_thumbnail_name: Option<String>,
}

/// Multipart upload form, for the API documentation only.
#[derive(Debug, ToSchema)]
pub struct UploadForm {
    /// File to store.
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}
