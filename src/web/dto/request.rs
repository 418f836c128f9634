//! Request DTOs for Web API.

use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

/// Login request.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    /// Shared access password.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Rename request.
///
/// Names are checked again by the storage layer; the length checks here only
/// give early, field-level feedback.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RenameRequest {
    /// Current file name.
    #[validate(length(min = 1, max = 255, message = "Old name must be 1-255 characters"))]
    pub old_name: String,
    /// New file name.
    #[validate(length(min = 1, max = 255, message = "New name must be 1-255 characters"))]
    pub new_name: String,
}
