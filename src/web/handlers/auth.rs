//! Authentication handlers and shared application state.

use axum::{extract::State, Json};
use jsonwebtoken::{encode, EncodingKey, Header};
use std::sync::Arc;

use crate::auth::{verify_password, PasswordError};
use crate::config::Config;
use crate::file::{FileStorage, ThumbnailGenerator};
use crate::web::dto::{ApiResponse, LoginRequest, LoginResponse, MeResponse, ValidatedJson};
use crate::web::error::ApiError;
use crate::web::middleware::{AuthUser, JwtClaims, TOKEN_SUBJECT};

/// Upload body limit used when none is configured (50 MB).
pub const DEFAULT_MAX_UPLOAD_SIZE: usize = 50 * 1024 * 1024;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Uploaded files and thumbnails.
    pub storage: Arc<FileStorage>,
    /// Thumbnail renderer.
    pub thumbnails: ThumbnailGenerator,
    /// JWT encoding key.
    pub encoding_key: EncodingKey,
    /// Argon2 hash of the shared password.
    pub password_hash: String,
    /// Access token expiry in seconds.
    pub token_expiry: u64,
    /// Maximum upload body size in bytes.
    pub max_upload_size: usize,
}

impl AppState {
    /// Create a new application state.
    pub fn new(
        storage: Arc<FileStorage>,
        thumbnails: ThumbnailGenerator,
        jwt_secret: &str,
        password_hash: impl Into<String>,
        token_expiry: u64,
    ) -> Self {
        Self {
            storage,
            thumbnails,
            encoding_key: EncodingKey::from_secret(jwt_secret.as_bytes()),
            password_hash: password_hash.into(),
            token_expiry,
            max_upload_size: DEFAULT_MAX_UPLOAD_SIZE,
        }
    }

    /// Set the maximum upload body size in bytes.
    pub fn with_max_upload_size(mut self, bytes: usize) -> Self {
        self.max_upload_size = bytes;
        self
    }

    /// Create the application state from configuration over existing storage.
    pub fn from_config(config: &Config, storage: Arc<FileStorage>) -> Self {
        let thumbnails = ThumbnailGenerator::new(
            config.files.thumbnail_size,
            config.files.max_concurrent_thumbnails,
        );
        Self::new(
            storage,
            thumbnails,
            &config.auth.jwt_secret,
            config.auth.password_hash.clone(),
            config.auth.token_expiry_secs,
        )
        .with_max_upload_size(config.files.max_upload_size_bytes())
    }

    /// Generate an access token.
    pub fn generate_access_token(&self) -> Result<String, ApiError> {
        let now = chrono::Utc::now().timestamp() as u64;
        let claims = JwtClaims {
            sub: TOKEN_SUBJECT.to_string(),
            iat: now,
            exp: now + self.token_expiry,
            jti: uuid::Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Failed to encode JWT: {}", e);
            ApiError::internal("Failed to generate token")
        })
    }
}

/// POST /api/auth/login - Exchange the shared password for an access token.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Access token issued", body = LoginResponse),
        (status = 400, description = "Password missing"),
        (status = 401, description = "Wrong password"),
        (status = 429, description = "Too many login attempts")
    )
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    let hash = state.password_hash.clone();
    // Argon2 is CPU-bound
    let verified = tokio::task::spawn_blocking(move || verify_password(&req.password, &hash))
        .await
        .map_err(|e| {
            tracing::error!("Password verification task failed: {}", e);
            ApiError::internal("Failed to verify password")
        })?;

    if let Err(e) = verified {
        match e {
            PasswordError::InvalidHash => {
                tracing::error!("Configured password hash is not a valid PHC string")
            }
            _ => tracing::info!("Login failed: wrong password"),
        }
        return Err(ApiError::unauthorized("Invalid password"));
    }

    let access_token = state.generate_access_token()?;
    tracing::info!("Login succeeded");

    Ok(Json(ApiResponse::new(LoginResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: state.token_expiry,
    })))
}

/// GET /api/auth/me - Describe the current session.
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "auth",
    responses(
        (status = 200, description = "Current session", body = MeResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn me(AuthUser(claims): AuthUser) -> Result<Json<ApiResponse<MeResponse>>, ApiError> {
    let expires_at = chrono::DateTime::from_timestamp(claims.exp as i64, 0)
        .map(|dt| dt.to_rfc3339())
        .ok_or_else(|| ApiError::unauthorized("Invalid token expiry"))?;

    Ok(Json(ApiResponse::new(MeResponse {
        sub: claims.sub,
        expires_at,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::middleware::JwtState;
    use tempfile::TempDir;

    fn test_state(temp_dir: &TempDir) -> AppState {
        let storage = FileStorage::new(
            temp_dir.path().join("uploads"),
            temp_dir.path().join("thumbnails"),
        )
        .unwrap();
        AppState::new(
            Arc::new(storage),
            ThumbnailGenerator::new(100, 1),
            "test-secret",
            "",
            600,
        )
    }

    #[test]
    fn test_generate_access_token_verifies() {
        let temp_dir = TempDir::new().unwrap();
        let state = test_state(&temp_dir);

        let token = state.generate_access_token().unwrap();
        let claims = JwtState::new("test-secret").verify(&token).unwrap();

        assert_eq!(claims.sub, TOKEN_SUBJECT);
        assert_eq!(claims.exp - claims.iat, 600);
    }

    #[test]
    fn test_tokens_are_unique() {
        let temp_dir = TempDir::new().unwrap();
        let state = test_state(&temp_dir);

        let a = state.generate_access_token().unwrap();
        let b = state.generate_access_token().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_token_rejected_with_other_secret() {
        let temp_dir = TempDir::new().unwrap();
        let state = test_state(&temp_dir);

        let token = state.generate_access_token().unwrap();
        assert!(JwtState::new("other-secret").verify(&token).is_err());
    }
}
