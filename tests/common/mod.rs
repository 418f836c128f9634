//! Test helpers for Web API integration tests.
//!
//! Provides a `TestApp` wrapping an axum-test server over temporary
//! storage, plus helpers for logging in and uploading.

#![allow(dead_code)]

use std::io::Cursor;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use axum::http::header::AUTHORIZATION;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::{TestResponse, TestServer};
use image::{ImageFormat, Rgb, RgbImage};
use serde_json::{json, Value};
use tempfile::TempDir;

use filebox::file::{FileStorage, ThumbnailGenerator};
use filebox::web::handlers::AppState;
use filebox::web::middleware::{JwtState, LoginRateLimiter};
use filebox::web::router::create_router;

/// Password accepted by every test server.
pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// JWT secret used by every test server.
pub const TEST_JWT_SECRET: &str = "test-secret-key-for-testing-only";

/// Argon2 hash of `TEST_PASSWORD`, computed once per test binary.
pub fn password_hash() -> &'static str {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| filebox::hash_password(TEST_PASSWORD).expect("Failed to hash password"))
}

/// Encode a solid-colour PNG.
pub fn sample_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([30, 120, 200]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png)
        .expect("Failed to encode PNG");
    out.into_inner()
}

/// Options for building a test app.
pub struct TestOptions {
    pub max_upload_size: usize,
    pub login_rate_limit: u32,
    pub trust_proxy_headers: bool,
    pub token_expiry: u64,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            max_upload_size: 5 * 1024 * 1024,
            login_rate_limit: 1000,
            trust_proxy_headers: false,
            token_expiry: 900,
        }
    }
}

/// A router under test with its own storage directories.
pub struct TestApp {
    pub server: TestServer,
    pub storage: Arc<FileStorage>,
    dir: TempDir,
}

impl TestApp {
    /// Create a test app with default options.
    pub fn new() -> Self {
        Self::with_options(TestOptions::default())
    }

    /// Create a test app with the given options.
    pub fn with_options(options: TestOptions) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let storage = Arc::new(
            FileStorage::new(dir.path().join("uploads"), dir.path().join("thumbnails"))
                .expect("Failed to create storage"),
        );

        let app_state = Arc::new(
            AppState::new(
                storage.clone(),
                ThumbnailGenerator::new(100, 2),
                TEST_JWT_SECRET,
                password_hash(),
                options.token_expiry,
            )
            .with_max_upload_size(options.max_upload_size),
        );
        let jwt_state = Arc::new(JwtState::new(TEST_JWT_SECRET));
        let login_limiter = Arc::new(
            LoginRateLimiter::new(options.login_rate_limit)
                .trust_proxy_headers(options.trust_proxy_headers),
        );

        let router = create_router(app_state, jwt_state, login_limiter, &[]);
        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            storage,
            dir,
        }
    }

    /// Path of the uploads directory.
    pub fn uploads_dir(&self) -> PathBuf {
        self.dir.path().join("uploads")
    }

    /// Path of the thumbnails directory.
    pub fn thumbnails_dir(&self) -> PathBuf {
        self.dir.path().join("thumbnails")
    }

    /// Log in with the test password and return the access token.
    pub async fn login(&self) -> String {
        let response = self
            .server
            .post("/api/auth/login")
            .json(&json!({ "password": TEST_PASSWORD }))
            .await;
        response.assert_status_ok();

        response.json::<Value>()["data"]["access_token"]
            .as_str()
            .expect("access_token missing")
            .to_string()
    }

    /// Upload `content` as `name` with the given content type.
    pub async fn upload(
        &self,
        token: &str,
        name: &str,
        content_type: &str,
        content: Vec<u8>,
    ) -> TestResponse {
        let form = MultipartForm::new().add_part(
            "file",
            Part::bytes(content).file_name(name).mime_type(content_type),
        );

        self.server
            .post("/upload")
            .add_header(AUTHORIZATION, format!("Bearer {}", token))
            .multipart(form)
            .await
    }

    /// Names in the current listing.
    pub async fn list_names(&self) -> Vec<String> {
        let response = self.server.get("/files").await;
        response.assert_status_ok();

        response.json::<Value>()["files"]
            .as_array()
            .expect("files missing")
            .iter()
            .map(|f| f["name"].as_str().unwrap_or_default().to_string())
            .collect()
    }
}

/// Error code of a JSON error response.
pub fn error_code(response: &TestResponse) -> String {
    response.json::<Value>()["error"]["code"]
        .as_str()
        .unwrap_or_default()
        .to_string()
}
