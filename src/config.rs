//! Configuration module for Filebox.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::{FileboxError, Result};

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// File storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FilesConfig {
    /// Base directory holding the uploads and thumbnails directories.
    #[serde(default = "default_base_dir")]
    pub base_dir: String,
    /// Name of the uploads directory under `base_dir`.
    #[serde(default = "default_uploads_dir")]
    pub uploads_dir: String,
    /// Name of the thumbnails directory under `base_dir`.
    #[serde(default = "default_thumbnails_dir")]
    pub thumbnails_dir: String,
    /// Maximum upload size in megabytes.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size_mb: u64,
    /// Thumbnail edge length in pixels.
    #[serde(default = "default_thumbnail_size")]
    pub thumbnail_size: u32,
    /// Maximum number of thumbnails generated at the same time.
    #[serde(default = "default_max_concurrent_thumbnails")]
    pub max_concurrent_thumbnails: usize,
}

fn default_base_dir() -> String {
    ".".to_string()
}

fn default_uploads_dir() -> String {
    "uploads".to_string()
}

fn default_thumbnails_dir() -> String {
    "thumbnails".to_string()
}

fn default_max_upload_size() -> u64 {
    50
}

fn default_thumbnail_size() -> u32 {
    crate::file::DEFAULT_THUMBNAIL_SIZE
}

fn default_max_concurrent_thumbnails() -> usize {
    4
}

impl FilesConfig {
    /// Full path of the uploads directory.
    pub fn uploads_path(&self) -> PathBuf {
        Path::new(&self.base_dir).join(&self.uploads_dir)
    }

    /// Full path of the thumbnails directory.
    pub fn thumbnails_path(&self) -> PathBuf {
        Path::new(&self.base_dir).join(&self.thumbnails_dir)
    }

    /// Maximum upload size in bytes.
    pub fn max_upload_size_bytes(&self) -> usize {
        (self.max_upload_size_mb as usize).saturating_mul(1024 * 1024)
    }
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            uploads_dir: default_uploads_dir(),
            thumbnails_dir: default_thumbnails_dir(),
            max_upload_size_mb: default_max_upload_size(),
            thumbnail_size: default_thumbnail_size(),
            max_concurrent_thumbnails: default_max_concurrent_thumbnails(),
        }
    }
}

/// Authentication configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Argon2 PHC hash of the shared password.
    #[serde(default)]
    pub password_hash: String,
    /// JWT secret key.
    #[serde(default)]
    pub jwt_secret: String,
    /// Access token expiry in seconds.
    #[serde(default = "default_token_expiry")]
    pub token_expiry_secs: u64,
}

fn default_token_expiry() -> u64 {
    3600 // 1 hour
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            password_hash: String::new(),
            jwt_secret: String::new(),
            token_expiry_secs: default_token_expiry(),
        }
    }
}

/// Web UI configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    /// CORS allowed origins.
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// Whether to serve the browser client.
    #[serde(default = "default_serve_static")]
    pub serve_static: bool,
    /// Path to the static files directory.
    #[serde(default = "default_static_path")]
    pub static_path: String,
    /// Rate limit for the login endpoint (requests per minute).
    #[serde(default = "default_login_rate_limit")]
    pub login_rate_limit: u32,
    /// Key the login rate limit on `X-Forwarded-For` / `X-Real-IP`.
    /// Enable only behind a reverse proxy that sets these headers.
    #[serde(default)]
    pub trust_proxy_headers: bool,
}

fn default_serve_static() -> bool {
    true
}

fn default_static_path() -> String {
    "static".to_string()
}

fn default_login_rate_limit() -> u32 {
    5 // 5 requests per minute
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            cors_origins: vec![],
            serve_static: default_serve_static(),
            static_path: default_static_path(),
            login_rate_limit: default_login_rate_limit(),
            trust_proxy_headers: false,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/filebox.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// File storage configuration.
    #[serde(default)]
    pub files: FilesConfig,
    /// Authentication configuration.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Web UI configuration.
    #[serde(default)]
    pub web: WebConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(FileboxError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration like [`Config::load_with_env`], using the defaults
    /// (plus environment overrides) only when the file does not exist.
    ///
    /// A file that exists but cannot be read or parsed is an error.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        match Self::load_with_env(path) {
            Err(FileboxError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                let mut config = Self::default();
                config.apply_env_overrides();
                Ok(config)
            }
            other => other,
        }
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| FileboxError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `FILEBOX_JWT_SECRET`: Override the JWT secret key
    /// - `FILEBOX_PASSWORD_HASH`: Override the password hash
    pub fn apply_env_overrides(&mut self) {
        if let Ok(jwt_secret) = std::env::var("FILEBOX_JWT_SECRET") {
            if !jwt_secret.is_empty() {
                self.auth.jwt_secret = jwt_secret;
            }
        }
        if let Ok(password_hash) = std::env::var("FILEBOX_PASSWORD_HASH") {
            if !password_hash.is_empty() {
                self.auth.password_hash = password_hash;
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.auth.jwt_secret.is_empty() {
            return Err(FileboxError::Config(
                "jwt_secret is not set. \
                 Set it in config.toml or via FILEBOX_JWT_SECRET environment variable."
                    .to_string(),
            ));
        }
        if self.auth.password_hash.is_empty() {
            return Err(FileboxError::Config(
                "password_hash is not set. \
                 Generate one with `filebox hash-password <password>`."
                    .to_string(),
            ));
        }
        if !crate::auth::is_valid_hash(&self.auth.password_hash) {
            return Err(FileboxError::Config(
                "password_hash is not a valid Argon2 PHC string".to_string(),
            ));
        }
        if self.files.thumbnail_size == 0 {
            return Err(FileboxError::Config(
                "thumbnail_size must be greater than zero".to_string(),
            ));
        }
        if self.files.max_concurrent_thumbnails == 0 {
            return Err(FileboxError::Config(
                "max_concurrent_thumbnails must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
