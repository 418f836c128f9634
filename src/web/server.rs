//! Web server for Filebox.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;

use crate::config::{Config, WebConfig};
use crate::error::{FileboxError, Result};
use crate::file::FileStorage;

use super::handlers::AppState;
use super::middleware::{JwtState, LoginRateLimiter};
use super::router::{
    create_health_router, create_router, create_static_router, create_swagger_router,
};

/// Web server for the API and browser client.
pub struct WebServer {
    /// Server address.
    addr: SocketAddr,
    /// Application state.
    app_state: Arc<AppState>,
    /// JWT state.
    jwt_state: Arc<JwtState>,
    /// Web configuration.
    web_config: WebConfig,
}

impl WebServer {
    /// Create a new web server.
    ///
    /// Creates the upload and thumbnail directories; failing to do so is
    /// an error, since nothing can be stored without them.
    pub fn new(config: &Config) -> Result<Self> {
        let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
            .parse()
            .map_err(|e| FileboxError::Config(format!("invalid server address: {}", e)))?;

        let storage = FileStorage::from_config(&config.files)?;
        tracing::info!(
            uploads = %storage.uploads_dir().display(),
            thumbnails = %storage.thumbnails_dir().display(),
            "File storage initialized"
        );

        let app_state = AppState::from_config(config, Arc::new(storage));
        let jwt_state = Arc::new(JwtState::new(&config.auth.jwt_secret));

        Ok(Self {
            addr,
            app_state: Arc::new(app_state),
            jwt_state,
            web_config: config.web.clone(),
        })
    }

    /// Get the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    fn build_router(self) -> Router {
        let login_limiter = Arc::new(
            LoginRateLimiter::new(self.web_config.login_rate_limit)
                .trust_proxy_headers(self.web_config.trust_proxy_headers),
        );
        login_limiter.clone().start_cleanup_task();

        let mut router = create_router(
            self.app_state,
            self.jwt_state,
            login_limiter,
            &self.web_config.cors_origins,
        )
        .merge(create_health_router())
        .merge(create_swagger_router());

        if self.web_config.serve_static {
            if let Some(static_router) = create_static_router(&self.web_config.static_path) {
                router = router.merge(static_router);
            }
        }

        router.layer(CompressionLayer::new())
    }

    /// Run the web server.
    pub async fn run(self) -> std::result::Result<(), std::io::Error> {
        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;
        let router = self.build_router();

        tracing::info!("Web server listening on http://{}", local_addr);

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
    }

    /// Run the server in the background and return the actual bound address.
    ///
    /// This is useful for testing when binding to port 0.
    pub async fn run_with_addr(self) -> std::result::Result<SocketAddr, std::io::Error> {
        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;
        let router = self.build_router();

        tracing::info!("Web server listening on http://{}", local_addr);

        tokio::spawn(async move {
            if let Err(e) = axum::serve(
                listener,
                router.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            {
                tracing::error!("Web server error: {}", e);
            }
        });

        Ok(local_addr)
    }
}
