//! Router configuration for Web API.

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::path::Path;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::handlers::{
    delete_file, download_file, get_thumbnail, list_files, login, me, rename_file, upload_file,
    AppState,
};
use super::middleware::{create_cors_layer, jwt_auth, login_rate_limit, JwtState, LoginRateLimiter};
use super::openapi::ApiDoc;

/// Create the main API router.
///
/// Reads (`/files`, `/download`, `/thumbnails`) are public; uploads,
/// deletes and renames require a bearer token.
pub fn create_router(
    app_state: Arc<AppState>,
    jwt_state: Arc<JwtState>,
    login_limiter: Arc<LoginRateLimiter>,
    cors_origins: &[String],
) -> Router {
    let login_routes = Router::new()
        .route("/login", post(login))
        .route_layer(middleware::from_fn(move |req, next| {
            let limiter = login_limiter.clone();
            login_rate_limit(limiter, req, next)
        }));

    let auth_routes = Router::new()
        .merge(login_routes)
        .route("/me", get(me));

    let file_routes = Router::new()
        .route(
            "/upload",
            post(upload_file).layer(DefaultBodyLimit::max(app_state.max_upload_size)),
        )
        .route("/files", get(list_files))
        .route("/download/:file_name", get(download_file))
        .route("/thumbnails/:file_name", get(get_thumbnail))
        .route("/delete/:file_name", delete(delete_file))
        .route("/rename", post(rename_file));

    let jwt_state_for_middleware = jwt_state.clone();

    Router::new()
        .merge(file_routes)
        .nest("/api/auth", auth_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins))
                .layer(middleware::from_fn(move |req, next| {
                    let state = jwt_state_for_middleware.clone();
                    jwt_auth(state, req, next)
                })),
        )
        .with_state(app_state)
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}

/// Serve the browser client from `static_path`.
///
/// Returns `None` when the directory does not exist.
pub fn create_static_router(static_path: &str) -> Option<Router> {
    if !Path::new(static_path).is_dir() {
        tracing::warn!("Static directory {} not found, web client disabled", static_path);
        return None;
    }

    let service = ServeDir::new(static_path).append_index_html_on_directories(true);
    Some(Router::new().fallback_service(service))
}

/// Serve the OpenAPI document and Swagger UI.
pub fn create_swagger_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, http::StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health_check() {
        let response = create_health_router()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"OK");
    }

    #[test]
    fn test_static_router_missing_dir() {
        assert!(create_static_router("/nonexistent/filebox/static").is_none());
    }

    #[tokio::test]
    async fn test_static_router_serves_index() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("index.html"), "<html>filebox</html>").unwrap();

        let router = create_static_router(temp_dir.path().to_str().unwrap()).unwrap();
        let response = router
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"<html>filebox</html>");
    }
}
