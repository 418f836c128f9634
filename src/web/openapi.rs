//! OpenAPI document for the Filebox API.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use super::dto::{
    FileEntry, FileListResponse, LoginRequest, LoginResponse, MeResponse, MessageResponse,
    RenameRequest, RenameResponse, UploadForm, UploadResponse,
};
use super::handlers;

/// OpenAPI document served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Filebox API",
        description = "Upload, list, download, rename and delete files with image thumbnails"
    ),
    paths(
        handlers::auth::login,
        handlers::auth::me,
        handlers::file::upload_file,
        handlers::file::list_files,
        handlers::file::download_file,
        handlers::file::get_thumbnail,
        handlers::file::delete_file,
        handlers::file::rename_file,
    ),
    components(schemas(
        LoginRequest,
        LoginResponse,
        MeResponse,
        UploadForm,
        UploadResponse,
        FileEntry,
        FileListResponse,
        MessageResponse,
        RenameRequest,
        RenameResponse,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Password login"),
        (name = "files", description = "File storage")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by protected paths.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
