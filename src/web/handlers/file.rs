//! File handlers for Web API.

use axum::{
    body::Body,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, Path, State,
    },
    http::{header, StatusCode},
    response::Response,
    Json,
};
use std::sync::Arc;
use tokio_util::io::ReaderStream;

use crate::file::{image_mime_type, is_image_content_type, validate_file_name};
use crate::web::dto::{
    FileEntry, FileListResponse, MessageResponse, RenameRequest, RenameResponse, UploadForm,
    UploadResponse, ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::AuthUser;

/// Generate a safe Content-Disposition header value.
///
/// `disposition` is `attachment` or `inline`. Control characters are
/// dropped and quotes/backslashes replaced in the plain `filename`
/// parameter; names that need it also get an RFC 5987 `filename*`.
fn content_disposition_header(disposition: &str, filename: &str) -> String {
    let sanitized: String = filename
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '"' | '\\' => '_',
            _ => c,
        })
        .collect();

    if filename.is_ascii() && !filename.chars().any(|c| c.is_control() || c == '"' || c == '\\') {
        return format!("{}; filename=\"{}\"", disposition, filename);
    }

    let encoded = urlencoding::encode(filename);

    format!(
        "{}; filename=\"{}\"; filename*=UTF-8''{}",
        disposition, sanitized, encoded
    )
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        tracing::warn!("Upload rejected: {}", e);
        ApiError::payload_too_large("File too large")
    } else {
        tracing::warn!("Failed to read multipart data: {}", e);
        ApiError::bad_request("Invalid multipart data")
    }
}

/// A single uploaded file taken from the multipart body.
struct UploadedFile {
    name: String,
    content_type: String,
    content: Vec<u8>,
}

async fn read_upload(mut multipart: Multipart) -> Result<UploadedFile, ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }

        let name = field
            .file_name()
            .map(|s| s.to_string())
            .ok_or_else(|| ApiError::bad_request("File name is missing"))?;
        let content_type = field
            .content_type()
            .map(|s| s.to_string())
            .unwrap_or_else(|| {
                mime_guess::from_path(&name)
                    .first_or_octet_stream()
                    .to_string()
            });
        let content = field.bytes().await.map_err(multipart_error)?.to_vec();

        return Ok(UploadedFile {
            name,
            content_type,
            content,
        });
    }

    Err(ApiError::bad_request("No file provided"))
}

/// POST /upload - Upload a file.
#[utoipa::path(
    post,
    path = "/upload",
    tag = "files",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "File stored", body = UploadResponse),
        (status = 400, description = "No file or invalid file name"),
        (status = 401, description = "Unauthorized"),
        (status = 413, description = "File too large"),
        (status = 500, description = "File or thumbnail could not be written")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    AuthUser(_claims): AuthUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let multipart = multipart.map_err(|e| {
        tracing::warn!("Upload without multipart body: {}", e);
        ApiError::bad_request("Expected multipart/form-data")
    })?;
    let upload = read_upload(multipart).await?;

    validate_file_name(&upload.name)?;

    let size = upload.content.len();
    let thumbnail = if is_image_content_type(&upload.content_type) {
        let rendered = state
            .thumbnails
            .generate(upload.content.clone())
            .await
            .map_err(|e| {
                tracing::error!(file = %upload.name, error = %e, "Failed to create thumbnail");
                ApiError::internal("Failed to create thumbnail")
            })?;
        Some(rendered)
    } else {
        None
    };

    state
        .storage
        .save(&upload.name, &upload.content, thumbnail.as_deref())
        .await?;

    tracing::info!(
        file = %upload.name,
        size,
        thumbnail = thumbnail.is_some(),
        "File uploaded"
    );

    Ok(Json(UploadResponse {
        message: "File uploaded successfully".to_string(),
        file_name: upload.name,
    }))
}

/// GET /files - List stored files.
#[utoipa::path(
    get,
    path = "/files",
    tag = "files",
    responses(
        (status = 200, description = "Stored files sorted by name", body = FileListResponse),
        (status = 500, description = "Upload directory could not be read")
    )
)]
pub async fn list_files(
    State(state): State<Arc<AppState>>,
) -> Result<Json<FileListResponse>, ApiError> {
    let files = state.storage.list().await.map_err(|e| {
        tracing::error!("Failed to list files: {}", e);
        ApiError::internal("Unable to scan files")
    })?;

    Ok(Json(FileListResponse {
        files: files.into_iter().map(FileEntry::from).collect(),
    }))
}

/// GET /download/:fileName - Download a file.
#[utoipa::path(
    get,
    path = "/download/{fileName}",
    tag = "files",
    params(
        ("fileName" = String, Path, description = "Stored file name")
    ),
    responses(
        (status = 200, description = "File content", content_type = "application/octet-stream"),
        (status = 400, description = "Invalid file name"),
        (status = 404, description = "File not found")
    )
)]
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    Path(file_name): Path<String>,
) -> Result<Response<Body>, ApiError> {
    let (file, size) = state.storage.open(&file_name).await?;

    let content_type = mime_guess::from_path(&file_name)
        .first_or_octet_stream()
        .to_string();

    Response::builder()
        .header(header::CONTENT_TYPE, content_type)
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_header("attachment", &file_name),
        )
        .header(header::CONTENT_LENGTH, size)
        .body(Body::from_stream(ReaderStream::new(file)))
        .map_err(|e| {
            tracing::error!("Failed to build response: {}", e);
            ApiError::internal("Failed to build response")
        })
}

/// GET /thumbnails/:fileName - Fetch the thumbnail of an image.
#[utoipa::path(
    get,
    path = "/thumbnails/{fileName}",
    tag = "files",
    params(
        ("fileName" = String, Path, description = "Stored file name")
    ),
    responses(
        (status = 200, description = "Thumbnail image", content_type = "image/png"),
        (status = 400, description = "Invalid file name"),
        (status = 404, description = "No thumbnail for this file")
    )
)]
pub async fn get_thumbnail(
    State(state): State<Arc<AppState>>,
    Path(file_name): Path<String>,
) -> Result<Response<Body>, ApiError> {
    let content = state.storage.load_thumbnail(&file_name).await?;

    Response::builder()
        .header(header::CONTENT_TYPE, image_mime_type(&content))
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_header("inline", &file_name),
        )
        .header(header::CONTENT_LENGTH, content.len())
        .body(Body::from(content))
        .map_err(|e| {
            tracing::error!("Failed to build response: {}", e);
            ApiError::internal("Failed to build response")
        })
}

/// DELETE /delete/:fileName - Delete a file and its thumbnail.
#[utoipa::path(
    delete,
    path = "/delete/{fileName}",
    tag = "files",
    params(
        ("fileName" = String, Path, description = "Stored file name")
    ),
    responses(
        (status = 200, description = "File deleted", body = MessageResponse),
        (status = 400, description = "Invalid file name"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "File not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    AuthUser(_claims): AuthUser,
    Path(file_name): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let outcome = state.storage.delete(&file_name).await?;

    tracing::info!(
        file = %file_name,
        thumbnail = outcome.thumbnail_removed,
        "File deleted"
    );

    Ok(Json(MessageResponse::new("File deleted successfully")))
}

/// POST /rename - Rename a file and move its thumbnail.
#[utoipa::path(
    post,
    path = "/rename",
    tag = "files",
    request_body = RenameRequest,
    responses(
        (status = 200, description = "File renamed", body = RenameResponse),
        (status = 400, description = "Missing, invalid or identical names"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "File not found"),
        (status = 409, description = "Target name already exists"),
        (status = 500, description = "Rename failed")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn rename_file(
    State(state): State<Arc<AppState>>,
    AuthUser(_claims): AuthUser,
    ValidatedJson(req): ValidatedJson<RenameRequest>,
) -> Result<Json<RenameResponse>, ApiError> {
    let outcome = state.storage.rename(&req.old_name, &req.new_name).await?;

    tracing::info!(
        old = %req.old_name,
        new = %req.new_name,
        thumbnail = outcome.thumbnail_moved,
        "File renamed"
    );

    let (old_thumbnail_name, new_thumbnail_name) = if outcome.thumbnail_moved {
        (Some(req.old_name.clone()), Some(req.new_name.clone()))
    } else {
        (None, None)
    };

    Ok(Json(RenameResponse {
        success: true,
        message: "File renamed successfully".to_string(),
        old_name: req.old_name,
        new_name: req.new_name,
        old_thumbnail_name,
        new_thumbnail_name,
    }))
}
