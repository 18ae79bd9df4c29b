use axum::{
    extract::{multipart::MultipartError, Multipart, Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::AppError;
use crate::core::extractor::AppJson;
use crate::features::access::{AccessLevel, Credential};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::files::dtos::{
    DeleteFileResponseDto, FileDownload, FileListResponseDto, FileResponseDto, ListFilesQuery,
    UpdateAccessLevelDto, UploadFileDto, UploadOptionsDto,
};
use crate::features::files::services::{FileService, UploadedFile};
use crate::shared::constants::DEFAULT_CONTENT_TYPE;
use crate::shared::types::ApiResponse;

/// Upload a file
///
/// Accepts multipart/form-data with:
/// - `file`: The file to upload (required)
/// - `customName`: Name to store instead of the uploaded filename (optional)
/// - `accessLevel`: "private" (default), "read-only" or "public"
#[utoipa::path(
    post,
    path = "/api/files/upload",
    tag = "files",
    request_body(
        content = UploadFileDto,
        content_type = "multipart/form-data",
        description = "File upload form with optional customName and accessLevel fields",
    ),
    responses(
        (status = 201, description = "File uploaded successfully", body = ApiResponse<FileResponseDto>),
        (status = 400, description = "Invalid file or validation error"),
        (status = 401, description = "Authentication required"),
        (status = 413, description = "File too large")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn upload_file(
    credential: Credential,
    State(service): State<Arc<FileService>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<FileResponseDto>>), AppError> {
    let mut file: Option<UploadedFile> = None;
    let mut options = UploadOptionsDto::default();

    // Process multipart fields
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "file" => {
                let content_type = field
                    .content_type()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

                let file_name = field.file_name().unwrap_or("").to_string();

                let data = field.bytes().await.map_err(multipart_error)?;

                file = Some(UploadedFile {
                    data: data.to_vec(),
                    file_name,
                    content_type,
                });
            }
            "customName" => {
                let text = field.text().await.map_err(multipart_error)?;
                if !text.trim().is_empty() {
                    options.custom_name = Some(text.trim().to_string());
                }
            }
            "accessLevel" => {
                let text = field.text().await.map_err(multipart_error)?;
                if !text.trim().is_empty() {
                    let level = text.parse::<AccessLevel>().map_err(AppError::Validation)?;
                    options.access_level = Some(level);
                }
            }
            _ => {
                // Ignore unknown fields
                debug!("Ignoring unknown field: {}", field_name);
            }
        }
    }

    let file = file.ok_or_else(|| AppError::BadRequest("File is required".to_string()))?;

    options
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let response = service
        .upload(&credential, file, options.custom_name, options.access_level)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(response), None, None)),
    ))
}

/// List files
///
/// Returns the caller's own files, newest first. `scope=all` lists every
/// principal's files and requires the admin role.
#[utoipa::path(
    get,
    path = "/api/files",
    tag = "files",
    params(ListFilesQuery),
    responses(
        (status = 200, description = "Files", body = ApiResponse<FileListResponseDto>),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Admin role required for scope=all")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_files(
    user: AuthenticatedUser,
    State(service): State<Arc<FileService>>,
    Query(query): Query<ListFilesQuery>,
) -> Result<Json<ApiResponse<FileListResponseDto>>, AppError> {
    let files = service.list(&user, query.scope).await?;

    Ok(Json(ApiResponse::success(
        Some(FileListResponseDto { files }),
        None,
        None,
    )))
}

/// Download a file
///
/// `id` is a file id, or a file name looked up among the caller's own files.
/// Authenticate with a bearer token, or with an API key passed as `?key=` or
/// `X-Api-Key`.
#[utoipa::path(
    get,
    path = "/api/files/{id}",
    tag = "files",
    params(
        ("id" = String, Path, description = "File id or file name"),
        ("key" = Option<String>, Query, description = "API key of the file owner")
    ),
    responses(
        (status = 200, description = "File contents", content_type = "application/octet-stream"),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "File not found")
    ),
    security(
        (),
        ("bearer_auth" = []),
        ("api_key" = [])
    )
)]
pub async fn download_file(
    credential: Credential,
    State(service): State<Arc<FileService>>,
    Path(file_ref): Path<String>,
) -> Result<Response, AppError> {
    let download = service.retrieve(&file_ref, &credential).await?;
    Ok(download_response(download))
}

/// Change a file's access level
///
/// Only the owner can change it. Setting the current level is a no-op.
#[utoipa::path(
    patch,
    path = "/api/files/{id}/access",
    tag = "files",
    params(("id" = Uuid, Path, description = "File id")),
    request_body = UpdateAccessLevelDto,
    responses(
        (status = 200, description = "Updated file", body = ApiResponse<FileResponseDto>),
        (status = 400, description = "Invalid access level"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Only the owner can modify this file"),
        (status = 404, description = "File not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_access_level(
    credential: Credential,
    State(service): State<Arc<FileService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<UpdateAccessLevelDto>,
) -> Result<Json<ApiResponse<FileResponseDto>>, AppError> {
    let response = service
        .update_access_level(id, dto.access_level, &credential)
        .await?;

    Ok(Json(ApiResponse::success(Some(response), None, None)))
}

/// Delete a file
///
/// Only the owner can delete it, at any access level.
#[utoipa::path(
    delete,
    path = "/api/files/{id}",
    tag = "files",
    params(("id" = Uuid, Path, description = "File id")),
    responses(
        (status = 200, description = "File deleted successfully", body = ApiResponse<DeleteFileResponseDto>),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Only the owner can modify this file"),
        (status = 404, description = "File not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_file(
    credential: Credential,
    State(service): State<Arc<FileService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<DeleteFileResponseDto>>, AppError> {
    let response = service.delete(id, &credential).await?;

    Ok(Json(ApiResponse::success(
        Some(response),
        Some("File deleted successfully".to_string()),
        None,
    )))
}

fn multipart_error(e: MultipartError) -> AppError {
    debug!("Failed to read multipart data: {}", e);
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge("Request body too large".to_string())
    } else {
        AppError::BadRequest(format!("Failed to read multipart data: {}", e))
    }
}

fn download_response(download: FileDownload) -> Response {
    let FileDownload { record, data } = download;

    let content_type = HeaderValue::from_str(&record.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_CONTENT_TYPE));

    let encoded = urlencoding::encode(&record.original_name);
    let disposition = format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        encoded, encoded
    );

    // URL-encoding leaves only visible ASCII, which is always a valid header value
    let disposition = HeaderValue::from_str(&disposition)
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    (
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
            (header::CONTENT_LENGTH, HeaderValue::from(data.len())),
        ],
        data,
    )
        .into_response()
}
