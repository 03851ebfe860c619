use axum::{
    extract::{Multipart, Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::debug;
use validator::Validate;

use crate::core::error::AppError;
use crate::core::extractor::AppJson;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::files::dtos::{
    content_disposition, ChangeVisibilityDto, CreateFileMetadataDto, DeleteFileResponseDto,
    FileResponseDto, RenameFileDto, SetFileStatusDto, StorageInfoDto, UploadFileContentDto,
};
use crate::features::files::models::File;
use crate::features::files::services::FileService;
use crate::shared::constants::{DEFAULT_MIME_TYPE, UPLOAD_FIELD_NAME};
use crate::shared::types::ApiResponse;

fn parse_file_id(raw: &str) -> Result<i64, AppError> {
    raw.parse::<i64>()
        .map_err(|_| AppError::BadRequest(format!("Invalid file id '{}'", raw)))
}

/// Raw bytes with the stored MIME type and an attachment disposition
fn file_download_response(file: File, data: Vec<u8>) -> Response {
    let content_type = HeaderValue::from_str(&file.mime_type)
        .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_MIME_TYPE));
    let disposition = HeaderValue::from_str(&content_disposition(
        &file.original_name,
        &file.mime_type,
    ))
    .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    (
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        data,
    )
        .into_response()
}

/// List the caller's files, newest first
#[utoipa::path(
    get,
    path = "/api/v1/files",
    tag = "files",
    responses(
        (status = 200, description = "Files retrieved successfully", body = ApiResponse<Vec<FileResponseDto>>),
        (status = 401, description = "Authentication required")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_files(
    user: AuthenticatedUser,
    State(service): State<Arc<FileService>>,
) -> Result<Json<ApiResponse<Vec<FileResponseDto>>>, AppError> {
    let files: Vec<FileResponseDto> = service
        .list_files(&user)
        .await?
        .into_iter()
        .map(FileResponseDto::from)
        .collect();

    Ok(Json(ApiResponse::list(files)))
}

/// Storage usage against the quota
#[utoipa::path(
    get,
    path = "/api/v1/files/storage",
    tag = "files",
    responses(
        (status = 200, description = "Storage usage", body = ApiResponse<StorageInfoDto>),
        (status = 401, description = "Authentication required")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_storage_info(
    user: AuthenticatedUser,
    State(service): State<Arc<FileService>>,
) -> Result<Json<ApiResponse<StorageInfoDto>>, AppError> {
    let info = service.storage_info(&user).await?;
    Ok(Json(ApiResponse::ok(info.into())))
}

/// Register file metadata ahead of the content upload
#[utoipa::path(
    post,
    path = "/api/v1/files/metadata",
    tag = "files",
    request_body = CreateFileMetadataDto,
    responses(
        (status = 201, description = "Metadata registered", body = ApiResponse<FileResponseDto>),
        (status = 400, description = "Validation error or quota exceeded"),
        (status = 401, description = "Authentication required"),
        (status = 409, description = "A file with this name already exists")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn register_metadata(
    user: AuthenticatedUser,
    State(service): State<Arc<FileService>>,
    AppJson(dto): AppJson<CreateFileMetadataDto>,
) -> Result<(StatusCode, Json<ApiResponse<FileResponseDto>>), AppError> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let file = service.register_metadata(&user, dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(file.into())),
    ))
}

/// Upload content for a registered file
///
/// Accepts multipart/form-data with a single `file` field.
#[utoipa::path(
    post,
    path = "/api/v1/files/by-id/{id}/content",
    tag = "files",
    params(
        ("id" = i64, Path, description = "File id returned by metadata registration")
    ),
    request_body(
        content = UploadFileContentDto,
        content_type = "multipart/form-data",
    ),
    responses(
        (status = 200, description = "Content uploaded", body = ApiResponse<FileResponseDto>),
        (status = 400, description = "Missing file field, file too large or quota exceeded"),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "File not found"),
        (status = 413, description = "Request body too large")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn upload_content(
    user: AuthenticatedUser,
    State(service): State<Arc<FileService>>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<FileResponseDto>>, AppError> {
    let file_id = parse_file_id(&id)?;
    let mut file_data: Option<Vec<u8>> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        debug!("Failed to read multipart field: {}", e);
        AppError::BadRequest(format!("Failed to read multipart data: {}", e))
    })? {
        let field_name = field.name().unwrap_or("").to_string();

        if field_name == UPLOAD_FIELD_NAME {
            let data = field.bytes().await.map_err(|e| {
                debug!("Failed to read file bytes: {}", e);
                AppError::BadRequest(format!("Failed to read file data: {}", e))
            })?;
            file_data = Some(data.to_vec());
        } else {
            debug!("Ignoring unknown field: {}", field_name);
        }
    }

    let file_data =
        file_data.ok_or_else(|| AppError::BadRequest("File is required".to_string()))?;

    let file = service.upload_content(&user, file_id, file_data).await?;
    Ok(Json(ApiResponse::with_message(file.into(), "File uploaded successfully")))
}

/// Download a file by id (owner, or anyone for public files)
#[utoipa::path(
    get,
    path = "/api/v1/files/by-id/{id}",
    tag = "files",
    params(
        ("id" = i64, Path, description = "File id")
    ),
    responses(
        (status = 200, description = "File content", content_type = "application/octet-stream"),
        (status = 400, description = "Invalid file id"),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "File not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn download_by_id(
    user: AuthenticatedUser,
    State(service): State<Arc<FileService>>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let file_id = parse_file_id(&id)?;
    let (file, data) = service.download_by_id(&user, file_id).await?;
    Ok(file_download_response(file, data))
}

/// Metadata by id (owner, or anyone for public files)
#[utoipa::path(
    get,
    path = "/api/v1/files/by-id/{id}/info",
    tag = "files",
    params(
        ("id" = i64, Path, description = "File id")
    ),
    responses(
        (status = 200, description = "File metadata", body = ApiResponse<FileResponseDto>),
        (status = 400, description = "Invalid file id"),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "File not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_file_info_by_id(
    user: AuthenticatedUser,
    State(service): State<Arc<FileService>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<FileResponseDto>>, AppError> {
    let file_id = parse_file_id(&id)?;
    let file = service.get_file_info_by_id(&user, file_id).await?;
    Ok(Json(ApiResponse::ok(file.into())))
}

/// Download one of the caller's files by name
#[utoipa::path(
    get,
    path = "/api/v1/files/{name}",
    tag = "files",
    params(
        ("name" = String, Path, description = "Original file name")
    ),
    responses(
        (status = 200, description = "File content", content_type = "application/octet-stream"),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "File not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn download_by_name(
    user: AuthenticatedUser,
    State(service): State<Arc<FileService>>,
    Path(name): Path<String>,
) -> Result<Response, AppError> {
    let (file, data) = service.download_by_name(&user, &name).await?;
    Ok(file_download_response(file, data))
}

/// Metadata for one of the caller's files
#[utoipa::path(
    get,
    path = "/api/v1/files/{name}/info",
    tag = "files",
    params(
        ("name" = String, Path, description = "Original file name")
    ),
    responses(
        (status = 200, description = "File metadata", body = ApiResponse<FileResponseDto>),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "File not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_file_info(
    user: AuthenticatedUser,
    State(service): State<Arc<FileService>>,
    Path(name): Path<String>,
) -> Result<Json<ApiResponse<FileResponseDto>>, AppError> {
    let file = service.get_file_info(&user, &name).await?;
    Ok(Json(ApiResponse::ok(file.into())))
}

/// Rename a file
#[utoipa::path(
    put,
    path = "/api/v1/files/rename",
    tag = "files",
    request_body = RenameFileDto,
    responses(
        (status = 200, description = "File renamed", body = ApiResponse<FileResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "File not found"),
        (status = 409, description = "Target name already in use")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn rename_file(
    user: AuthenticatedUser,
    State(service): State<Arc<FileService>>,
    AppJson(dto): AppJson<RenameFileDto>,
) -> Result<Json<ApiResponse<FileResponseDto>>, AppError> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let file = service
        .rename_file(&user, &dto.old_name, &dto.new_name)
        .await?;
    Ok(Json(ApiResponse::ok(file.into())))
}

/// Make a file public or private
#[utoipa::path(
    put,
    path = "/api/v1/files/visibility",
    tag = "files",
    request_body = ChangeVisibilityDto,
    responses(
        (status = 200, description = "Visibility updated", body = ApiResponse<FileResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "File not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn change_visibility(
    user: AuthenticatedUser,
    State(service): State<Arc<FileService>>,
    AppJson(dto): AppJson<ChangeVisibilityDto>,
) -> Result<Json<ApiResponse<FileResponseDto>>, AppError> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let file = service
        .change_visibility(&user, &dto.original_name, dto.is_public)
        .await?;
    Ok(Json(ApiResponse::ok(file.into())))
}

/// Set the lifecycle status of a file
#[utoipa::path(
    put,
    path = "/api/v1/files/status",
    tag = "files",
    request_body = SetFileStatusDto,
    responses(
        (status = 200, description = "Status updated", body = ApiResponse<FileResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "File not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn set_file_status(
    user: AuthenticatedUser,
    State(service): State<Arc<FileService>>,
    AppJson(dto): AppJson<SetFileStatusDto>,
) -> Result<Json<ApiResponse<FileResponseDto>>, AppError> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let file = service
        .set_status(&user, &dto.original_name, dto.status)
        .await?;
    Ok(Json(ApiResponse::ok(file.into())))
}

/// Delete a file and its content
#[utoipa::path(
    delete,
    path = "/api/v1/files/{name}",
    tag = "files",
    params(
        ("name" = String, Path, description = "Original file name")
    ),
    responses(
        (status = 200, description = "File deleted successfully", body = ApiResponse<DeleteFileResponseDto>),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "File not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_file(
    user: AuthenticatedUser,
    State(service): State<Arc<FileService>>,
    Path(name): Path<String>,
) -> Result<Json<ApiResponse<DeleteFileResponseDto>>, AppError> {
    service.delete_file(&user, &name).await?;

    Ok(Json(ApiResponse::with_message(
        DeleteFileResponseDto { deleted: true },
        "File deleted successfully",
    )))
}
