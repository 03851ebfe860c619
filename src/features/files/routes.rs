use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

use crate::features::files::handlers::{
    change_visibility, delete_file, download_by_id, download_by_name, get_file_info,
    get_file_info_by_id, get_storage_info, list_files, register_metadata, rename_file,
    set_file_status, upload_content,
};
use crate::features::files::services::FileService;
use crate::shared::constants::MULTIPART_OVERHEAD_BYTES;

/// Create routes for the files feature
pub fn routes(file_service: Arc<FileService>) -> Router {
    let upload_limit = file_service.max_upload_size() + MULTIPART_OVERHEAD_BYTES;

    Router::new()
        .route("/files", get(list_files))
        .route("/files/storage", get(get_storage_info))
        .route("/files/metadata", post(register_metadata))
        .route(
            "/files/by-id/{id}/content",
            post(upload_content).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/files/by-id/{id}", get(download_by_id))
        .route("/files/by-id/{id}/info", get(get_file_info_by_id))
        .route("/files/rename", put(rename_file))
        .route("/files/visibility", put(change_visibility))
        .route("/files/status", put(set_file_status))
        .route("/files/{name}", get(download_by_name).delete(delete_file))
        .route("/files/{name}/info", get(get_file_info))
        .with_state(file_service)
}
