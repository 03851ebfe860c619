use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::files::dtos::CreateFileMetadataDto;
use crate::features::files::models::{File, FileStatus, NewFile};
use crate::features::files::repositories::FileRepository;
use crate::features::files::services::quota::{QuotaPolicy, StorageInfo};
use crate::modules::storage::ObjectStore;

/// Object key for a file: `{owner_id}/{original_name}`
pub fn object_key(owner_id: i64, original_name: &str) -> String {
    format!("{}/{}", owner_id, original_name)
}

/// Service for file operations.
///
/// Metadata and content live in different stores with no shared
/// transaction, so each operation applies its writes in a fixed order:
/// metadata is registered before content is uploaded, content is written
/// before the row is marked active, and objects are removed before rows.
pub struct FileService {
    files: Arc<dyn FileRepository>,
    store: Arc<dyn ObjectStore>,
    quota: QuotaPolicy,
    max_upload_size: usize,
}

impl FileService {
    pub fn new(
        files: Arc<dyn FileRepository>,
        store: Arc<dyn ObjectStore>,
        quota: QuotaPolicy,
        max_upload_size: usize,
    ) -> Self {
        Self {
            files,
            store,
            quota,
            max_upload_size,
        }
    }

    pub fn max_upload_size(&self) -> usize {
        self.max_upload_size
    }

    /// Register a `pending` metadata row, provided the declared size fits the quota
    pub async fn register_metadata(
        &self,
        user: &AuthenticatedUser,
        dto: CreateFileMetadataDto,
    ) -> Result<File> {
        if dto.size_in_bytes > self.max_upload_size as i64 {
            return Err(AppError::BadRequest(format!(
                "File too large. Maximum size is {} bytes",
                self.max_upload_size
            )));
        }

        let used = self.files.get_total_used_space(user).await?;
        self.quota.check_registration(used, dto.size_in_bytes)?;

        let file = self
            .files
            .save(NewFile {
                user_id: user.user_id,
                s3_key: object_key(user.user_id, &dto.original_name),
                s3_bucket: self.store.bucket_name(),
                original_name: dto.original_name,
                mime_type: dto.mime_type,
                size_in_bytes: dto.size_in_bytes,
                is_public: dto.is_public,
            })
            .await?;

        info!(
            "File metadata registered: id={}, owner={}, size={}",
            file.id, file.user_id, file.size_in_bytes
        );
        Ok(file)
    }

    /// Store content for a registered file and mark it active.
    ///
    /// The quota is checked again against the real length before any bytes
    /// are written.
    pub async fn upload_content(
        &self,
        user: &AuthenticatedUser,
        file_id: i64,
        data: Vec<u8>,
    ) -> Result<File> {
        if data.len() > self.max_upload_size {
            return Err(AppError::BadRequest(format!(
                "File too large. Maximum size is {} bytes",
                self.max_upload_size
            )));
        }

        let file = self.files.get_owned_by_id(user, file_id).await?;
        let actual = data.len() as i64;

        let used = self.files.get_total_used_space(user).await?;
        self.quota.check_upload(used, file.size_in_bytes, actual)?;

        if actual != file.size_in_bytes {
            debug!(
                "Upload size differs from declared size: id={}, declared={}, actual={}",
                file.id, file.size_in_bytes, actual
            );
        }

        self.store
            .save_file(&file.s3_key, data, &file.mime_type)
            .await?;

        // A failure here leaves a pending row whose object already exists
        let file = self
            .files
            .mark_uploaded(user, file.id, actual)
            .await?;

        info!(
            "File content uploaded: id={}, bucket={}, size={}",
            file.id, file.s3_bucket, actual
        );
        Ok(file)
    }

    pub async fn list_files(&self, user: &AuthenticatedUser) -> Result<Vec<File>> {
        self.files.list(user).await
    }

    pub async fn get_file_info(&self, user: &AuthenticatedUser, name: &str) -> Result<File> {
        self.files
            .get_by_original_name_and_user_email(user, name)
            .await
    }

    /// Metadata by id: the owner's files, and public files of anyone
    pub async fn get_file_info_by_id(
        &self,
        user: &AuthenticatedUser,
        file_id: i64,
    ) -> Result<File> {
        self.files.get_readable_by_id(user, file_id).await
    }

    /// Owner-only download by name
    pub async fn download_by_name(
        &self,
        user: &AuthenticatedUser,
        name: &str,
    ) -> Result<(File, Vec<u8>)> {
        let file = self
            .files
            .get_by_original_name_and_user_email(user, name)
            .await?;
        self.read_content(file).await
    }

    /// Download by id: allowed for the owner and, for public files, anyone authenticated
    pub async fn download_by_id(
        &self,
        user: &AuthenticatedUser,
        file_id: i64,
    ) -> Result<(File, Vec<u8>)> {
        let file = self.files.get_readable_by_id(user, file_id).await?;
        self.read_content(file).await
    }

    async fn read_content(&self, file: File) -> Result<(File, Vec<u8>)> {
        if !file.status.has_content() {
            return Err(AppError::NotFound(
                "File content has not been uploaded".to_string(),
            ));
        }

        let data = self.store.get_file(&file.s3_key).await?;
        Ok((file, data))
    }

    /// Rename a file and move its object.
    ///
    /// The row is renamed first so name conflicts are caught by the database.
    /// If moving the object then fails, the row is renamed back.
    pub async fn rename_file(
        &self,
        user: &AuthenticatedUser,
        old_name: &str,
        new_name: &str,
    ) -> Result<File> {
        let file = self
            .files
            .get_by_original_name_and_user_email(user, old_name)
            .await?;

        if old_name == new_name {
            return Ok(file);
        }

        let new_key = object_key(file.user_id, new_name);
        let renamed = self
            .files
            .rename(user, old_name, new_name, &new_key)
            .await?;

        if file.status.has_content() {
            if let Err(e) = self.store.rename_file(&file.s3_key, &new_key).await {
                warn!(
                    "Moving object for file {} failed, restoring name '{}': {}",
                    file.id, old_name, e
                );
                if let Err(undo) = self
                    .files
                    .rename(user, new_name, old_name, &file.s3_key)
                    .await
                {
                    error!(
                        "Could not restore file {} to '{}' after failed move: {}",
                        file.id, old_name, undo
                    );
                }
                return Err(e);
            }
        }

        info!("File renamed: id={}", renamed.id);
        Ok(renamed)
    }

    pub async fn change_visibility(
        &self,
        user: &AuthenticatedUser,
        name: &str,
        is_public: bool,
    ) -> Result<File> {
        self.files
            .change_visibility(user, name, is_public)
            .await
    }

    pub async fn set_status(
        &self,
        user: &AuthenticatedUser,
        name: &str,
        status: FileStatus,
    ) -> Result<File> {
        self.files.set_status(user, name, status).await
    }

    /// Delete a file. Object removal is best effort; the row is always removed.
    pub async fn delete_file(&self, user: &AuthenticatedUser, name: &str) -> Result<File> {
        let file = self
            .files
            .get_by_original_name_and_user_email(user, name)
            .await?;

        if file.status.has_content() {
            if let Err(e) = self.store.delete_file(&file.s3_key).await {
                warn!(
                    "Failed to delete object '{}' for file {}: {}",
                    file.s3_key, file.id, e
                );
            }
        }

        let deleted = self.files.delete(user, name).await?;
        info!("File deleted: id={}", deleted.id);
        Ok(deleted)
    }

    pub async fn storage_info(&self, user: &AuthenticatedUser) -> Result<StorageInfo> {
        let used = self.files.get_total_used_space(user).await?;
        Ok(self.quota.storage_info(used))
    }

    /// Best-effort removal of every object owned by `owner`, ahead of
    /// deleting the account. Returns how many objects were removed.
    pub async fn purge_owner_objects(&self, owner: &AuthenticatedUser) -> Result<usize> {
        let files = self.files.list(owner).await?;
        let mut removed = 0;

        for file in files.iter().filter(|f| f.status.has_content()) {
            match self.store.delete_file(&file.s3_key).await {
                Ok(()) => removed += 1,
                Err(e) => warn!(
                    "Failed to delete object '{}' for file {}: {}",
                    file.s3_key, file.id, e
                ),
            }
        }

        Ok(removed)
    }
}
