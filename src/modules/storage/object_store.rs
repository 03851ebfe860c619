//! Object store abstraction for file content.
//!
//! Keys are opaque strings chosen by the caller; the file service derives
//! them from the owner id and the file name and stores them with the
//! metadata row.

use async_trait::async_trait;
use tracing::warn;

use crate::core::error::AppError;

#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    /// Name of the bucket objects are written to.
    fn bucket_name(&self) -> String;

    /// Store `data` under `key`, replacing any existing object.
    async fn save_file(&self, key: &str, data: Vec<u8>, content_type: &str)
        -> Result<(), AppError>;

    /// Read the object stored under `key`. Missing objects yield `NotFound`.
    async fn get_file(&self, key: &str) -> Result<Vec<u8>, AppError>;

    /// Remove the object stored under `key`.
    async fn delete_file(&self, key: &str) -> Result<(), AppError>;

    /// Server-side copy within the bucket.
    async fn copy_file(&self, from_key: &str, to_key: &str) -> Result<(), AppError>;

    /// Create a bucket.
    async fn create_bucket(&self, name: &str) -> Result<(), AppError>;

    /// Delete an (empty) bucket.
    async fn delete_bucket(&self, name: &str) -> Result<(), AppError>;

    /// Move an object to a new key: copy, then delete the source.
    ///
    /// Not atomic. A failed copy is returned to the caller. A failed delete
    /// after a successful copy leaves the object under both keys; it is
    /// logged and the rename still counts as done.
    async fn rename_file(&self, from_key: &str, to_key: &str) -> Result<(), AppError> {
        if from_key == to_key {
            return Ok(());
        }

        self.copy_file(from_key, to_key).await?;

        if let Err(e) = self.delete_file(from_key).await {
            warn!(
                "Object copied to '{}' but source '{}' could not be removed: {}",
                to_key, from_key, e
            );
        }

        Ok(())
    }
}
