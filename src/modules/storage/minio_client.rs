//! MinIO/S3-compatible storage client
//!
//! Implements [`ObjectStore`] on top of the rust-s3 crate. The client keeps
//! one bucket handle for content and builds throwaway handles for the
//! administrative bucket operations.

use async_trait::async_trait;
use s3::creds::Credentials;
use s3::{Bucket, BucketConfiguration, Region};
use tracing::{debug, info, warn};

use crate::core::config::MinIOConfig;
use crate::core::error::AppError;
use crate::modules::storage::ObjectStore;

/// MinIO/S3-compatible storage client
pub struct MinIOClient {
    bucket: Box<Bucket>,
    region: Region,
    credentials: Credentials,
    endpoint: String,
}

/// Turn a non-2xx S3 status into an error, keeping 404 distinct
fn check_status(status: u16, action: &str, key: &str) -> Result<(), AppError> {
    match status {
        200..=299 => Ok(()),
        404 => Err(AppError::NotFound(format!("Object '{}' not found", key))),
        _ => Err(AppError::Storage(format!(
            "Failed to {} '{}': HTTP {}",
            action, key, status
        ))),
    }
}

impl MinIOClient {
    /// Create a new MinIO client from configuration
    pub fn new(config: MinIOConfig) -> Result<Self, AppError> {
        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| AppError::Internal(format!("Failed to create MinIO credentials: {}", e)))?;

        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        };

        let mut bucket = Bucket::new(&config.bucket, region.clone(), credentials.clone())
            .map_err(|e| AppError::Internal(format!("Failed to create MinIO bucket: {}", e)))?;

        // Use path-style URLs for MinIO (http://endpoint/bucket instead of http://bucket.endpoint)
        bucket.set_path_style();

        info!(
            "MinIO client configured for endpoint: {}, bucket: {}",
            config.endpoint,
            bucket.name()
        );

        Ok(Self {
            bucket,
            region,
            credentials,
            endpoint: config.endpoint,
        })
    }

    /// Ensure the content bucket exists, create if not
    pub async fn ensure_bucket_exists(&self) -> Result<(), AppError> {
        let name = self.bucket.name();
        // Creating an existing bucket fails on MinIO, which is fine here
        match self.create_bucket(&name).await {
            Ok(()) => {
                info!("Bucket '{}' created successfully", name);
                Ok(())
            }
            Err(e) => {
                let error_str = e.to_string();
                if error_str.contains("BucketAlreadyOwnedByYou")
                    || error_str.contains("BucketAlreadyExists")
                    || error_str.contains("already own it")
                    || error_str.contains("HTTP 409")
                {
                    debug!("Bucket '{}' already exists", name);
                } else {
                    warn!(
                        "Could not create bucket '{}' at {}: {}. Assuming it exists.",
                        name, self.endpoint, e
                    );
                }
                Ok(())
            }
        }
    }

    fn bucket_handle(&self, name: &str) -> Result<Box<Bucket>, AppError> {
        let mut bucket = Bucket::new(name, self.region.clone(), self.credentials.clone())
            .map_err(|e| AppError::Storage(format!("Invalid bucket '{}': {}", name, e)))?;
        bucket.set_path_style();
        Ok(bucket)
    }
}

#[async_trait]
impl ObjectStore for MinIOClient {
    fn bucket_name(&self) -> String {
        self.bucket.name()
    }

    async fn save_file(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<(), AppError> {
        let response = self
            .bucket
            .put_object_with_content_type(key, &data, content_type)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to upload file '{}': {}", key, e)))?;
        check_status(response.status_code(), "upload", key)?;

        debug!(
            "Uploaded {} bytes to '{}' in bucket '{}'",
            data.len(),
            key,
            self.bucket.name()
        );
        Ok(())
    }

    async fn get_file(&self, key: &str) -> Result<Vec<u8>, AppError> {
        let response = self
            .bucket
            .get_object(key)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to download file '{}': {}", key, e)))?;
        check_status(response.status_code(), "download", key)?;

        debug!(
            "Downloaded file '{}' from bucket '{}'",
            key,
            self.bucket.name()
        );
        Ok(response.to_vec())
    }

    async fn delete_file(&self, key: &str) -> Result<(), AppError> {
        let response = self
            .bucket
            .delete_object(key)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to delete file '{}': {}", key, e)))?;
        check_status(response.status_code(), "delete", key)?;

        debug!(
            "Deleted file '{}' from bucket '{}'",
            key,
            self.bucket.name()
        );
        Ok(())
    }

    async fn copy_file(&self, from_key: &str, to_key: &str) -> Result<(), AppError> {
        let status = self
            .bucket
            .copy_object_internal(from_key, to_key)
            .await
            .map_err(|e| {
                AppError::Storage(format!(
                    "Failed to copy '{}' to '{}': {}",
                    from_key, to_key, e
                ))
            })?;
        check_status(status, "copy", from_key)?;

        debug!("Copied '{}' to '{}'", from_key, to_key);
        Ok(())
    }

    async fn create_bucket(&self, name: &str) -> Result<(), AppError> {
        let response = Bucket::create_with_path_style(
            name,
            self.region.clone(),
            self.credentials.clone(),
            BucketConfiguration::default(),
        )
        .await
        .map_err(|e| AppError::Storage(format!("Failed to create bucket '{}': {}", name, e)))?;

        if !response.success() {
            return Err(AppError::Storage(format!(
                "Failed to create bucket '{}': HTTP {} {}",
                name, response.response_code, response.response_text
            )));
        }
        Ok(())
    }

    async fn delete_bucket(&self, name: &str) -> Result<(), AppError> {
        let status = self
            .bucket_handle(name)?
            .delete()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to delete bucket '{}': {}", name, e)))?;
        check_status(status, "delete bucket", name)?;

        info!("Bucket '{}' deleted", name);
        Ok(())
    }
}
