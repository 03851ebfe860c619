use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Lifecycle of a file, stored as an INTEGER column
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type, Default,
)]
#[repr(i32)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    /// Metadata registered, no content yet
    #[default]
    Pending = 0,
    /// Content uploaded
    Active = 1,
    /// Archived by the owner; the row and content remain
    Deleted = 2,
}

impl FileStatus {
    pub fn has_content(self) -> bool {
        !matches!(self, FileStatus::Pending)
    }
}

/// Database model for file metadata
#[derive(Debug, Clone, FromRow)]
pub struct File {
    pub id: i64,
    pub user_id: i64,
    pub original_name: String,
    pub mime_type: String,
    pub size_in_bytes: i64,
    pub s3_bucket: String,
    pub s3_key: String,
    pub status: FileStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_public: bool,
}

/// Values for a new metadata row; id, status and timestamps are assigned on insert
#[derive(Debug, Clone)]
pub struct NewFile {
    pub user_id: i64,
    pub original_name: String,
    pub mime_type: String,
    pub s3_bucket: String,
    pub s3_key: String,
    pub size_in_bytes: i64,
    pub is_public: bool,
}
