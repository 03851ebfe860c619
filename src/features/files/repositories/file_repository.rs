//! File metadata persistence.
//!
//! Authorization lives in the queries: every lookup or mutation joins
//! `files` to `users` and filters on both the owner's id and email from the
//! access token. A row owned by someone else, or a token whose email no
//! longer belongs to its user id, matches nothing and surfaces as
//! `NotFound`, the same as a row that does not exist.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::core::database::handle_db_error;
use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::files::models::{File, FileStatus, NewFile};

const NAME_TAKEN: &str = "A file with this name already exists";

#[async_trait]
pub trait FileRepository: Send + Sync {
    /// Insert a `pending` row. `Conflict` when the owner already has a file with this name.
    async fn save(&self, file: NewFile) -> Result<File>;

    async fn get_by_original_name_and_user_email(
        &self,
        owner: &AuthenticatedUser,
        original_name: &str,
    ) -> Result<File>;

    /// Matches when the viewer owns the file or the file is public.
    async fn get_readable_by_id(&self, viewer: &AuthenticatedUser, id: i64) -> Result<File>;

    async fn get_owned_by_id(&self, owner: &AuthenticatedUser, id: i64) -> Result<File>;

    /// Newest first.
    async fn list(&self, owner: &AuthenticatedUser) -> Result<Vec<File>>;

    async fn delete(&self, owner: &AuthenticatedUser, original_name: &str) -> Result<File>;

    /// `Conflict` when `new_name` is taken by the same owner; neither row changes.
    async fn rename(
        &self,
        owner: &AuthenticatedUser,
        old_name: &str,
        new_name: &str,
        new_key: &str,
    ) -> Result<File>;

    async fn change_visibility(
        &self,
        owner: &AuthenticatedUser,
        original_name: &str,
        is_public: bool,
    ) -> Result<File>;

    async fn set_status(
        &self,
        owner: &AuthenticatedUser,
        original_name: &str,
        status: FileStatus,
    ) -> Result<File>;

    /// Record the real content length and mark the file `active`.
    async fn mark_uploaded(
        &self,
        owner: &AuthenticatedUser,
        id: i64,
        actual_size: i64,
    ) -> Result<File>;

    /// Sum of `size_in_bytes` over every file of the owner, zero when there are none.
    async fn get_total_used_space(&self, owner: &AuthenticatedUser) -> Result<i64>;
}

pub struct PgFileRepository {
    pool: PgPool,
}

impl PgFileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn file_not_found() -> AppError {
    AppError::NotFound("File not found".to_string())
}

#[async_trait]
impl FileRepository for PgFileRepository {
    async fn save(&self, file: NewFile) -> Result<File> {
        sqlx::query_as::<_, File>(
            r#"
            INSERT INTO files (user_id, original_name, mime_type, size_in_bytes, s3_bucket, s3_key, status, is_public)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(file.user_id)
        .bind(&file.original_name)
        .bind(&file.mime_type)
        .bind(file.size_in_bytes)
        .bind(&file.s3_bucket)
        .bind(&file.s3_key)
        .bind(FileStatus::Pending)
        .bind(file.is_public)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| handle_db_error(e, NAME_TAKEN))
    }

    async fn get_by_original_name_and_user_email(
        &self,
        owner: &AuthenticatedUser,
        original_name: &str,
    ) -> Result<File> {
        sqlx::query_as::<_, File>(
            r#"
            SELECT f.*
            FROM files f
            JOIN users u ON u.id = f.user_id
            WHERE u.id = $1 AND u.email = $2 AND f.original_name = $3
            "#,
        )
        .bind(owner.user_id)
        .bind(&owner.email)
        .bind(original_name)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(file_not_found)
    }

    async fn get_readable_by_id(&self, viewer: &AuthenticatedUser, id: i64) -> Result<File> {
        sqlx::query_as::<_, File>(
            r#"
            SELECT f.*
            FROM files f
            JOIN users u ON u.id = f.user_id
            WHERE f.id = $3 AND ((u.id = $1 AND u.email = $2) OR f.is_public)
            "#,
        )
        .bind(viewer.user_id)
        .bind(&viewer.email)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(file_not_found)
    }

    async fn get_owned_by_id(&self, owner: &AuthenticatedUser, id: i64) -> Result<File> {
        sqlx::query_as::<_, File>(
            r#"
            SELECT f.*
            FROM files f
            JOIN users u ON u.id = f.user_id
            WHERE f.id = $3 AND u.id = $1 AND u.email = $2
            "#,
        )
        .bind(owner.user_id)
        .bind(&owner.email)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(file_not_found)
    }

    async fn list(&self, owner: &AuthenticatedUser) -> Result<Vec<File>> {
        let files = sqlx::query_as::<_, File>(
            r#"
            SELECT f.*
            FROM files f
            JOIN users u ON u.id = f.user_id
            WHERE u.id = $1 AND u.email = $2
            ORDER BY f.created_at DESC, f.id DESC
            "#,
        )
        .bind(owner.user_id)
        .bind(&owner.email)
        .fetch_all(&self.pool)
        .await?;

        Ok(files)
    }

    async fn delete(&self, owner: &AuthenticatedUser, original_name: &str) -> Result<File> {
        sqlx::query_as::<_, File>(
            r#"
            DELETE FROM files f
            USING users u
            WHERE f.user_id = u.id AND u.id = $1 AND u.email = $2 AND f.original_name = $3
            RETURNING f.*
            "#,
        )
        .bind(owner.user_id)
        .bind(&owner.email)
        .bind(original_name)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(file_not_found)
    }

    async fn rename(
        &self,
        owner: &AuthenticatedUser,
        old_name: &str,
        new_name: &str,
        new_key: &str,
    ) -> Result<File> {
        sqlx::query_as::<_, File>(
            r#"
            UPDATE files f
            SET original_name = $4, s3_key = $5, updated_at = NOW()
            FROM users u
            WHERE f.user_id = u.id AND u.id = $1 AND u.email = $2 AND f.original_name = $3
            RETURNING f.*
            "#,
        )
        .bind(owner.user_id)
        .bind(&owner.email)
        .bind(old_name)
        .bind(new_name)
        .bind(new_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| handle_db_error(e, NAME_TAKEN))?
        .ok_or_else(file_not_found)
    }

    async fn change_visibility(
        &self,
        owner: &AuthenticatedUser,
        original_name: &str,
        is_public: bool,
    ) -> Result<File> {
        sqlx::query_as::<_, File>(
            r#"
            UPDATE files f
            SET is_public = $4, updated_at = NOW()
            FROM users u
            WHERE f.user_id = u.id AND u.id = $1 AND u.email = $2 AND f.original_name = $3
            RETURNING f.*
            "#,
        )
        .bind(owner.user_id)
        .bind(&owner.email)
        .bind(original_name)
        .bind(is_public)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(file_not_found)
    }

    async fn set_status(
        &self,
        owner: &AuthenticatedUser,
        original_name: &str,
        status: FileStatus,
    ) -> Result<File> {
        sqlx::query_as::<_, File>(
            r#"
            UPDATE files f
            SET status = $4, updated_at = NOW()
            FROM users u
            WHERE f.user_id = u.id AND u.id = $1 AND u.email = $2 AND f.original_name = $3
            RETURNING f.*
            "#,
        )
        .bind(owner.user_id)
        .bind(&owner.email)
        .bind(original_name)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(file_not_found)
    }

    async fn mark_uploaded(
        &self,
        owner: &AuthenticatedUser,
        id: i64,
        actual_size: i64,
    ) -> Result<File> {
        sqlx::query_as::<_, File>(
            r#"
            UPDATE files f
            SET size_in_bytes = $4, status = $5, updated_at = NOW()
            FROM users u
            WHERE f.user_id = u.id AND u.id = $1 AND u.email = $2 AND f.id = $3
            RETURNING f.*
            "#,
        )
        .bind(owner.user_id)
        .bind(&owner.email)
        .bind(id)
        .bind(actual_size)
        .bind(FileStatus::Active)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(file_not_found)
    }

    async fn get_total_used_space(&self, owner: &AuthenticatedUser) -> Result<i64> {
        let used = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COALESCE(SUM(f.size_in_bytes), 0)::BIGINT
            FROM files f
            JOIN users u ON u.id = f.user_id
            WHERE u.id = $1 AND u.email = $2
            "#,
        )
        .bind(owner.user_id)
        .bind(&owner.email)
        .fetch_one(&self.pool)
        .await?;

        Ok(used)
    }
}
