use async_trait::async_trait;
use sqlx::PgPool;

use crate::core::database::handle_db_error;
use crate::core::error::{AppError, Result};
use crate::features::users::models::User;

const USER_COLUMNS: &str = "id, first_name, last_name, email, password_hash, created_at";
const EMAIL_TAKEN: &str = "A user with this email already exists";

/// User directory keyed by unique email.
///
/// Lookups and mutations of a missing user return `NotFound`; duplicate
/// emails return `Conflict`.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User>;

    async fn get_by_email(&self, email: &str) -> Result<User>;

    async fn get_by_id(&self, id: i64) -> Result<User>;

    async fn update(
        &self,
        id: i64,
        first_name: &str,
        last_name: &str,
        password_hash: &str,
    ) -> Result<User>;

    async fn update_email(&self, old_email: &str, new_email: &str) -> Result<User>;

    /// Removes the user; files and refresh tokens go with it.
    async fn delete(&self, email: &str) -> Result<User>;
}

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn user_not_found() -> AppError {
    AppError::NotFound("User not found".to_string())
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User> {
        let sql = format!(
            "INSERT INTO users (first_name, last_name, email, password_hash) \
             VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
        );

        sqlx::query_as::<_, User>(&sql)
            .bind(first_name)
            .bind(last_name)
            .bind(email)
            .bind(password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| handle_db_error(e, EMAIL_TAKEN))
    }

    async fn get_by_email(&self, email: &str) -> Result<User> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");

        sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(user_not_found)
    }

    async fn get_by_id(&self, id: i64) -> Result<User> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");

        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(user_not_found)
    }

    async fn update(
        &self,
        id: i64,
        first_name: &str,
        last_name: &str,
        password_hash: &str,
    ) -> Result<User> {
        let sql = format!(
            "UPDATE users SET first_name = $2, last_name = $3, password_hash = $4 \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        );

        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(first_name)
            .bind(last_name)
            .bind(password_hash)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(user_not_found)
    }

    async fn update_email(&self, old_email: &str, new_email: &str) -> Result<User> {
        let sql = format!(
            "UPDATE users SET email = $2 WHERE email = $1 RETURNING {USER_COLUMNS}"
        );

        sqlx::query_as::<_, User>(&sql)
            .bind(old_email)
            .bind(new_email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| handle_db_error(e, EMAIL_TAKEN))?
            .ok_or_else(user_not_found)
    }

    async fn delete(&self, email: &str) -> Result<User> {
        let sql = format!("DELETE FROM users WHERE email = $1 RETURNING {USER_COLUMNS}");

        sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(user_not_found)
    }
}
