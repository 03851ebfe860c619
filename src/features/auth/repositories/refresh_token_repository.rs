//! Refresh token persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::core::database::handle_db_error;
use crate::core::error::Result;
use crate::features::auth::model::RefreshToken;

/// Refresh tokens are stored by digest only; the raw token never reaches the database.
#[async_trait]
pub trait RefreshTokenRepository: Send + Sync {
    /// Persist a new, unrevoked token.
    async fn create(
        &self,
        token_hash: &str,
        user_id: i64,
        expires_at: DateTime<Utc>,
    ) -> Result<RefreshToken>;

    /// Atomically revoke a live token and return it. `None` when the token is
    /// unknown, expired or already revoked.
    async fn consume(&self, token_hash: &str) -> Result<Option<RefreshToken>>;

    /// Revoke a token. Returns whether a live token was revoked.
    async fn revoke(&self, token_hash: &str) -> Result<bool>;

    /// Revoke every live token of a user, returning how many were revoked.
    async fn revoke_all_for_user(&self, user_id: i64) -> Result<u64>;
}

pub struct PgRefreshTokenRepository {
    pool: PgPool,
}

impl PgRefreshTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RefreshTokenRepository for PgRefreshTokenRepository {
    async fn create(
        &self,
        token_hash: &str,
        user_id: i64,
        expires_at: DateTime<Utc>,
    ) -> Result<RefreshToken> {
        sqlx::query_as::<_, RefreshToken>(
            r#"
            INSERT INTO refresh_tokens (id, user_id, expires_at)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, expires_at, created_at, revoked
            "#,
        )
        .bind(token_hash)
        .bind(user_id)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| handle_db_error(e, "Refresh token already exists"))
    }

    async fn consume(&self, token_hash: &str) -> Result<Option<RefreshToken>> {
        let token = sqlx::query_as::<_, RefreshToken>(
            r#"
            UPDATE refresh_tokens
            SET revoked = TRUE
            WHERE id = $1 AND revoked = FALSE AND expires_at > NOW()
            RETURNING id, user_id, expires_at, created_at, revoked
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(token)
    }

    async fn revoke(&self, token_hash: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked = TRUE
            WHERE id = $1 AND revoked = FALSE
            "#,
        )
        .bind(token_hash)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn revoke_all_for_user(&self, user_id: i64) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked = TRUE
            WHERE user_id = $1 AND revoked = FALSE
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
