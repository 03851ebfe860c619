use crate::core::config::DatabaseConfig;
use crate::core::error::AppError;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;

/// PostgreSQL SQLSTATE for unique constraint violations
const UNIQUE_VIOLATION: &str = "23505";

/// PostgreSQL SQLSTATE for foreign key violations
const FOREIGN_KEY_VIOLATION: &str = "23503";

pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
        .connect(&config.url)
        .await
}

/// Map constraint violations to domain errors, everything else stays a database error.
///
/// `conflict_message` is what the caller wants to tell the client when a
/// unique constraint fires (duplicate email, duplicate file name, ...).
pub fn handle_db_error(e: sqlx::Error, conflict_message: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        match db_err.code().as_deref() {
            Some(UNIQUE_VIOLATION) => {
                return AppError::Conflict(conflict_message.to_string());
            }
            Some(FOREIGN_KEY_VIOLATION) => {
                return AppError::NotFound("Referenced record does not exist".to_string());
            }
            _ => {}
        }
    }

    AppError::Database(e)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_constraint_errors_stay_database_errors() {
        let err = handle_db_error(sqlx::Error::RowNotFound, "duplicate");
        assert!(matches!(err, AppError::Database(sqlx::Error::RowNotFound)));
    }
}
