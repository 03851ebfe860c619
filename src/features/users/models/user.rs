use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::features::auth::model::AuthenticatedUser;

/// Database model for users
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for AuthenticatedUser {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
        }
    }
}
