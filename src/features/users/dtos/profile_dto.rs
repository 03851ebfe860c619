use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::features::users::models::User;

/// Public view of a user account
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponseDto {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponseDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

/// Request DTO for updating names and, optionally, the password
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileDto {
    #[validate(length(min = 1, max = 100, message = "First name must be 1-100 characters"))]
    pub first_name: String,

    #[validate(length(min = 1, max = 100, message = "Last name must be 1-100 characters"))]
    pub last_name: String,

    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,

    /// Replaces the password when present
    #[validate(length(min = 6, max = 72, message = "Password must be 6-72 characters"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_password: Option<String>,
}

/// Request DTO for changing the login email
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ChangeEmailDto {
    #[validate(email(message = "Invalid email format"))]
    pub new_email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Request DTO for deleting the account
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct DeleteAccountDto {
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Response DTO for account deletion
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteAccountResponseDto {
    pub deleted: bool,
}
