use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::features::auth::model::TokenPair;
use crate::features::users::dtos::UserResponseDto;
use crate::shared::constants::TOKEN_TYPE_BEARER;

/// Request DTO for user registration
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct RegisterRequestDto {
    #[validate(length(min = 1, max = 100, message = "First name must be 1-100 characters"))]
    pub first_name: String,

    #[validate(length(min = 1, max = 100, message = "Last name must be 1-100 characters"))]
    pub last_name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    // bcrypt only looks at the first 72 bytes
    #[validate(length(min = 6, max = 72, message = "Password must be 6-72 characters"))]
    pub password: String,
}

/// Request DTO for user login
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct LoginRequestDto {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Request DTO for token refresh and logout
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct RefreshTokenRequestDto {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

/// Access and refresh token pair
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenPairResponseDto {
    /// HS256 access token
    pub access_token: String,
    /// Token type (always "Bearer")
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
    /// Access token expiry instant
    pub expires_at: DateTime<Utc>,
    /// Opaque refresh token, single use
    pub refresh_token: String,
    pub refresh_expires_at: DateTime<Utc>,
}

impl TokenPairResponseDto {
    pub fn new(pair: TokenPair, expires_in: i64) -> Self {
        Self {
            access_token: pair.access_token,
            token_type: TOKEN_TYPE_BEARER.to_string(),
            expires_in,
            expires_at: pair.access_expires_at,
            refresh_token: pair.refresh_token,
            refresh_expires_at: pair.refresh_expires_at,
        }
    }
}

/// Response DTO for authentication (register/login/email change)
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponseDto {
    pub tokens: TokenPairResponseDto,
    pub user: UserResponseDto,
}

/// Response DTO for logout
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LogoutResponseDto {
    /// Whether a live refresh token was revoked
    pub revoked: bool,
}
