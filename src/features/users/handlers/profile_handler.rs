use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::auth::dtos::AuthResponseDto;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::users::dtos::{
    ChangeEmailDto, DeleteAccountDto, DeleteAccountResponseDto, UpdateProfileDto,
    UserResponseDto,
};
use crate::features::users::services::ProfileService;
use crate::shared::types::ApiResponse;
use axum::{extract::State, Json};
use std::sync::Arc;
use validator::Validate;

#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    responses(
        (status = 200, description = "Profile retrieved successfully", body = ApiResponse<UserResponseDto>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "users",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_profile(
    user: AuthenticatedUser,
    State(service): State<Arc<ProfileService>>,
) -> Result<Json<ApiResponse<UserResponseDto>>> {
    let profile = service.get_profile(&user).await?;
    Ok(Json(ApiResponse::ok(profile)))
}

#[utoipa::path(
    put,
    path = "/api/v1/users/me",
    request_body = UpdateProfileDto,
    responses(
        (status = 200, description = "Profile updated successfully", body = ApiResponse<UserResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized or wrong password")
    ),
    tag = "users",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_profile(
    user: AuthenticatedUser,
    State(service): State<Arc<ProfileService>>,
    AppJson(dto): AppJson<UpdateProfileDto>,
) -> Result<Json<ApiResponse<UserResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let profile = service.update_profile(&user, dto).await?;
    Ok(Json(ApiResponse::with_message(profile, "Profile updated successfully")))
}

/// Change the login email; returns a fresh token pair
#[utoipa::path(
    put,
    path = "/api/v1/users/me/email",
    request_body = ChangeEmailDto,
    responses(
        (status = 200, description = "Email changed successfully", body = ApiResponse<AuthResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized or wrong password"),
        (status = 409, description = "Email already registered")
    ),
    tag = "users",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn change_email(
    user: AuthenticatedUser,
    State(service): State<Arc<ProfileService>>,
    AppJson(dto): AppJson<ChangeEmailDto>,
) -> Result<Json<ApiResponse<AuthResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let response = service.change_email(&user, dto).await?;
    Ok(Json(ApiResponse::with_message(response, "Email changed successfully")))
}

#[utoipa::path(
    delete,
    path = "/api/v1/users/me",
    request_body = DeleteAccountDto,
    responses(
        (status = 200, description = "Account deleted", body = ApiResponse<DeleteAccountResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized or wrong password")
    ),
    tag = "users",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_account(
    user: AuthenticatedUser,
    State(service): State<Arc<ProfileService>>,
    AppJson(dto): AppJson<DeleteAccountDto>,
) -> Result<Json<ApiResponse<DeleteAccountResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    service.delete_account(&user, dto).await?;
    Ok(Json(ApiResponse::with_message(
        DeleteAccountResponseDto { deleted: true },
        "Account deleted successfully",
    )))
}
