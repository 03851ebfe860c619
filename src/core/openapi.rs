use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::auth;
use crate::features::files::{dtos as files_dtos, handlers as files_handlers, models as files_models};
use crate::features::users::{dtos as users_dtos, handlers as users_handlers};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Auth
        auth::handlers::register,
        auth::handlers::login,
        auth::handlers::refresh_token,
        auth::handlers::logout,
        // Users
        users_handlers::get_profile,
        users_handlers::update_profile,
        users_handlers::change_email,
        users_handlers::delete_account,
        // Files
        files_handlers::list_files,
        files_handlers::get_storage_info,
        files_handlers::register_metadata,
        files_handlers::upload_content,
        files_handlers::download_by_id,
        files_handlers::download_by_name,
        files_handlers::get_file_info,
        files_handlers::get_file_info_by_id,
        files_handlers::rename_file,
        files_handlers::change_visibility,
        files_handlers::set_file_status,
        files_handlers::delete_file,
    ),
    components(
        schemas(
            // Shared
            Meta,
            // Auth
            auth::model::AuthenticatedUser,
            auth::dtos::RegisterRequestDto,
            auth::dtos::LoginRequestDto,
            auth::dtos::RefreshTokenRequestDto,
            auth::dtos::TokenPairResponseDto,
            auth::dtos::AuthResponseDto,
            auth::dtos::LogoutResponseDto,
            ApiResponse<auth::dtos::AuthResponseDto>,
            ApiResponse<auth::dtos::TokenPairResponseDto>,
            ApiResponse<auth::dtos::LogoutResponseDto>,
            // Users
            users_dtos::UserResponseDto,
            users_dtos::UpdateProfileDto,
            users_dtos::ChangeEmailDto,
            users_dtos::DeleteAccountDto,
            users_dtos::DeleteAccountResponseDto,
            ApiResponse<users_dtos::UserResponseDto>,
            ApiResponse<users_dtos::DeleteAccountResponseDto>,
            // Files
            files_models::FileStatus,
            files_dtos::CreateFileMetadataDto,
            files_dtos::UploadFileContentDto,
            files_dtos::RenameFileDto,
            files_dtos::ChangeVisibilityDto,
            files_dtos::SetFileStatusDto,
            files_dtos::FileResponseDto,
            files_dtos::StorageInfoDto,
            files_dtos::DeleteFileResponseDto,
            ApiResponse<files_dtos::FileResponseDto>,
            ApiResponse<Vec<files_dtos::FileResponseDto>>,
            ApiResponse<files_dtos::StorageInfoDto>,
            ApiResponse<files_dtos::DeleteFileResponseDto>,
        )
    ),
    tags(
        (name = "auth", description = "Registration, login and token rotation"),
        (name = "users", description = "Profile and account management"),
        (name = "files", description = "File metadata, content and sharing"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Meemo API",
        version = "0.1.0",
        description = "API documentation for Meemo file storage",
    )
)]
pub struct ApiDoc;

/// Adds the Bearer JWT security scheme to the OpenAPI document
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
