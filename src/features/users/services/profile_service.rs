use std::sync::Arc;

use crate::core::error::{AppError, Result};
use crate::features::auth::dtos::AuthResponseDto;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::auth::services::AuthService;
use crate::features::files::services::FileService;
use crate::features::users::dtos::{
    ChangeEmailDto, DeleteAccountDto, UpdateProfileDto, UserResponseDto,
};
use crate::features::users::models::User;
use crate::features::users::services::UserService;

/// Self-service account management for the authenticated user.
///
/// Every mutation re-checks the password. The account row is looked up by
/// id, so an access token issued before an email change still resolves.
pub struct ProfileService {
    users: Arc<UserService>,
    auth: Arc<AuthService>,
    files: Arc<FileService>,
}

impl ProfileService {
    pub fn new(users: Arc<UserService>, auth: Arc<AuthService>, files: Arc<FileService>) -> Self {
        Self { users, auth, files }
    }

    pub async fn get_profile(&self, user: &AuthenticatedUser) -> Result<UserResponseDto> {
        let current = self.users.get_user_by_id(user.user_id).await?;
        Ok(current.into())
    }

    /// Replace names, and the password when `new_password` is set.
    /// A password change revokes every refresh token of the user.
    pub async fn update_profile(
        &self,
        user: &AuthenticatedUser,
        dto: UpdateProfileDto,
    ) -> Result<UserResponseDto> {
        let current = self.verify_password(user, &dto.current_password).await?;

        let password_hash = match &dto.new_password {
            Some(new_password) => self.users.hash_password(new_password).await?,
            None => current.password_hash.clone(),
        };

        let updated = self
            .users
            .update_user(current.id, &dto.first_name, &dto.last_name, &password_hash)
            .await?;

        if dto.new_password.is_some() {
            self.auth.revoke_all_sessions(current.id).await?;
        }

        Ok(updated.into())
    }

    /// Change the login email. Existing sessions are revoked and a new token
    /// pair carrying the new email is returned.
    pub async fn change_email(
        &self,
        user: &AuthenticatedUser,
        dto: ChangeEmailDto,
    ) -> Result<AuthResponseDto> {
        let current = self.verify_password(user, &dto.password).await?;

        let updated = self
            .users
            .update_user_email(&current.email, &dto.new_email)
            .await?;

        self.auth.revoke_all_sessions(updated.id).await?;
        let tokens = self.auth.issue_token_pair(updated.id, &updated.email).await?;

        Ok(AuthResponseDto {
            tokens,
            user: updated.into(),
        })
    }

    /// Delete the account with its file objects; rows and refresh tokens
    /// cascade with the user.
    pub async fn delete_account(
        &self,
        user: &AuthenticatedUser,
        dto: DeleteAccountDto,
    ) -> Result<()> {
        let current = self.verify_password(user, &dto.password).await?;

        // The token may predate an email change; purge as the stored account
        let owner = AuthenticatedUser::from(&current);
        let purged = self.files.purge_owner_objects(&owner).await?;
        self.users.delete_user(&current.email).await?;

        tracing::info!(
            "Account deleted: id={}, objects removed={}",
            current.id,
            purged
        );
        Ok(())
    }

    async fn verify_password(&self, user: &AuthenticatedUser, password: &str) -> Result<User> {
        let current = match self.users.get_user_by_id(user.user_id).await {
            Ok(current) => current,
            Err(AppError::NotFound(_)) => {
                return Err(AppError::Unauthorized("Account no longer exists".to_string()))
            }
            Err(e) => return Err(e),
        };

        self.users
            .authenticate(&current.email, password)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid password".to_string()))
    }
}
