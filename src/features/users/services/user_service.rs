use std::sync::Arc;

use crate::core::error::{AppError, Result};
use crate::features::auth::services::PasswordHasher;
use crate::features::users::models::User;
use crate::features::users::repositories::UserRepository;

/// User directory: account rows plus credential checks against them
pub struct UserService {
    repository: Arc<dyn UserRepository>,
    hasher: PasswordHasher,
}

impl UserService {
    pub fn new(repository: Arc<dyn UserRepository>, hasher: PasswordHasher) -> Self {
        Self { repository, hasher }
    }

    pub async fn hash_password(&self, plaintext: &str) -> Result<String> {
        self.hasher.hash(plaintext).await
    }

    pub async fn create_user(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User> {
        let user = self
            .repository
            .create(first_name, last_name, email, password_hash)
            .await?;
        tracing::info!("User created: id={}", user.id);
        Ok(user)
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<User> {
        self.repository.get_by_email(email).await
    }

    pub async fn get_user_by_id(&self, id: i64) -> Result<User> {
        self.repository.get_by_id(id).await
    }

    pub async fn update_user(
        &self,
        id: i64,
        first_name: &str,
        last_name: &str,
        password_hash: &str,
    ) -> Result<User> {
        self.repository
            .update(id, first_name, last_name, password_hash)
            .await
    }

    pub async fn update_user_email(&self, old_email: &str, new_email: &str) -> Result<User> {
        let user = self.repository.update_email(old_email, new_email).await?;
        tracing::info!("User email changed: id={}", user.id);
        Ok(user)
    }

    pub async fn delete_user(&self, email: &str) -> Result<User> {
        let user = self.repository.delete(email).await?;
        tracing::info!("User deleted: id={}", user.id);
        Ok(user)
    }

    /// Look up the user and verify the password.
    ///
    /// `Ok(None)` for an unknown email or a wrong password, so callers cannot
    /// tell the two apart.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Option<User>> {
        let user = match self.repository.get_by_email(email).await {
            Ok(user) => user,
            Err(AppError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };

        if self.hasher.verify(password, &user.password_hash).await? {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    /// Whether `password` is the current password of `email`. Unknown users yield `false`.
    pub async fn check_password(&self, email: &str, password: &str) -> Result<bool> {
        Ok(self.authenticate(email, password).await?.is_some())
    }
}
