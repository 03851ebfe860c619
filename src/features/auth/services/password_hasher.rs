use crate::core::error::{AppError, Result};

/// bcrypt hashing, run on the blocking pool so request workers stay free
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub async fn hash(&self, plaintext: &str) -> Result<String> {
        let plaintext = plaintext.to_owned();
        let cost = self.cost;

        tokio::task::spawn_blocking(move || bcrypt::hash(plaintext, cost))
            .await
            .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))?
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
    }

    /// `Ok(false)` on mismatch; a malformed stored hash is an internal error.
    pub async fn verify(&self, plaintext: &str, hash: &str) -> Result<bool> {
        let plaintext = plaintext.to_owned();
        let hash = hash.to_owned();

        tokio::task::spawn_blocking(move || bcrypt::verify(plaintext, &hash))
            .await
            .map_err(|e| AppError::Internal(format!("Password verification task failed: {}", e)))?
            .map_err(|e| AppError::Internal(format!("Failed to verify password: {}", e)))
    }
}
