use std::sync::Arc;

use crate::core::error::{AppError, Result};
use crate::features::auth::dtos::{
    AuthResponseDto, LoginRequestDto, LogoutResponseDto, RefreshTokenRequestDto,
    RegisterRequestDto, TokenPairResponseDto,
};
use crate::features::auth::repositories::RefreshTokenRepository;
use crate::features::auth::services::token_service::{hash_refresh_token, TokenService};
use crate::features::users::services::UserService;

/// Service for authentication operations (register, login, refresh, logout)
pub struct AuthService {
    users: Arc<UserService>,
    token_service: Arc<TokenService>,
    refresh_tokens: Arc<dyn RefreshTokenRepository>,
    registration_enabled: bool,
}

impl AuthService {
    pub fn new(
        users: Arc<UserService>,
        token_service: Arc<TokenService>,
        refresh_tokens: Arc<dyn RefreshTokenRepository>,
        registration_enabled: bool,
    ) -> Self {
        Self {
            users,
            token_service,
            refresh_tokens,
            registration_enabled,
        }
    }

    /// Register a new user
    pub async fn register(&self, dto: RegisterRequestDto) -> Result<AuthResponseDto> {
        if !self.registration_enabled {
            return Err(AppError::Forbidden("Registration is disabled".to_string()));
        }

        let password_hash = self.users.hash_password(&dto.password).await?;
        let user = self
            .users
            .create_user(&dto.first_name, &dto.last_name, &dto.email, &password_hash)
            .await?;

        let tokens = self.issue_token_pair(user.id, &user.email).await?;

        Ok(AuthResponseDto {
            tokens,
            user: user.into(),
        })
    }

    /// Login with email and password
    pub async fn login(&self, dto: LoginRequestDto) -> Result<AuthResponseDto> {
        let user = self
            .users
            .authenticate(&dto.email, &dto.password)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid email or password".to_string()))?;

        let tokens = self.issue_token_pair(user.id, &user.email).await?;
        tracing::debug!("User logged in: id={}", user.id);

        Ok(AuthResponseDto {
            tokens,
            user: user.into(),
        })
    }

    /// Exchange a refresh token for a new pair. The presented token is revoked.
    pub async fn refresh_token(&self, dto: RefreshTokenRequestDto) -> Result<TokenPairResponseDto> {
        let digest = hash_refresh_token(&dto.refresh_token);

        let stored = self
            .refresh_tokens
            .consume(&digest)
            .await?
            .ok_or_else(|| AppError::Auth("Invalid or expired refresh token".to_string()))?;

        // Email comes from the row, not the old access token, so email changes carry over
        let user = match self.users.get_user_by_id(stored.user_id).await {
            Ok(user) => user,
            Err(AppError::NotFound(_)) => {
                return Err(AppError::Auth("Invalid or expired refresh token".to_string()))
            }
            Err(e) => return Err(e),
        };

        self.issue_token_pair(user.id, &user.email).await
    }

    /// Revoke a refresh token. Unknown tokens are not an error.
    pub async fn logout(&self, dto: RefreshTokenRequestDto) -> Result<LogoutResponseDto> {
        let revoked = self
            .refresh_tokens
            .revoke(&hash_refresh_token(&dto.refresh_token))
            .await?;

        Ok(LogoutResponseDto { revoked })
    }

    /// Sign an access token and persist the digest of a fresh refresh token
    pub async fn issue_token_pair(&self, user_id: i64, email: &str) -> Result<TokenPairResponseDto> {
        let pair = self.token_service.generate_token_pair(user_id, email)?;

        self.refresh_tokens
            .create(
                &hash_refresh_token(&pair.refresh_token),
                user_id,
                pair.refresh_expires_at,
            )
            .await?;

        Ok(TokenPairResponseDto::new(
            pair,
            self.token_service.access_ttl_secs(),
        ))
    }

    /// Revoke every refresh token of a user (password or email change)
    pub async fn revoke_all_sessions(&self, user_id: i64) -> Result<u64> {
        let revoked = self.refresh_tokens.revoke_all_for_user(user_id).await?;
        if revoked > 0 {
            tracing::info!("Revoked {} refresh tokens for user {}", revoked, user_id);
        }
        Ok(revoked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::{jwt_config, MemoryDb};
    use crate::features::auth::services::PasswordHasher;

    struct Fixture {
        db: MemoryDb,
        tokens: Arc<TokenService>,
        service: AuthService,
    }

    fn fixture(registration_enabled: bool) -> Fixture {
        let db = MemoryDb::new();
        let users = Arc::new(UserService::new(
            Arc::new(db.clone()),
            PasswordHasher::new(4),
        ));
        let tokens = Arc::new(TokenService::new(&jwt_config()));
        let service = AuthService::new(
            users,
            Arc::clone(&tokens),
            Arc::new(db.clone()),
            registration_enabled,
        );
        Fixture {
            db,
            tokens,
            service,
        }
    }

    fn registration(email: &str) -> RegisterRequestDto {
        RegisterRequestDto {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: email.to_string(),
            password: "secret123".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_issues_valid_tokens() {
        let f = fixture(true);
        let response = f.service.register(registration("a@x.com")).await.unwrap();

        let user = f
            .tokens
            .validate_access_token(&response.tokens.access_token)
            .unwrap();
        assert_eq!(user.user_id, response.user.id);
        assert_eq!(user.email, "a@x.com");
        assert_eq!(response.tokens.token_type, "Bearer");
        assert_eq!(response.tokens.refresh_token.len(), 128);
        assert_eq!(f.db.refresh_token_count(), 1);
    }

    #[tokio::test]
    async fn test_register_disabled_is_forbidden() {
        let f = fixture(false);
        let err = f.service.register(registration("a@x.com")).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_login_rejects_wrong_password_and_unknown_user() {
        let f = fixture(true);
        f.service.register(registration("a@x.com")).await.unwrap();

        let wrong = f
            .service
            .login(LoginRequestDto {
                email: "a@x.com".to_string(),
                password: "nope".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(wrong, AppError::Unauthorized(_)));

        let unknown = f
            .service
            .login(LoginRequestDto {
                email: "ghost@x.com".to_string(),
                password: "secret123".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(unknown, AppError::Unauthorized(_)));

        let ok = f
            .service
            .login(LoginRequestDto {
                email: "a@x.com".to_string(),
                password: "secret123".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(ok.user.email, "a@x.com");
    }

    #[tokio::test]
    async fn test_refresh_rotates_the_token() {
        let f = fixture(true);
        let registered = f.service.register(registration("a@x.com")).await.unwrap();
        let original = registered.tokens.refresh_token;

        let rotated = f
            .service
            .refresh_token(RefreshTokenRequestDto {
                refresh_token: original.clone(),
            })
            .await
            .unwrap();
        assert_ne!(rotated.refresh_token, original);

        // The old token is spent
        let reuse = f
            .service
            .refresh_token(RefreshTokenRequestDto {
                refresh_token: original,
            })
            .await
            .unwrap_err();
        assert!(matches!(reuse, AppError::Auth(_)));
    }

    #[tokio::test]
    async fn test_logout_revokes_refresh_token() {
        let f = fixture(true);
        let registered = f.service.register(registration("a@x.com")).await.unwrap();
        let token = registered.tokens.refresh_token;

        let first = f
            .service
            .logout(RefreshTokenRequestDto {
                refresh_token: token.clone(),
            })
            .await
            .unwrap();
        assert!(first.revoked);

        let second = f
            .service
            .logout(RefreshTokenRequestDto {
                refresh_token: token.clone(),
            })
            .await
            .unwrap();
        assert!(!second.revoked);

        assert!(f
            .service
            .refresh_token(RefreshTokenRequestDto {
                refresh_token: token
            })
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_revoke_all_sessions() {
        let f = fixture(true);
        let registered = f.service.register(registration("a@x.com")).await.unwrap();
        f.service
            .issue_token_pair(registered.user.id, "a@x.com")
            .await
            .unwrap();

        assert_eq!(
            f.service
                .revoke_all_sessions(registered.user.id)
                .await
                .unwrap(),
            2
        );
        assert!(f
            .service
            .refresh_token(RefreshTokenRequestDto {
                refresh_token: registered.tokens.refresh_token
            })
            .await
            .is_err());
    }
}
