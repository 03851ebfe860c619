use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::{distributions::Alphanumeric, rngs::OsRng, Rng};
use sha2::{Digest, Sha256};

use crate::core::config::JwtConfig;
use crate::core::error::{AppError, Result};
use crate::features::auth::model::{AccessClaims, AuthenticatedUser, TokenPair};
use crate::shared::constants::REFRESH_TOKEN_LENGTH;

/// Issues and verifies HS256 access tokens and mints opaque refresh tokens.
///
/// Built once at startup from [`JwtConfig`] and shared behind an `Arc`.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    pub fn new(config: &JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = config.leeway.as_secs();
        validation.validate_exp = true;

        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            access_ttl: Duration::seconds(config.access_ttl.as_secs() as i64),
            refresh_ttl: Duration::seconds(config.refresh_ttl.as_secs() as i64),
        }
    }

    /// Access token lifetime in seconds
    pub fn access_ttl_secs(&self) -> i64 {
        self.access_ttl.num_seconds()
    }

    pub fn generate_token_pair(&self, user_id: i64, email: &str) -> Result<TokenPair> {
        let now = Utc::now();
        let access_expires_at = now + self.access_ttl;

        let claims = AccessClaims {
            sub: user_id.to_string(),
            user_id,
            email: email.to_string(),
            iat: now.timestamp(),
            exp: access_expires_at.timestamp(),
        };

        let access_token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign access token: {}", e)))?;

        Ok(TokenPair {
            access_token,
            refresh_token: generate_refresh_token(),
            access_expires_at,
            refresh_expires_at: now + self.refresh_ttl,
        })
    }

    /// Verify signature, algorithm and expiry, returning the raw claims
    pub fn parse_access_token(&self, token: &str) -> Result<AccessClaims> {
        let data = decode::<AccessClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                tracing::debug!("Access token rejected: {}", e);
                AppError::Auth("Invalid or expired token".to_string())
            })?;

        let claims = data.claims;
        if claims.sub != claims.user_id.to_string() {
            return Err(AppError::Auth("Invalid token subject".to_string()));
        }

        Ok(claims)
    }

    pub fn validate_access_token(&self, token: &str) -> Result<AuthenticatedUser> {
        self.parse_access_token(token).map(AuthenticatedUser::from)
    }
}

/// Opaque refresh token drawn from the OS CSPRNG
fn generate_refresh_token() -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(REFRESH_TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// Digest under which a refresh token is stored
pub fn hash_refresh_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration as StdDuration;

    fn config(secret: &str) -> JwtConfig {
        JwtConfig {
            secret: secret.to_string(),
            access_ttl: StdDuration::from_secs(900),
            refresh_ttl: StdDuration::from_secs(7 * 24 * 3600),
            leeway: StdDuration::from_secs(0),
            bcrypt_cost: 4,
        }
    }

    fn service() -> TokenService {
        TokenService::new(&config("test-secret-that-is-long-enough-0123456789"))
    }

    #[test]
    fn test_issued_token_round_trips() {
        let service = service();
        let pair = service.generate_token_pair(42, "a@x.com").unwrap();

        let user = service.validate_access_token(&pair.access_token).unwrap();
        assert_eq!(user.user_id, 42);
        assert_eq!(user.email, "a@x.com");

        let claims = service.parse_access_token(&pair.access_token).unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.exp - claims.iat, 900);
        assert_eq!(claims.exp, pair.access_expires_at.timestamp());
    }

    #[test]
    fn test_refresh_token_shape() {
        let service = service();
        let pair = service.generate_token_pair(1, "a@x.com").unwrap();
        let other = service.generate_token_pair(1, "a@x.com").unwrap();

        assert_eq!(pair.refresh_token.len(), 128);
        assert!(pair.refresh_token.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(pair.refresh_token, other.refresh_token);
        assert!(pair.refresh_expires_at > pair.access_expires_at);
    }

    #[test]
    fn test_tampered_signature_is_rejected() {
        let service = service();
        let pair = service.generate_token_pair(7, "a@x.com").unwrap();

        let (head, signature) = pair.access_token.rsplit_once('.').unwrap();
        let mut signature: Vec<char> = signature.chars().collect();
        signature[5] = if signature[5] == 'x' { 'y' } else { 'x' };
        let token = format!("{}.{}", head, signature.into_iter().collect::<String>());

        let err = service.validate_access_token(&token).unwrap_err();
        assert!(matches!(err, AppError::Auth(_)));
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let issuer = TokenService::new(&config("another-secret-that-is-long-enough-9876543210"));
        let pair = issuer.generate_token_pair(7, "a@x.com").unwrap();

        assert!(service().validate_access_token(&pair.access_token).is_err());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let service = service();
        let issued = Utc::now() - Duration::hours(2);
        let claims = AccessClaims {
            sub: "7".to_string(),
            user_id: 7,
            email: "a@x.com".to_string(),
            iat: issued.timestamp(),
            exp: (issued + Duration::minutes(15)).timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &service.encoding_key).unwrap();

        let err = service.validate_access_token(&token).unwrap_err();
        assert!(matches!(err, AppError::Auth(_)));
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(service().validate_access_token("not.a.jwt").is_err());
        assert!(service().validate_access_token("").is_err());
    }

    #[test]
    fn test_refresh_token_digest_is_stable_hex() {
        let digest = hash_refresh_token("abc");
        assert_eq!(
            digest,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(hash_refresh_token("abc"), digest);
    }
}
