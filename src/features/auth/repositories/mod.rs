mod refresh_token_repository;

pub use refresh_token_repository::{PgRefreshTokenRepository, RefreshTokenRepository};
