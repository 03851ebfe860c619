//! Authentication feature.
//!
//! Credentials are checked against bcrypt hashes in the users table. A
//! successful login yields a short-lived HS256 access token and a single-use
//! refresh token whose SHA-256 digest is persisted so it can be rotated and
//! revoked.

pub mod dtos;
pub mod handlers;
pub mod model;
pub mod repositories;
pub mod routes;
pub mod services;

pub use services::{AuthService, TokenService};
