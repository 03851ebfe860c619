//! User accounts and self-service profile management.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | GET | `/api/v1/users/me` | Current profile |
//! | PUT | `/api/v1/users/me` | Update names and optionally the password |
//! | PUT | `/api/v1/users/me/email` | Change the login email |
//! | DELETE | `/api/v1/users/me` | Delete the account and its files |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;

pub use routes::routes;
pub use services::ProfileService;
