//! File metadata and content management.
//!
//! Metadata rows live in PostgreSQL, content in the object store under
//! `{owner_id}/{original_name}`. Every query is scoped by the owner's email;
//! files owned by someone else look exactly like missing files.

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;

pub use routes::routes;
pub use services::FileService;
