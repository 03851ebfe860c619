mod profile_service;
mod user_service;

pub use profile_service::ProfileService;
pub use user_service::UserService;
