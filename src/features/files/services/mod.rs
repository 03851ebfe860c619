mod file_service;
mod quota;

pub use file_service::FileService;
pub use quota::{QuotaPolicy, StorageInfo};
