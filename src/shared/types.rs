use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// JSON envelope shared by every endpoint that does not stream raw bytes
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub meta: Option<Meta>,
    pub errors: Option<Vec<String>>,
}

/// Collection metadata; listings are not paginated, so only the count
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Meta {
    pub total: i64,
}

impl<T> ApiResponse<T> {
    pub fn success(data: Option<T>, message: Option<String>, meta: Option<Meta>) -> Self {
        Self {
            success: true,
            data,
            message,
            meta,
            errors: None,
        }
    }

    pub fn ok(data: T) -> Self {
        Self::success(Some(data), None, None)
    }

    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self::success(Some(data), Some(message.into()), None)
    }

    pub fn error(message: Option<String>, errors: Option<Vec<String>>) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            message,
            meta: None,
            errors,
        }
    }
}

impl<T> ApiResponse<Vec<T>> {
    /// A full listing with its length in `meta.total`
    pub fn list(items: Vec<T>) -> Self {
        let total = items.len() as i64;
        Self::success(Some(items), None, Some(Meta { total }))
    }
}
