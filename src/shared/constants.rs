/// Prefix shared by every versioned API route
pub const API_PREFIX: &str = "/api/v1";

/// Content type used when a client does not declare one
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Multipart field carrying file content
pub const UPLOAD_FIELD_NAME: &str = "file";

/// Headroom added to the body limit for multipart boundaries and headers
pub const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Length of the opaque refresh token handed to clients
pub const REFRESH_TOKEN_LENGTH: usize = 128;

/// Token type reported alongside issued access tokens
pub const TOKEN_TYPE_BEARER: &str = "Bearer";
