use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::features::files::models::{File, FileStatus};
use crate::features::files::services::StorageInfo;
use crate::shared::validation::is_valid_file_name;

fn validate_file_name(name: &str) -> Result<(), ValidationError> {
    if is_valid_file_name(name) {
        Ok(())
    } else {
        Err(ValidationError::new("file_name").with_message(
            "File name must be 1-255 characters without '/' or control characters".into(),
        ))
    }
}

/// Request DTO for registering file metadata ahead of the content upload
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateFileMetadataDto {
    #[validate(custom(function = "validate_file_name"))]
    #[schema(example = "doc.pdf")]
    pub original_name: String,

    #[validate(length(min = 1, max = 255, message = "MIME type must be 1-255 characters"))]
    #[schema(example = "application/pdf")]
    pub mime_type: String,

    /// Declared content length, checked against the quota
    #[validate(range(min = 0, message = "Size must not be negative"))]
    #[schema(example = 500)]
    pub size_in_bytes: i64,

    #[serde(default)]
    pub is_public: bool,
}

/// Multipart body for content upload.
/// Note: This struct is for Swagger UI documentation only.
/// The actual handler uses axum's Multipart extractor directly.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadFileContentDto {
    /// The file content
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub file: String,
}

/// Request DTO for renaming a file
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct RenameFileDto {
    #[validate(custom(function = "validate_file_name"))]
    pub old_name: String,

    #[validate(custom(function = "validate_file_name"))]
    pub new_name: String,
}

/// Request DTO for toggling public read access
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ChangeVisibilityDto {
    #[validate(custom(function = "validate_file_name"))]
    pub original_name: String,

    pub is_public: bool,
}

/// Request DTO for setting the lifecycle status
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct SetFileStatusDto {
    #[validate(custom(function = "validate_file_name"))]
    pub original_name: String,

    pub status: FileStatus,
}

/// Response DTO for file metadata
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FileResponseDto {
    pub id: i64,
    pub original_name: String,
    pub mime_type: String,
    pub size_in_bytes: i64,
    pub status: FileStatus,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<File> for FileResponseDto {
    fn from(file: File) -> Self {
        Self {
            id: file.id,
            original_name: file.original_name,
            mime_type: file.mime_type,
            size_in_bytes: file.size_in_bytes,
            status: file.status,
            is_public: file.is_public,
            created_at: file.created_at,
            updated_at: file.updated_at,
        }
    }
}

/// Response DTO for storage usage
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StorageInfoDto {
    pub used_bytes: i64,
    pub available_bytes: i64,
    pub total_bytes: i64,
}

impl From<StorageInfo> for StorageInfoDto {
    fn from(info: StorageInfo) -> Self {
        Self {
            used_bytes: info.used,
            available_bytes: info.available,
            total_bytes: info.total,
        }
    }
}

/// Response DTO for delete operations
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteFileResponseDto {
    /// Confirmation that the file was deleted
    pub deleted: bool,
}

/// Build a `Content-Disposition` value for a download.
///
/// Names without an extension get one from the MIME subtype
/// (`notes` + `text/plain` -> `notes.plain`), except for generic binary.
pub fn content_disposition(original_name: &str, mime_type: &str) -> String {
    let filename = download_file_name(original_name, mime_type);

    let ascii_fallback: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii() && !c.is_ascii_control() && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        ascii_fallback,
        urlencoding::encode(&filename)
    )
}

fn download_file_name(original_name: &str, mime_type: &str) -> String {
    let has_extension = original_name
        .rsplit_once('.')
        .is_some_and(|(stem, ext)| !stem.is_empty() && !ext.is_empty());
    if has_extension {
        return original_name.to_string();
    }

    match extension_from_mime_type(mime_type) {
        Some(ext) => format!("{}.{}", original_name, ext),
        None => original_name.to_string(),
    }
}

/// Extension derived from a MIME subtype, e.g. `image/svg+xml` -> `svg`
fn extension_from_mime_type(mime_type: &str) -> Option<String> {
    let essence = mime_type.split(';').next()?.trim();
    let (_, subtype) = essence.split_once('/')?;
    let subtype = subtype.split('+').next()?.trim().to_ascii_lowercase();

    if subtype.is_empty()
        || subtype == "octet-stream"
        || !subtype.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
    {
        return None;
    }

    Some(subtype)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_with_extensions_are_kept() {
        assert_eq!(download_file_name("doc.pdf", "application/pdf"), "doc.pdf");
        assert_eq!(download_file_name("archive.tar.gz", "application/gzip"), "archive.tar.gz");
    }

    #[test]
    fn test_extension_is_derived_from_mime_subtype() {
        assert_eq!(download_file_name("photo", "image/png"), "photo.png");
        assert_eq!(download_file_name("logo", "image/svg+xml"), "logo.svg");
        assert_eq!(
            download_file_name("readme", "text/markdown; charset=utf-8"),
            "readme.markdown"
        );
        assert_eq!(download_file_name(".env", "text/plain"), ".env.plain");
    }

    #[test]
    fn test_generic_binary_gets_no_extension() {
        assert_eq!(download_file_name("blob", "application/octet-stream"), "blob");
        assert_eq!(download_file_name("blob", "garbage"), "blob");
    }

    #[test]
    fn test_content_disposition_escapes_unicode_and_quotes() {
        assert_eq!(
            content_disposition("doc.pdf", "application/pdf"),
            "attachment; filename=\"doc.pdf\"; filename*=UTF-8''doc.pdf"
        );
        assert_eq!(
            content_disposition("résumé \"v2\".txt", "text/plain"),
            "attachment; filename=\"r_sum_ _v2_.txt\"; filename*=UTF-8''r%C3%A9sum%C3%A9%20%22v2%22.txt"
        );
    }

    #[test]
    fn test_metadata_dto_validation() {
        let mut dto = CreateFileMetadataDto {
            original_name: "doc.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            size_in_bytes: 500,
            is_public: false,
        };
        assert!(dto.validate().is_ok());

        dto.original_name = "../etc/passwd".to_string();
        assert!(dto.validate().is_err());

        dto.original_name = "doc.pdf".to_string();
        dto.size_in_bytes = -1;
        assert!(dto.validate().is_err());
    }
}
