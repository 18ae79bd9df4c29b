use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::features::access::AccessLevel;
use crate::features::files::models::FileRecord;

/// Upload file request DTO for OpenAPI documentation
/// Note: This struct is for Swagger UI documentation only.
/// The actual handler uses axum's Multipart extractor directly.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
#[schema(rename_all = "camelCase")]
pub struct UploadFileDto {
    /// The file to upload
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub file: String,
    /// Name to store instead of the uploaded filename
    #[schema(example = "quarterly-report.pdf")]
    pub custom_name: Option<String>,
    /// Initial access level (defaults to "private")
    pub access_level: Option<AccessLevel>,
}

/// Optional text fields of the upload form, validated once collected
#[derive(Debug, Default, Validate)]
pub struct UploadOptionsDto {
    #[validate(
        length(min = 1, max = 255, message = "customName must be 1-255 characters"),
        regex(
            path = "*crate::shared::validation::FILE_NAME_REGEX",
            message = "customName must not contain path separators or control characters"
        )
    )]
    pub custom_name: Option<String>,
    pub access_level: Option<AccessLevel>,
}

/// File metadata as returned to clients
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileResponseDto {
    pub file_id: Uuid,
    /// Principal that uploaded the file
    pub owner_id: String,
    #[schema(example = "quarterly-report.pdf")]
    pub original_name: String,
    #[schema(example = "application/pdf")]
    pub content_type: String,
    /// Size in bytes
    pub file_size: i64,
    pub access_level: AccessLevel,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<FileRecord> for FileResponseDto {
    fn from(file: FileRecord) -> Self {
        Self {
            file_id: file.id,
            owner_id: file.owner_id.to_string(),
            original_name: file.original_name,
            content_type: file.content_type,
            file_size: file.file_size,
            access_level: file.access_level,
            created_at: file.created_at,
            updated_at: file.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FileListResponseDto {
    pub files: Vec<FileResponseDto>,
}

/// Which files to list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ListScope {
    /// The caller's own files
    #[default]
    Own,
    /// Every principal's files (admin only)
    All,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct ListFilesQuery {
    /// `own` (default) or `all`
    #[serde(default)]
    pub scope: ListScope,
}

/// Request DTO for changing a file's access level
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccessLevelDto {
    pub access_level: AccessLevel,
}

/// Response DTO for delete operations
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteFileResponseDto {
    pub file_id: Uuid,
    pub deleted: bool,
}

/// Bytes and headers of a retrieved file
pub struct FileDownload {
    pub record: FileRecord,
    pub data: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_options_validation() {
        let ok = UploadOptionsDto {
            custom_name: Some("report (final).pdf".to_string()),
            access_level: None,
        };
        assert!(ok.validate().is_ok());

        assert!(UploadOptionsDto::default().validate().is_ok());

        for bad in ["", "../etc/passwd", "a/b", "a\\b", "tab\there", ".", ".."] {
            let dto = UploadOptionsDto {
                custom_name: Some(bad.to_string()),
                access_level: None,
            };
            assert!(dto.validate().is_err(), "{:?} should be rejected", bad);
        }

        let too_long = UploadOptionsDto {
            custom_name: Some("a".repeat(256)),
            access_level: None,
        };
        assert!(too_long.validate().is_err());
    }

    #[test]
    fn test_update_access_level_rejects_unknown_levels() {
        let dto: UpdateAccessLevelDto =
            serde_json::from_str(r#"{"accessLevel":"read-only"}"#).unwrap();
        assert_eq!(dto.access_level, AccessLevel::ReadOnly);

        assert!(serde_json::from_str::<UpdateAccessLevelDto>(r#"{"accessLevel":"shared"}"#).is_err());
    }

    #[test]
    fn test_list_scope_defaults_to_own() {
        let query: ListFilesQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.scope, ListScope::Own);

        let query: ListFilesQuery = serde_json::from_str(r#"{"scope":"all"}"#).unwrap();
        assert_eq!(query.scope, ListScope::All);
    }
}
