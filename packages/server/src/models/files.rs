use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::shared::{UserRef, double_option};
use crate::records::{Contributor, FileRecord, PermissionLevel};
use crate::services::{FileUpdate, ListScope, UserDirectory};

/// Query parameters for listing files.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct FileListQuery {
    /// `owned` (default), `shared` or `accessible`.
    #[serde(default)]
    #[param(inline)]
    pub scope: ListScope,
}

/// Request body for editing file metadata.
///
/// Only `name` and `description` are editable; any other field, `owner`
/// included, is ignored.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateFileRequest {
    /// New display name (1-256 characters).
    #[schema(example = "q3-report.pdf")]
    pub name: Option<String>,
    /// Omit to keep, `null` to clear.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
}

impl From<UpdateFileRequest> for FileUpdate {
    fn from(req: UpdateFileRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
        }
    }
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct AddContributorRequest {
    /// User to grant access to.
    pub user_id: Uuid,
    /// Defaults to `read_only`.
    #[serde(default)]
    pub permission_level: Option<PermissionLevel>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateContributorRequest {
    pub permission_level: PermissionLevel,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ContributorResponse {
    /// Identifier of this entry within its file.
    pub id: Uuid,
    pub user: UserRef,
    pub permission_level: PermissionLevel,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContributorResponse {
    fn build(c: Contributor, users: &UserDirectory) -> Self {
        Self {
            id: c.id,
            user: users.user_ref(c.user),
            permission_level: c.permission_level,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct FileResponse {
    pub id: Uuid,
    /// Blob location.
    pub url: String,
    #[schema(example = "report.pdf")]
    pub name: String,
    #[schema(example = "application/pdf")]
    pub content_type: String,
    pub description: Option<String>,
    /// Size in bytes.
    pub size: i64,
    pub owner: UserRef,
    pub contributors: Vec<ContributorResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FileResponse {
    pub fn build(file: FileRecord, users: &UserDirectory) -> Self {
        Self {
            id: file.id,
            url: file.url,
            name: file.name,
            content_type: file.content_type,
            description: file.description,
            size: file.size,
            owner: users.user_ref(file.owner),
            contributors: file
                .contributors
                .into_iter()
                .map(|c| ContributorResponse::build(c, users))
                .collect(),
            created_at: file.created_at,
            updated_at: file.updated_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct FileListResponse {
    pub data: Vec<FileResponse>,
    pub total: u64,
}

/// Short form used inside label views.
#[derive(Serialize, utoipa::ToSchema)]
pub struct FileSummary {
    pub id: Uuid,
    pub name: String,
    pub content_type: String,
    pub size: i64,
    pub owner: Uuid,
}

impl From<FileRecord> for FileSummary {
    fn from(file: FileRecord) -> Self {
        Self {
            id: file.id,
            name: file.name,
            content_type: file.content_type,
            size: file.size,
            owner: file.owner,
        }
    }
}
