use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::files::FileSummary;
use crate::records::Label;
use crate::services::{LabelUpdate, NewLabel, ResolvedLabel};

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateLabelRequest {
    /// 1-64 characters.
    #[schema(example = "urgent")]
    pub name: String,
    /// 1-32 characters, any notation.
    #[schema(example = "red")]
    pub color: String,
}

impl From<CreateLabelRequest> for NewLabel {
    fn from(req: CreateLabelRequest) -> Self {
        Self {
            name: req.name,
            color: req.color,
        }
    }
}

/// Rename or recolor. An `owner` field in the body is ignored.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateLabelRequest {
    #[schema(example = "soon")]
    pub name: Option<String>,
    #[schema(example = "#ff8800")]
    pub color: Option<String>,
}

impl From<UpdateLabelRequest> for LabelUpdate {
    fn from(req: UpdateLabelRequest) -> Self {
        Self {
            name: req.name,
            color: req.color,
        }
    }
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct LabelListQuery {
    /// Only labels that reference this file.
    pub file_id: Option<Uuid>,
}

/// Label as listed: file references are ids only.
#[derive(Serialize, utoipa::ToSchema)]
pub struct LabelResponse {
    pub id: Uuid,
    pub owner: Uuid,
    pub name: String,
    pub color: String,
    /// In link order; may repeat.
    pub file_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Label> for LabelResponse {
    fn from(label: Label) -> Self {
        Self {
            id: label.id,
            owner: label.owner,
            name: label.name,
            color: label.color,
            file_ids: label.files,
            created_at: label.created_at,
            updated_at: label.updated_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct LabelListResponse {
    pub data: Vec<LabelResponse>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct LabelFileEntry {
    pub id: Uuid,
    /// `null` when the file was deleted or is not readable by the caller.
    pub file: Option<FileSummary>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct LabelDetailResponse {
    pub id: Uuid,
    pub owner: Uuid,
    pub name: String,
    pub color: String,
    pub files: Vec<LabelFileEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ResolvedLabel> for LabelDetailResponse {
    fn from(resolved: ResolvedLabel) -> Self {
        let ResolvedLabel { label, files } = resolved;
        Self {
            id: label.id,
            owner: label.owner,
            name: label.name,
            color: label.color,
            files: files
                .into_iter()
                .map(|(id, file)| LabelFileEntry {
                    id,
                    file: file.map(FileSummary::from),
                })
                .collect(),
            created_at: label.created_at,
            updated_at: label.updated_at,
        }
    }
}
