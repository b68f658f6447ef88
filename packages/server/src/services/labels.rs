use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::instrument;
use uuid::Uuid;

use super::find_file;
use crate::error::AppError;
use crate::models::shared::validate_bounded;
use crate::policy::{self, LabelOperation};
use crate::records::{FileRecord, Label, UserId};
use crate::store::{FileStore, LabelStore};

pub const MAX_LABEL_NAME_CHARS: usize = 64;
pub const MAX_LABEL_COLOR_CHARS: usize = 32;

#[derive(Debug)]
pub struct NewLabel {
    pub name: String,
    pub color: String,
}

#[derive(Debug, Default)]
pub struct LabelUpdate {
    pub name: Option<String>,
    pub color: Option<String>,
}

/// A label with each file reference dereferenced, in sequence order.
///
/// `None` marks a reference to a file that no longer exists or that the
/// viewer cannot read.
#[derive(Debug)]
pub struct ResolvedLabel {
    pub label: Label,
    pub files: Vec<(Uuid, Option<FileRecord>)>,
}

pub struct LabelManager {
    labels: Arc<dyn LabelStore>,
    files: Arc<dyn FileStore>,
}

impl LabelManager {
    pub fn new(labels: Arc<dyn LabelStore>, files: Arc<dyn FileStore>) -> Self {
        Self { labels, files }
    }

    #[instrument(skip(self, new))]
    pub async fn create(&self, principal: UserId, new: NewLabel) -> Result<Label, AppError> {
        let now = Utc::now();
        let label = Label {
            id: Uuid::now_v7(),
            owner: principal,
            name: validate_bounded(&new.name, "Name", MAX_LABEL_NAME_CHARS)?,
            color: validate_bounded(&new.color, "Color", MAX_LABEL_COLOR_CHARS)?,
            files: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        Ok(self.labels.insert_label(label).await?)
    }

    pub async fn get(&self, principal: UserId, id: Uuid) -> Result<Label, AppError> {
        let label = self.find_label(id).await?;
        policy::authorize_label(principal, &label, LabelOperation::Read)?;
        Ok(label)
    }

    /// The caller's labels, optionally only those referencing `file_id`.
    pub async fn list(
        &self,
        principal: UserId,
        file_id: Option<Uuid>,
    ) -> Result<Vec<Label>, AppError> {
        let labels = match file_id {
            Some(file_id) => self.labels.labels_with_file(principal, file_id).await?,
            None => self.labels.labels_owned_by(principal).await?,
        };
        Ok(labels)
    }

    #[instrument(skip(self, update))]
    pub async fn update(
        &self,
        principal: UserId,
        id: Uuid,
        update: LabelUpdate,
    ) -> Result<Label, AppError> {
        let mut label = self.find_label(id).await?;
        policy::authorize_label(principal, &label, LabelOperation::Update)?;

        if let Some(name) = update.name {
            label.name = validate_bounded(&name, "Name", MAX_LABEL_NAME_CHARS)?;
        }
        if let Some(color) = update.color {
            label.color = validate_bounded(&color, "Color", MAX_LABEL_COLOR_CHARS)?;
        }
        label.updated_at = Utc::now();

        self.labels.save_label(&label).await?;
        Ok(label)
    }

    /// Append `file_id` to the label. Linking the same file again adds a
    /// second reference. The file only has to exist; [`Self::resolve`] hides
    /// files the label owner cannot read.
    #[instrument(skip(self))]
    pub async fn link_file(
        &self,
        principal: UserId,
        id: Uuid,
        file_id: Uuid,
    ) -> Result<(), AppError> {
        let label = self.find_label(id).await?;
        policy::authorize_label(principal, &label, LabelOperation::LinkFile)?;

        let file = find_file(&*self.files, file_id).await?;

        self.labels.append_label_file(label.id, file.id).await?;
        Ok(())
    }

    /// Remove the label. Files it referenced are untouched.
    #[instrument(skip(self))]
    pub async fn delete(&self, principal: UserId, id: Uuid) -> Result<(), AppError> {
        let label = self.find_label(id).await?;
        policy::authorize_label(principal, &label, LabelOperation::Delete)?;

        self.labels.delete_label(label.id).await?;
        Ok(())
    }

    pub async fn resolve(
        &self,
        principal: UserId,
        label: Label,
    ) -> Result<ResolvedLabel, AppError> {
        let mut ids = label.files.clone();
        ids.sort_unstable();
        ids.dedup();

        let found: HashMap<Uuid, FileRecord> = self
            .files
            .files_by_ids(&ids)
            .await?
            .into_iter()
            .map(|f| (f.id, f))
            .collect();

        let files = label
            .files
            .iter()
            .map(|id| match found.get(id) {
                Some(f) if policy::can_read(principal, f) => (*id, Some(f.clone())),
                Some(_) => (*id, None),
                None => {
                    tracing::warn!(label_id = %label.id, file_id = %id, "Dangling file reference");
                    (*id, None)
                }
            })
            .collect();

        Ok(ResolvedLabel { label, files })
    }

    async fn find_label(&self, id: Uuid) -> Result<Label, AppError> {
        self.labels
            .find_label(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Label not found".into()))
    }
}
