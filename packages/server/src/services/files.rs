use std::sync::Arc;

use chrono::Utc;
use common::storage::{BlobKey, BlobStore, BoxReader};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use super::find_file;
use crate::error::AppError;
use crate::models::shared::validate_bounded;
use crate::policy::{self, FileOperation};
use crate::records::{FileRecord, UserId};
use crate::store::FileStore;
use crate::utils::filename::validate_flat_filename;

/// An upload whose bytes are ready to be handed to the blob store.
pub struct NewFile {
    pub name: String,
    /// Declared by the client; guessed from `name` when absent.
    pub content_type: Option<String>,
    pub description: Option<String>,
    pub size: i64,
    pub reader: BoxReader,
}

/// Metadata edit. `owner` and every other field are not editable.
#[derive(Debug, Default)]
pub struct FileUpdate {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
}

/// Which files a listing covers. Every listed file is readable by the caller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ListScope {
    #[default]
    Owned,
    Shared,
    Accessible,
}

pub struct FileManager {
    files: Arc<dyn FileStore>,
    blobs: Arc<dyn BlobStore>,
}

impl FileManager {
    pub fn new(files: Arc<dyn FileStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { files, blobs }
    }

    /// Store the bytes, then persist metadata owned by `principal`.
    ///
    /// If the metadata insert fails the blob is removed again on a best-effort
    /// basis.
    #[instrument(skip(self, upload), fields(name = %upload.name, size = upload.size))]
    pub async fn create(&self, principal: UserId, upload: NewFile) -> Result<FileRecord, AppError> {
        let name = validate_flat_filename(&upload.name)
            .map_err(|e| AppError::Validation(e.message().into()))?
            .to_string();
        let content_type = resolve_content_type(upload.content_type.as_deref(), &name)?;
        let description = match upload.description {
            Some(d) if !d.trim().is_empty() => {
                Some(validate_bounded(&d, "Description", MAX_DESCRIPTION_CHARS)?)
            }
            _ => None,
        };

        let key = BlobKey::generate(&name);
        let stored = self.blobs.put_stream(&key, upload.reader).await?;

        let now = Utc::now();
        let record = FileRecord {
            id: Uuid::now_v7(),
            url: stored.location,
            name,
            content_type,
            description,
            blob_key: stored.key,
            size: upload.size,
            owner: principal,
            contributors: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        match self.files.insert_file(record).await {
            Ok(saved) => {
                tracing::info!(file_id = %saved.id, "File created");
                Ok(saved)
            }
            Err(e) => {
                if let Err(cleanup) = self.blobs.delete(&key).await {
                    tracing::warn!(key = %key, error = %cleanup, "Failed to remove orphaned blob");
                }
                Err(e.into())
            }
        }
    }

    pub async fn get(&self, principal: UserId, id: Uuid) -> Result<FileRecord, AppError> {
        let file = find_file(&*self.files, id).await?;
        policy::authorize_file(principal, &file, FileOperation::Read)?;
        Ok(file)
    }

    pub async fn list(
        &self,
        principal: UserId,
        scope: ListScope,
    ) -> Result<Vec<FileRecord>, AppError> {
        let files = match scope {
            ListScope::Owned => self.files.files_owned_by(principal).await?,
            ListScope::Shared => self.files.files_shared_with(principal).await?,
            ListScope::Accessible => {
                let mut all = self.files.files_owned_by(principal).await?;
                let shared = self.files.files_shared_with(principal).await?;
                // A file owned by the caller may also list them as contributor.
                all.extend(shared.into_iter().filter(|f| f.owner != principal));
                all.sort_by_key(|f| f.id);
                all
            }
        };

        Ok(files
            .into_iter()
            .filter(|f| policy::can_read(principal, f))
            .collect())
    }

    #[instrument(skip(self, update))]
    pub async fn update_metadata(
        &self,
        principal: UserId,
        id: Uuid,
        update: FileUpdate,
    ) -> Result<FileRecord, AppError> {
        let mut file = find_file(&*self.files, id).await?;
        policy::authorize_file(principal, &file, FileOperation::UpdateMetadata)?;

        if let Some(name) = update.name {
            file.name = validate_flat_filename(&name)
                .map_err(|e| AppError::Validation(e.message().into()))?
                .to_string();
        }
        if let Some(description) = update.description {
            file.description = match description {
                Some(d) => Some(validate_bounded(&d, "Description", MAX_DESCRIPTION_CHARS)?),
                None => None,
            };
        }
        file.updated_at = Utc::now();

        self.files.save_file(&file).await?;
        Ok(file)
    }

    /// Delete the blob, then the metadata.
    ///
    /// A blob store failure aborts before the metadata is touched, so the
    /// record stays and the caller can retry. A blob that is already gone
    /// does not block the delete.
    #[instrument(skip(self))]
    pub async fn delete(&self, principal: UserId, id: Uuid) -> Result<(), AppError> {
        let file = find_file(&*self.files, id).await?;
        policy::authorize_file(principal, &file, FileOperation::Delete)?;

        let key = BlobKey::parse(file.blob_key.as_str())?;
        let existed = self
            .blobs
            .delete(&key)
            .await
            .map_err(|e| AppError::StorageUnavailable(e.to_string()))?;
        if !existed {
            tracing::warn!(file_id = %file.id, key = %key, "Blob was already missing");
        }

        self.files.delete_file(file.id).await?;
        tracing::info!(file_id = %file.id, "File deleted");
        Ok(())
    }

    /// Open the blob for streaming. Bytes are not read until the caller polls.
    pub async fn open_download(
        &self,
        principal: UserId,
        id: Uuid,
    ) -> Result<(FileRecord, BoxReader), AppError> {
        let file = find_file(&*self.files, id).await?;
        policy::authorize_file(principal, &file, FileOperation::Download)?;

        let key = BlobKey::parse(file.blob_key.as_str())?;
        let reader = self.blobs.get_stream(&key).await?;
        Ok((file, reader))
    }
}

pub const MAX_DESCRIPTION_CHARS: usize = 4096;

fn resolve_content_type(declared: Option<&str>, name: &str) -> Result<String, AppError> {
    if let Some(declared) = declared.map(str::trim).filter(|d| !d.is_empty()) {
        return Ok(declared.to_string());
    }
    mime_guess::from_path(name)
        .first()
        .map(|m| m.to_string())
        .ok_or_else(|| AppError::Validation("Could not determine the file's content type".into()))
}
