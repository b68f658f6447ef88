use std::sync::Arc;

use chrono::Utc;
use tracing::instrument;
use uuid::Uuid;

use super::find_file;
use crate::error::AppError;
use crate::policy::{self, FileOperation};
use crate::records::{Contributor, FileRecord, PermissionLevel, UserId};
use crate::store::{FileStore, UserStore};

/// Owner-only management of a file's contributor entries.
///
/// Entries have no storage of their own: every change saves the parent file.
pub struct ContributorManager {
    files: Arc<dyn FileStore>,
    users: Arc<dyn UserStore>,
}

impl ContributorManager {
    pub fn new(files: Arc<dyn FileStore>, users: Arc<dyn UserStore>) -> Self {
        Self { files, users }
    }

    /// Append an entry for `user`. Adding the same user twice yields two entries.
    #[instrument(skip(self))]
    pub async fn add(
        &self,
        principal: UserId,
        file_id: Uuid,
        user: UserId,
        level: Option<PermissionLevel>,
    ) -> Result<(FileRecord, Uuid), AppError> {
        let mut file = find_file(&*self.files, file_id).await?;
        policy::authorize_file(principal, &file, FileOperation::ManageContributors)?;

        self.users
            .find_user(user)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;

        let contributor = Contributor::new(user, level.unwrap_or_default());
        let contributor_id = contributor.id;
        file.contributors.push(contributor);
        file.updated_at = Utc::now();

        self.files.save_file(&file).await?;
        tracing::info!(%contributor_id, "Contributor added");
        Ok((file, contributor_id))
    }

    #[instrument(skip(self))]
    pub async fn update(
        &self,
        principal: UserId,
        file_id: Uuid,
        contributor_id: Uuid,
        level: PermissionLevel,
    ) -> Result<FileRecord, AppError> {
        let mut file = find_file(&*self.files, file_id).await?;
        policy::authorize_file(principal, &file, FileOperation::ManageContributors)?;

        let now = Utc::now();
        let contributor = file
            .contributor_mut(contributor_id)
            .ok_or_else(|| AppError::NotFound("Contributor not found".into()))?;
        contributor.permission_level = level;
        contributor.updated_at = now;
        file.updated_at = now;

        self.files.save_file(&file).await?;
        Ok(file)
    }

    #[instrument(skip(self))]
    pub async fn remove(
        &self,
        principal: UserId,
        file_id: Uuid,
        contributor_id: Uuid,
    ) -> Result<FileRecord, AppError> {
        let mut file = find_file(&*self.files, file_id).await?;
        policy::authorize_file(principal, &file, FileOperation::ManageContributors)?;

        let position = file
            .contributors
            .iter()
            .position(|c| c.id == contributor_id)
            .ok_or_else(|| AppError::NotFound("Contributor not found".into()))?;
        file.contributors.remove(position);
        file.updated_at = Utc::now();

        self.files.save_file(&file).await?;
        Ok(file)
    }
}
