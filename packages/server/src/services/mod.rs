//! Lifecycle managers for files, contributors and labels.
//!
//! Every operation follows the same order: load the record (`NotFound` if
//! absent), ask [`crate::policy`] (`PermissionDenied` on deny), then mutate
//! and persist. Nothing is written before the policy has allowed it.

pub mod contributors;
pub mod files;
pub mod labels;

use std::collections::HashMap;

use uuid::Uuid;

pub use contributors::ContributorManager;
pub use files::{FileManager, FileUpdate, ListScope, NewFile};
pub use labels::{LabelManager, LabelUpdate, NewLabel, ResolvedLabel};

use crate::error::AppError;
use crate::models::shared::UserRef;
use crate::records::{FileRecord, UserId};
use crate::store::{FileStore, UserStore};

/// Usernames for a batch of user ids, loaded in one store call.
#[derive(Debug, Default, Clone)]
pub struct UserDirectory {
    names: HashMap<UserId, String>,
}

impl UserDirectory {
    pub async fn load(users: &dyn UserStore, ids: &[UserId]) -> Result<Self, AppError> {
        let mut wanted = ids.to_vec();
        wanted.sort_unstable();
        wanted.dedup();

        let names = users
            .users_by_ids(&wanted)
            .await?
            .into_iter()
            .map(|u| (u.id, u.username))
            .collect();
        Ok(Self { names })
    }

    /// Owners and contributors of `files`.
    pub async fn for_files(users: &dyn UserStore, files: &[FileRecord]) -> Result<Self, AppError> {
        let ids: Vec<UserId> = files
            .iter()
            .flat_map(|f| std::iter::once(f.owner).chain(f.contributors.iter().map(|c| c.user)))
            .collect();
        Self::load(users, &ids).await
    }

    pub fn user_ref(&self, id: UserId) -> UserRef {
        UserRef {
            id,
            username: self.names.get(&id).cloned(),
        }
    }
}

pub(crate) async fn find_file(files: &dyn FileStore, id: Uuid) -> Result<FileRecord, AppError> {
    files
        .find_file(id)
        .await?
        .ok_or_else(|| AppError::NotFound("File not found".into()))
}
