//! Structured storage for users, files and labels.
//!
//! Managers only see these traits. [`SeaOrmStore`] backs them with Postgres,
//! [`MemoryStore`] keeps everything in process. Saves replace the whole
//! record, so two concurrent saves of the same record are last-write-wins.

mod memory;
mod sea;

use async_trait::async_trait;
use sea_orm::DbErr;
use uuid::Uuid;

use crate::records::{FileRecord, Label, UserId, UserRecord};

pub use memory::MemoryStore;
pub use sea::SeaOrmStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("username is already taken")]
    UsernameTaken,
    /// A record vanished between load and save.
    #[error("{0} no longer exists")]
    Missing(&'static str),
    #[error("corrupt record: {0}")]
    Corrupt(String),
    #[error(transparent)]
    Db(#[from] DbErr),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert_user(&self, user: UserRecord) -> Result<UserRecord, StoreError>;

    async fn find_user(&self, id: UserId) -> Result<Option<UserRecord>, StoreError>;

    async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserRecord>, StoreError>;

    /// Case-insensitive substring match on the username, ordered by username.
    async fn search_users(&self, term: &str, limit: u64) -> Result<Vec<UserRecord>, StoreError>;

    async fn users_by_ids(&self, ids: &[UserId]) -> Result<Vec<UserRecord>, StoreError>;
}

#[async_trait]
pub trait FileStore: Send + Sync {
    async fn insert_file(&self, file: FileRecord) -> Result<FileRecord, StoreError>;

    async fn find_file(&self, id: Uuid) -> Result<Option<FileRecord>, StoreError>;

    /// Persist `file` as a whole, contributors included.
    async fn save_file(&self, file: &FileRecord) -> Result<(), StoreError>;

    /// Returns `false` if no such file existed.
    async fn delete_file(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn files_owned_by(&self, owner: UserId) -> Result<Vec<FileRecord>, StoreError>;

    /// Files on which `user` holds at least one contributor entry.
    async fn files_shared_with(&self, user: UserId) -> Result<Vec<FileRecord>, StoreError>;

    async fn files_by_ids(&self, ids: &[Uuid]) -> Result<Vec<FileRecord>, StoreError>;
}

#[async_trait]
pub trait LabelStore: Send + Sync {
    async fn insert_label(&self, label: Label) -> Result<Label, StoreError>;

    async fn find_label(&self, id: Uuid) -> Result<Option<Label>, StoreError>;

    /// Persist name, color and `updated_at`. File references are untouched.
    async fn save_label(&self, label: &Label) -> Result<(), StoreError>;

    /// Append one file reference. Duplicates are kept.
    async fn append_label_file(&self, label_id: Uuid, file_id: Uuid) -> Result<(), StoreError>;

    /// Remove the label and all of its file references together.
    async fn delete_label(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn labels_owned_by(&self, owner: UserId) -> Result<Vec<Label>, StoreError>;

    /// Labels of `owner` that reference `file_id` at least once.
    async fn labels_with_file(
        &self,
        owner: UserId,
        file_id: Uuid,
    ) -> Result<Vec<Label>, StoreError>;
}
