use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use uuid::Uuid;

use super::{FileStore, LabelStore, StoreError, UserStore};
use crate::records::{FileRecord, Label, UserId, UserRecord};

/// In-process store used by tests and `database.url = "memory"`.
#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<UserId, UserRecord>,
    usernames: DashMap<String, UserId>,
    files: DashMap<Uuid, FileRecord>,
    labels: DashMap<Uuid, Label>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Ids are UUIDv7, so sorting by id sorts by creation time.
fn sorted_by_id<T>(mut items: Vec<T>, id: impl Fn(&T) -> Uuid) -> Vec<T> {
    items.sort_by_key(|item| id(item));
    items
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: UserRecord) -> Result<UserRecord, StoreError> {
        match self.usernames.entry(user.username.clone()) {
            Entry::Occupied(_) => Err(StoreError::UsernameTaken),
            Entry::Vacant(slot) => {
                // The record goes in before the index entry that points at it.
                self.users.insert(user.id, user.clone());
                slot.insert(user.id);
                Ok(user)
            }
        }
    }

    async fn find_user(&self, id: UserId) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.users.get(&id).map(|u| u.value().clone()))
    }

    async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserRecord>, StoreError> {
        let Some(id) = self.usernames.get(username).map(|id| *id) else {
            return Ok(None);
        };
        self.find_user(id).await
    }

    async fn search_users(&self, term: &str, limit: u64) -> Result<Vec<UserRecord>, StoreError> {
        let needle = term.to_lowercase();
        let mut found: Vec<UserRecord> = self
            .users
            .iter()
            .filter(|u| u.username.to_lowercase().contains(&needle))
            .map(|u| u.value().clone())
            .collect();
        found.sort_by(|a, b| a.username.cmp(&b.username));
        found.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(found)
    }

    async fn users_by_ids(&self, ids: &[UserId]) -> Result<Vec<UserRecord>, StoreError> {
        Ok(ids
            .iter()
            .filter_map(|id| self.users.get(id).map(|u| u.value().clone()))
            .collect())
    }
}

#[async_trait]
impl FileStore for MemoryStore {
    async fn insert_file(&self, file: FileRecord) -> Result<FileRecord, StoreError> {
        self.files.insert(file.id, file.clone());
        Ok(file)
    }

    async fn find_file(&self, id: Uuid) -> Result<Option<FileRecord>, StoreError> {
        Ok(self.files.get(&id).map(|f| f.value().clone()))
    }

    async fn save_file(&self, file: &FileRecord) -> Result<(), StoreError> {
        match self.files.get_mut(&file.id) {
            Some(mut slot) => {
                *slot = file.clone();
                Ok(())
            }
            None => Err(StoreError::Missing("File")),
        }
    }

    async fn delete_file(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.files.remove(&id).is_some())
    }

    async fn files_owned_by(&self, owner: UserId) -> Result<Vec<FileRecord>, StoreError> {
        let owned = self
            .files
            .iter()
            .filter(|f| f.owner == owner)
            .map(|f| f.value().clone())
            .collect();
        Ok(sorted_by_id(owned, |f| f.id))
    }

    async fn files_shared_with(&self, user: UserId) -> Result<Vec<FileRecord>, StoreError> {
        let shared = self
            .files
            .iter()
            .filter(|f| f.contributors.iter().any(|c| c.user == user))
            .map(|f| f.value().clone())
            .collect();
        Ok(sorted_by_id(shared, |f| f.id))
    }

    async fn files_by_ids(&self, ids: &[Uuid]) -> Result<Vec<FileRecord>, StoreError> {
        Ok(ids
            .iter()
            .filter_map(|id| self.files.get(id).map(|f| f.value().clone()))
            .collect())
    }
}

#[async_trait]
impl LabelStore for MemoryStore {
    async fn insert_label(&self, label: Label) -> Result<Label, StoreError> {
        self.labels.insert(label.id, label.clone());
        Ok(label)
    }

    async fn find_label(&self, id: Uuid) -> Result<Option<Label>, StoreError> {
        Ok(self.labels.get(&id).map(|l| l.value().clone()))
    }

    async fn save_label(&self, label: &Label) -> Result<(), StoreError> {
        let mut slot = self
            .labels
            .get_mut(&label.id)
            .ok_or(StoreError::Missing("Label"))?;
        slot.name = label.name.clone();
        slot.color = label.color.clone();
        slot.updated_at = label.updated_at;
        Ok(())
    }

    async fn append_label_file(&self, label_id: Uuid, file_id: Uuid) -> Result<(), StoreError> {
        let mut slot = self
            .labels
            .get_mut(&label_id)
            .ok_or(StoreError::Missing("Label"))?;
        slot.files.push(file_id);
        Ok(())
    }

    async fn delete_label(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.labels.remove(&id).is_some())
    }

    async fn labels_owned_by(&self, owner: UserId) -> Result<Vec<Label>, StoreError> {
        let owned = self
            .labels
            .iter()
            .filter(|l| l.owner == owner)
            .map(|l| l.value().clone())
            .collect();
        Ok(sorted_by_id(owned, |l| l.id))
    }

    async fn labels_with_file(
        &self,
        owner: UserId,
        file_id: Uuid,
    ) -> Result<Vec<Label>, StoreError> {
        let matching = self
            .labels
            .iter()
            .filter(|l| l.owner == owner && l.files.contains(&file_id))
            .map(|l| l.value().clone())
            .collect();
        Ok(sorted_by_id(matching, |l| l.id))
    }
}
