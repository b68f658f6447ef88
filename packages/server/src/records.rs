//! Domain records shared by the access policy, the managers and the stores.
//!
//! These are storage-agnostic: the SeaORM adapter maps them onto tables and
//! the in-memory adapter keeps them as-is.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque identifier of an authenticated principal.
pub type UserId = Uuid;

/// A registered account. Only the auth plumbing creates these.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserRecord {
    pub id: UserId,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Capability a contributor holds on one file.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
    utoipa::ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum PermissionLevel {
    #[default]
    #[serde(alias = "read only")]
    ReadOnly,
    #[serde(alias = "read and write")]
    ReadWrite,
}

/// A user granted scoped rights on a single file. Lives inside its
/// [`FileRecord`] and is only ever persisted together with it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contributor {
    /// Unique within the parent file.
    pub id: Uuid,
    pub user: UserId,
    #[serde(default)]
    pub permission_level: PermissionLevel,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Contributor {
    pub fn new(user: UserId, permission_level: PermissionLevel) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            user,
            permission_level,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileRecord {
    pub id: Uuid,
    /// Blob location as reported by the blob store.
    pub url: String,
    pub name: String,
    pub content_type: String,
    pub description: Option<String>,
    /// Key to replay against the blob store for download and delete.
    pub blob_key: String,
    pub size: i64,
    /// Set once at creation.
    pub owner: UserId,
    pub contributors: Vec<Contributor>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FileRecord {
    pub fn contributor(&self, contributor_id: Uuid) -> Option<&Contributor> {
        self.contributors.iter().find(|c| c.id == contributor_id)
    }

    pub fn contributor_mut(&mut self, contributor_id: Uuid) -> Option<&mut Contributor> {
        self.contributors.iter_mut().find(|c| c.id == contributor_id)
    }
}

/// A user-owned tag. `files` holds weak references in insertion order;
/// duplicates are kept.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Label {
    pub id: Uuid,
    /// Set once at creation.
    pub owner: UserId,
    pub name: String,
    pub color: String,
    pub files: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
