use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "file")]
pub struct Model {
    /// UUIDv7 primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Blob location reported by the blob store.
    pub url: String,
    pub name: String,
    pub content_type: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub blob_key: String,
    pub size: i64,

    #[sea_orm(indexed)]
    pub owner_id: Uuid,
    #[sea_orm(belongs_to, from = "owner_id", to = "id")]
    pub owner: HasOne<super::user::Entity>,

    /// Contributor entries stored as a JSON array of
    /// `{id, user, permission_level, created_at, updated_at}` objects.
    #[sea_orm(column_type = "JsonBinary")]
    pub contributors: serde_json::Value,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
