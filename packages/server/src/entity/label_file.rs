use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One file reference held by a label.
///
/// `id` comes from a database sequence, so rows sort in append order even
/// when several server instances link files at once. The same `file_id` may
/// appear several times under one label. `file_id` has no foreign key:
/// deleting a file leaves the reference in place.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "label_file")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub label_id: Uuid,
    #[sea_orm(belongs_to, from = "label_id", to = "id")]
    pub label: HasOne<super::label::Entity>,

    #[sea_orm(indexed)]
    pub file_id: Uuid,
}

impl ActiveModelBehavior for ActiveModel {}
