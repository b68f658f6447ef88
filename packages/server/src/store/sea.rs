use std::collections::HashMap;

use async_trait::async_trait;
use sea_orm::sea_query::{Expr, Func, LikeExpr};
use sea_orm::*;
use uuid::Uuid;

use super::{FileStore, LabelStore, StoreError, UserStore};
use crate::entity::{file, label, label_file, user};
use crate::models::shared::escape_like;
use crate::records::{Contributor, FileRecord, Label, UserId, UserRecord};

/// Postgres-backed store.
#[derive(Clone)]
pub struct SeaOrmStore {
    db: DatabaseConnection,
}

impl SeaOrmStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Load the file references of `labels` in one query and assemble records.
    async fn with_file_refs(&self, labels: Vec<label::Model>) -> Result<Vec<Label>, StoreError> {
        if labels.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = labels.iter().map(|l| l.id).collect();
        let refs = label_file::Entity::find()
            .filter(label_file::Column::LabelId.is_in(ids))
            .order_by_asc(label_file::Column::Id)
            .all(&self.db)
            .await?;

        let mut by_label: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for r in refs {
            by_label.entry(r.label_id).or_default().push(r.file_id);
        }

        Ok(labels
            .into_iter()
            .map(|l| {
                let files = by_label.remove(&l.id).unwrap_or_default();
                label_from_model(l, files)
            })
            .collect())
    }
}

fn user_from_model(m: user::Model) -> UserRecord {
    UserRecord {
        id: m.id,
        username: m.username,
        password_hash: m.password,
        created_at: m.created_at,
    }
}

fn file_from_model(m: file::Model) -> Result<FileRecord, StoreError> {
    let contributors: Vec<Contributor> = serde_json::from_value(m.contributors)
        .map_err(|e| StoreError::Corrupt(format!("file {} contributors: {e}", m.id)))?;

    Ok(FileRecord {
        id: m.id,
        url: m.url,
        name: m.name,
        content_type: m.content_type,
        description: m.description,
        blob_key: m.blob_key,
        size: m.size,
        owner: m.owner_id,
        contributors,
        created_at: m.created_at,
        updated_at: m.updated_at,
    })
}

fn file_to_active(f: &FileRecord) -> Result<file::ActiveModel, StoreError> {
    let contributors = serde_json::to_value(&f.contributors)
        .map_err(|e| StoreError::Corrupt(format!("file {} contributors: {e}", f.id)))?;

    Ok(file::ActiveModel {
        id: Set(f.id),
        url: Set(f.url.clone()),
        name: Set(f.name.clone()),
        content_type: Set(f.content_type.clone()),
        description: Set(f.description.clone()),
        blob_key: Set(f.blob_key.clone()),
        size: Set(f.size),
        owner_id: Set(f.owner),
        contributors: Set(contributors),
        created_at: Set(f.created_at),
        updated_at: Set(f.updated_at),
        ..Default::default()
    })
}

fn label_from_model(m: label::Model, files: Vec<Uuid>) -> Label {
    Label {
        id: m.id,
        owner: m.owner_id,
        name: m.name,
        color: m.color,
        files,
        created_at: m.created_at,
        updated_at: m.updated_at,
    }
}

fn files_from_models(models: Vec<file::Model>) -> Result<Vec<FileRecord>, StoreError> {
    models.into_iter().map(file_from_model).collect()
}

#[async_trait]
impl UserStore for SeaOrmStore {
    async fn insert_user(&self, record: UserRecord) -> Result<UserRecord, StoreError> {
        let new_user = user::ActiveModel {
            id: Set(record.id),
            username: Set(record.username),
            password: Set(record.password_hash),
            created_at: Set(record.created_at),
            ..Default::default()
        };

        let model = new_user.insert(&self.db).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                tracing::debug!("Registration race condition: unique constraint caught on insert");
                StoreError::UsernameTaken
            }
            _ => StoreError::from(e),
        })?;

        Ok(user_from_model(model))
    }

    async fn find_user(&self, id: UserId) -> Result<Option<UserRecord>, StoreError> {
        Ok(user::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(user_from_model))
    }

    async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserRecord>, StoreError> {
        Ok(user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await?
            .map(user_from_model))
    }

    async fn search_users(&self, term: &str, limit: u64) -> Result<Vec<UserRecord>, StoreError> {
        let term = escape_like(term);
        let users = user::Entity::find()
            .filter(
                Expr::expr(Func::lower(Expr::col(user::Column::Username)))
                    .like(LikeExpr::new(format!("%{}%", term.to_lowercase())).escape('\\')),
            )
            .order_by_asc(user::Column::Username)
            .limit(limit)
            .all(&self.db)
            .await?;

        Ok(users.into_iter().map(user_from_model).collect())
    }

    async fn users_by_ids(&self, ids: &[UserId]) -> Result<Vec<UserRecord>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let users = user::Entity::find()
            .filter(user::Column::Id.is_in(ids.to_vec()))
            .all(&self.db)
            .await?;
        Ok(users.into_iter().map(user_from_model).collect())
    }
}

#[async_trait]
impl FileStore for SeaOrmStore {
    async fn insert_file(&self, record: FileRecord) -> Result<FileRecord, StoreError> {
        let model = file_to_active(&record)?.insert(&self.db).await?;
        file_from_model(model)
    }

    async fn find_file(&self, id: Uuid) -> Result<Option<FileRecord>, StoreError> {
        file::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(file_from_model)
            .transpose()
    }

    async fn save_file(&self, record: &FileRecord) -> Result<(), StoreError> {
        match file_to_active(record)?.update(&self.db).await {
            Ok(_) => Ok(()),
            Err(DbErr::RecordNotUpdated) => Err(StoreError::Missing("File")),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_file(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = file::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(result.rows_affected > 0)
    }

    async fn files_owned_by(&self, owner: UserId) -> Result<Vec<FileRecord>, StoreError> {
        let models = file::Entity::find()
            .filter(file::Column::OwnerId.eq(owner))
            .order_by_asc(file::Column::Id)
            .all(&self.db)
            .await?;
        files_from_models(models)
    }

    async fn files_shared_with(&self, user: UserId) -> Result<Vec<FileRecord>, StoreError> {
        let probe = serde_json::json!([{ "user": user }]);
        let models = file::Entity::find()
            .filter(Expr::cust_with_values("\"contributors\" @> ?", [probe]))
            .order_by_asc(file::Column::Id)
            .all(&self.db)
            .await?;
        files_from_models(models)
    }

    async fn files_by_ids(&self, ids: &[Uuid]) -> Result<Vec<FileRecord>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let models = file::Entity::find()
            .filter(file::Column::Id.is_in(ids.to_vec()))
            .all(&self.db)
            .await?;
        files_from_models(models)
    }
}

#[async_trait]
impl LabelStore for SeaOrmStore {
    async fn insert_label(&self, record: Label) -> Result<Label, StoreError> {
        let new_label = label::ActiveModel {
            id: Set(record.id),
            owner_id: Set(record.owner),
            name: Set(record.name),
            color: Set(record.color),
            created_at: Set(record.created_at),
            updated_at: Set(record.updated_at),
            ..Default::default()
        };
        let model = new_label.insert(&self.db).await?;
        Ok(label_from_model(model, Vec::new()))
    }

    async fn find_label(&self, id: Uuid) -> Result<Option<Label>, StoreError> {
        let Some(model) = label::Entity::find_by_id(id).one(&self.db).await? else {
            return Ok(None);
        };
        Ok(self.with_file_refs(vec![model]).await?.pop())
    }

    async fn save_label(&self, record: &Label) -> Result<(), StoreError> {
        let changes = label::ActiveModel {
            id: Unchanged(record.id),
            name: Set(record.name.clone()),
            color: Set(record.color.clone()),
            updated_at: Set(record.updated_at),
            ..Default::default()
        };
        match changes.update(&self.db).await {
            Ok(_) => Ok(()),
            Err(DbErr::RecordNotUpdated) => Err(StoreError::Missing("Label")),
            Err(e) => Err(e.into()),
        }
    }

    async fn append_label_file(&self, label_id: Uuid, file_id: Uuid) -> Result<(), StoreError> {
        let link = label_file::ActiveModel {
            label_id: Set(label_id),
            file_id: Set(file_id),
            ..Default::default()
        };
        label_file::Entity::insert(link)
            .exec_without_returning(&self.db)
            .await?;
        Ok(())
    }

    async fn delete_label(&self, id: Uuid) -> Result<bool, StoreError> {
        let txn = self.db.begin().await?;

        label_file::Entity::delete_many()
            .filter(label_file::Column::LabelId.eq(id))
            .exec(&txn)
            .await?;
        let result = label::Entity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;
        Ok(result.rows_affected > 0)
    }

    async fn labels_owned_by(&self, owner: UserId) -> Result<Vec<Label>, StoreError> {
        let labels = label::Entity::find()
            .filter(label::Column::OwnerId.eq(owner))
            .order_by_asc(label::Column::Id)
            .all(&self.db)
            .await?;
        self.with_file_refs(labels).await
    }

    async fn labels_with_file(
        &self,
        owner: UserId,
        file_id: Uuid,
    ) -> Result<Vec<Label>, StoreError> {
        let labels = label::Entity::find()
            .filter(label::Column::OwnerId.eq(owner))
            .filter(
                label::Column::Id.in_subquery(
                    label_file::Entity::find()
                        .select_only()
                        .column(label_file::Column::LabelId)
                        .filter(label_file::Column::FileId.eq(file_id))
                        .into_query(),
                ),
            )
            .order_by_asc(label::Column::Id)
            .all(&self.db)
            .await?;
        self.with_file_refs(labels).await
    }
}
