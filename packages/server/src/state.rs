use std::sync::Arc;

use common::storage::BlobStore;

use crate::config::AppConfig;
use crate::services::{ContributorManager, FileManager, LabelManager};
use crate::store::{FileStore, LabelStore, UserStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserStore>,
    pub files: Arc<FileManager>,
    pub contributors: Arc<ContributorManager>,
    pub labels: Arc<LabelManager>,
}

impl AppState {
    /// Wire the managers over one structured store and one blob store.
    pub fn new<S>(config: AppConfig, store: Arc<S>, blobs: Arc<dyn BlobStore>) -> Self
    where
        S: UserStore + FileStore + LabelStore + 'static,
    {
        let users: Arc<dyn UserStore> = store.clone();
        let files: Arc<dyn FileStore> = store.clone();
        let labels: Arc<dyn LabelStore> = store;

        Self {
            config: Arc::new(config),
            files: Arc::new(FileManager::new(files.clone(), blobs)),
            contributors: Arc::new(ContributorManager::new(files.clone(), users.clone())),
            labels: Arc::new(LabelManager::new(labels, files)),
            users,
        }
    }
}
