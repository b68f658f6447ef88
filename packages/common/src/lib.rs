pub mod config;
pub mod storage;

pub use config::{BlobBackend, S3Config, StorageConfig};
