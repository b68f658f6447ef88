mod error;
mod key;
mod traits;

pub mod filesystem;
pub mod memory;
#[cfg(feature = "object-storage")]
pub mod s3;

use std::sync::Arc;

pub use error::StorageError;
pub use key::BlobKey;
pub use traits::{BlobStore, BoxReader, StoredBlob};

use crate::config::{BlobBackend, StorageConfig};

/// Build the blob store selected by `config`.
///
/// Called once at start-up; the returned handle is shared by every request.
pub async fn open_blob_store(config: &StorageConfig) -> Result<Arc<dyn BlobStore>, StorageError> {
    match config.backend {
        BlobBackend::Filesystem => {
            tracing::info!(path = %config.path.display(), "Using filesystem blob store");
            let store =
                filesystem::FilesystemBlobStore::new(config.path.clone(), config.max_blob_size)
                    .await?;
            Ok(Arc::new(store))
        }
        BlobBackend::Memory => {
            tracing::warn!("Using in-memory blob store; file contents will not survive a restart");
            Ok(Arc::new(memory::MemoryBlobStore::new(config.max_blob_size)))
        }
        #[cfg(feature = "object-storage")]
        BlobBackend::S3 => {
            let s3_config = config.s3.as_ref().ok_or_else(|| {
                StorageError::Backend("storage.s3 is required when backend = \"s3\"".into())
            })?;
            tracing::info!(bucket = %s3_config.bucket, "Using S3 blob store");
            Ok(Arc::new(s3::S3BlobStore::new(s3_config)?))
        }
        #[cfg(not(feature = "object-storage"))]
        BlobBackend::S3 => Err(StorageError::Backend(
            "built without the object-storage feature".into(),
        )),
    }
}
