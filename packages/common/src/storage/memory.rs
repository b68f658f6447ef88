use std::io::Cursor;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::io::AsyncReadExt;

use super::error::StorageError;
use super::key::BlobKey;
use super::traits::{BlobStore, BoxReader, StoredBlob};

/// In-memory blob store for tests and throwaway dev instances.
///
/// Not persistent: data is lost on drop.
pub struct MemoryBlobStore {
    blobs: DashMap<BlobKey, Vec<u8>>,
    max_size: u64,
}

impl MemoryBlobStore {
    pub fn new(max_size: u64) -> Self {
        Self {
            blobs: DashMap::new(),
            max_size,
        }
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put_stream(
        &self,
        key: &BlobKey,
        reader: BoxReader,
    ) -> Result<StoredBlob, StorageError> {
        let mut data = Vec::new();
        let read = reader.take(self.max_size + 1).read_to_end(&mut data).await? as u64;
        if read > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: read,
                limit: self.max_size,
            });
        }

        self.blobs.insert(key.clone(), data);
        Ok(StoredBlob {
            location: format!("memory://{key}"),
            key: key.to_string(),
        })
    }

    async fn get_stream(&self, key: &BlobKey) -> Result<BoxReader, StorageError> {
        let data = self
            .blobs
            .get(key)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StorageError::NotFound(key.to_string()))?;
        Ok(Box::new(Cursor::new(data)))
    }

    async fn exists(&self, key: &BlobKey) -> Result<bool, StorageError> {
        Ok(self.blobs.contains_key(key))
    }

    async fn delete(&self, key: &BlobKey) -> Result<bool, StorageError> {
        Ok(self.blobs.remove(key).is_some())
    }
}
