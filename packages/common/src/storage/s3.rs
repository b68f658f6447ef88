//! S3-compatible blob store (AWS S3, Minio, Backblaze, ...).

use async_trait::async_trait;
use futures::TryStreamExt;
use s3::creds::Credentials;
use s3::error::S3Error;
use s3::{Bucket, Region};
use tokio_util::io::StreamReader;

use super::error::StorageError;
use super::key::BlobKey;
use super::traits::{BlobStore, BoxReader, StoredBlob};
use crate::config::S3Config;

pub struct S3BlobStore {
    bucket: Box<Bucket>,
}

impl S3BlobStore {
    pub fn new(config: &S3Config) -> Result<Self, StorageError> {
        let region = match &config.endpoint {
            Some(endpoint) => Region::Custom {
                region: config.region.clone(),
                endpoint: endpoint.clone(),
            },
            None => config
                .region
                .parse()
                .map_err(|e| StorageError::Backend(format!("invalid S3 region: {e}")))?,
        };

        let credentials = Credentials::new(
            config.access_key.as_deref(),
            config.secret_key.as_deref(),
            None,
            None,
            None,
        )
        .map_err(|e| StorageError::Backend(format!("invalid S3 credentials: {e}")))?;

        let mut bucket = Bucket::new(&config.bucket, region, credentials).map_err(backend)?;
        if config.endpoint.is_some() {
            // Required for Minio
            bucket = bucket.with_path_style();
        }

        Ok(Self { bucket })
    }

    fn location(&self, key: &BlobKey) -> String {
        format!("{}/{}", self.bucket.url(), key)
    }
}

fn backend(err: S3Error) -> StorageError {
    StorageError::Backend(err.to_string())
}

fn unexpected_status(op: &str, status: u16) -> StorageError {
    StorageError::Backend(format!("S3 {op} returned status {status}"))
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put_stream(
        &self,
        key: &BlobKey,
        mut reader: BoxReader,
    ) -> Result<StoredBlob, StorageError> {
        let response = self
            .bucket
            .put_object_stream(&mut reader, key.as_str())
            .await
            .map_err(backend)?;

        let status = response.status_code();
        if !(200..300).contains(&status) {
            return Err(unexpected_status("PUT", status));
        }

        Ok(StoredBlob {
            location: self.location(key),
            key: key.to_string(),
        })
    }

    async fn get_stream(&self, key: &BlobKey) -> Result<BoxReader, StorageError> {
        let response = self
            .bucket
            .get_object_stream(key.as_str())
            .await
            .map_err(backend)?;

        match response.status_code {
            200..=299 => {}
            404 => return Err(StorageError::NotFound(key.to_string())),
            status => return Err(unexpected_status("GET", status)),
        }

        let stream = response
            .bytes
            .map_err(|e| std::io::Error::other(e.to_string()));
        Ok(Box::new(StreamReader::new(stream)))
    }

    async fn exists(&self, key: &BlobKey) -> Result<bool, StorageError> {
        let (_, status) = self
            .bucket
            .head_object(key.as_str())
            .await
            .map_err(backend)?;

        match status {
            200..=299 => Ok(true),
            404 => Ok(false),
            status => Err(unexpected_status("HEAD", status)),
        }
    }

    async fn delete(&self, key: &BlobKey) -> Result<bool, StorageError> {
        let response = self
            .bucket
            .delete_object(key.as_str())
            .await
            .map_err(backend)?;

        // S3 answers 204 whether or not the object existed.
        match response.status_code() {
            200..=299 => Ok(true),
            404 => Ok(false),
            status => Err(unexpected_status("DELETE", status)),
        }
    }
}
