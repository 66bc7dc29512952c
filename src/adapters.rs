use std::pin::Pin;

use bytes::Bytes;
use futures::Stream;

use crate::model::{error::StoreError, object::FileMetadata};

#[cfg(test)]
pub mod mock;
pub mod s3;

pub type ByteChunks = Pin<Box<dyn Stream<Item = Result<Bytes, StoreError>> + Send>>;

/// Body of a fetched object together with the metadata returned alongside it.
pub struct ObjectBody {
    pub metadata: FileMetadata,
    pub chunks: ByteChunks,
}

#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    /// Metadata-only lookup. A missing object is `StoreError::NotFound`.
    async fn head_object(&self, bucket: &str, key: &str) -> Result<FileMetadata, StoreError>;

    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectBody, StoreError>;
}
