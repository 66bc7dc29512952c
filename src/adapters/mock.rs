use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::SystemTime,
};

use bytes::Bytes;
use futures::StreamExt;

use crate::{
    adapters,
    model::{error::StoreError, object::FileMetadata},
};

#[derive(Clone, Debug)]
pub struct MockObject {
    pub body: Vec<u8>,
    pub last_modified: Option<SystemTime>,
    /// Fail the body stream after this many chunks have been yielded.
    pub fail_after_chunks: Option<usize>,
    /// Visible to `head_object` but gone by the time `get_object` runs.
    pub deleted_before_get: bool,
}

impl MockObject {
    pub fn new(body: &[u8], last_modified: SystemTime) -> Self {
        Self {
            body: body.to_vec(),
            last_modified: Some(last_modified),
            fail_after_chunks: None,
            deleted_before_get: false,
        }
    }
}

#[derive(Default)]
pub struct MockClient {
    pub objects: Mutex<HashMap<(String, String), MockObject>>,
    pub head_calls: AtomicUsize,
    pub get_calls: AtomicUsize,
    /// When set, every call fails with this transport message.
    pub transport_error: Option<String>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_object(self, bucket: &str, key: &str, object: MockObject) -> Self {
        self.put(bucket, key, object);
        self
    }

    pub fn put(&self, bucket: &str, key: &str, object: MockObject) {
        self.objects
            .lock()
            .expect("failed to acquire `objects` guard")
            .insert((bucket.to_string(), key.to_string()), object);
    }

    pub fn calls(&self) -> usize {
        self.head_calls.load(Ordering::SeqCst) + self.get_calls.load(Ordering::SeqCst)
    }

    fn lookup(&self, bucket: &str, key: &str) -> Result<MockObject, StoreError> {
        if let Some(message) = &self.transport_error {
            return Err(StoreError::Transport(message.clone()));
        }

        self.objects
            .lock()
            .expect("failed to acquire `objects` guard")
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
    }
}

fn to_metadata(object: &MockObject) -> FileMetadata {
    FileMetadata {
        exists: true,
        last_modified: object.last_modified,
        content_tag: Some(format!("\"{:x}\"", object.body.len())),
        size: Some(object.body.len() as u64),
    }
}

#[async_trait::async_trait]
impl adapters::ObjectStore for MockClient {
    async fn head_object(&self, bucket: &str, key: &str) -> Result<FileMetadata, StoreError> {
        self.head_calls.fetch_add(1, Ordering::SeqCst);

        let object = self.lookup(bucket, key)?;
        Ok(to_metadata(&object))
    }

    async fn get_object(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<adapters::ObjectBody, StoreError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);

        let object = self.lookup(bucket, key)?;
        if object.deleted_before_get {
            return Err(StoreError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            });
        }
        let metadata = to_metadata(&object);

        // two-byte chunks so a failure can land mid-stream
        let mut chunks: Vec<Result<Bytes, StoreError>> = object
            .body
            .chunks(2)
            .map(|chunk| Ok(Bytes::copy_from_slice(chunk)))
            .collect();

        if let Some(n) = object.fail_after_chunks {
            chunks.truncate(n);
            chunks.push(Err(StoreError::Transport(format!(
                "connection reset while reading: {}",
                key
            ))));
        }

        Ok(adapters::ObjectBody {
            metadata,
            chunks: futures::stream::iter(chunks).boxed(),
        })
    }
}
