use std::time::SystemTime;

use aws_sdk_s3::{
    error::DisplayErrorContext,
    primitives::{ByteStream, DateTime},
};
use futures::StreamExt;

use crate::{
    adapters,
    model::{error::StoreError, object::FileMetadata},
};

fn to_metadata(
    last_modified: Option<&DateTime>,
    e_tag: Option<&str>,
    content_length: Option<i64>,
) -> FileMetadata {
    FileMetadata {
        exists: true,
        last_modified: last_modified.and_then(|dt| SystemTime::try_from(*dt).ok()),
        content_tag: e_tag.map(|tag| tag.to_string()),
        size: content_length.and_then(|len| u64::try_from(len).ok()),
    }
}

fn into_chunks(body: ByteStream, key: &str) -> adapters::ByteChunks {
    let key = key.to_string();
    futures::stream::unfold(body, move |mut body| {
        let key = key.clone();
        async move {
            body.next().await.map(|chunk| {
                let chunk = chunk.map_err(|err| {
                    StoreError::Transport(format!(
                        "failed to read body: {}, {}",
                        key,
                        DisplayErrorContext(&err)
                    ))
                });
                (chunk, body)
            })
        }
    })
    .boxed()
}

#[async_trait::async_trait]
impl adapters::ObjectStore for aws_sdk_s3::Client {
    async fn head_object(&self, bucket: &str, key: &str) -> Result<FileMetadata, StoreError> {
        let req = self.head_object().bucket(bucket).key(key);

        let ho = match req.send().await {
            Err(err) => {
                let not_found = err
                    .as_service_error()
                    .is_some_and(|svc_err| svc_err.is_not_found())
                    || err
                        .raw_response()
                        .is_some_and(|res| res.status().as_u16() == 404);

                if not_found {
                    return Err(StoreError::NotFound {
                        bucket: bucket.to_string(),
                        key: key.to_string(),
                    });
                }

                return Err(StoreError::Transport(format!(
                    "failed to head_object: {}, {}",
                    key,
                    DisplayErrorContext(&err)
                )));
            }
            Ok(ho) => ho,
        };

        Ok(to_metadata(
            ho.last_modified(),
            ho.e_tag(),
            ho.content_length(),
        ))
    }

    async fn get_object(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<adapters::ObjectBody, StoreError> {
        let req = self.get_object().bucket(bucket).key(key);

        let o = match req.send().await {
            Err(err) => {
                let not_found = err
                    .as_service_error()
                    .is_some_and(|svc_err| svc_err.is_no_such_key())
                    || err
                        .raw_response()
                        .is_some_and(|res| res.status().as_u16() == 404);

                if not_found {
                    return Err(StoreError::NotFound {
                        bucket: bucket.to_string(),
                        key: key.to_string(),
                    });
                }

                return Err(StoreError::Transport(format!(
                    "failed to get_object: {}, {}",
                    key,
                    DisplayErrorContext(&err)
                )));
            }
            Ok(o) => o,
        };

        let metadata = to_metadata(o.last_modified(), o.e_tag(), o.content_length());

        Ok(adapters::ObjectBody {
            metadata,
            chunks: into_chunks(o.body, key),
        })
    }
}
