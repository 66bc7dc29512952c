use crate::model::{error::SyncError, object::ObjectLocation, object::S3_SCHEME};

pub fn parse_location_from_uri(object_uri: &str) -> Result<ObjectLocation, SyncError> {
    let rest = object_uri.strip_prefix(S3_SCHEME).ok_or_else(|| {
        SyncError::MalformedLocator(format!("expected {} prefix: {}", S3_SCHEME, object_uri))
    })?;

    let (bucket, key) = rest.split_once('/').ok_or_else(|| {
        SyncError::MalformedLocator(format!("missing object key: {}", object_uri))
    })?;

    if bucket.is_empty() || key.is_empty() {
        return Err(SyncError::MalformedLocator(format!(
            "empty bucket or key: {}",
            object_uri
        )));
    }

    Ok(ObjectLocation {
        bucket: bucket.to_string(),
        key: key.to_string(),
    })
}

/// Last path segment of a key, if it names something.
pub fn parse_filename_from_key(key: &str) -> Option<&str> {
    key.rsplit('/')
        .next()
        .filter(|name| !name.is_empty() && *name != "." && *name != "..")
}
