use std::{io, path::PathBuf};

/// Failures reported by an `ObjectStore` implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("object not found: s3://{bucket}/{key}")]
    NotFound { bucket: String, key: String },

    #[error("transport error: {0}")]
    Transport(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("malformed locator: {0}")]
    MalformedLocator(String),

    #[error("root directory not found: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("root is not a directory: {}", .0.display())]
    RootNotADirectory(PathBuf),

    #[error("root directory is not writable: {}, {source}", .path.display())]
    RootNotWritable { path: PathBuf, source: io::Error },

    #[error("no filename can be derived from key: {0}")]
    EmptyFilename(String),

    #[error("path {} escapes root {}", .path.display(), .root.display())]
    PathEscapesRoot { path: PathBuf, root: PathBuf },

    #[error("remote object not found: s3://{bucket}/{key}")]
    RemoteObjectNotFound { bucket: String, key: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("{context}: {}, {source}", .path.display())]
    Io {
        context: &'static str,
        path: PathBuf,
        source: io::Error,
    },
}

impl SyncError {
    pub fn io(context: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        SyncError::Io {
            context,
            path: path.into(),
            source,
        }
    }
}

impl From<StoreError> for SyncError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { bucket, key } => SyncError::RemoteObjectNotFound { bucket, key },
            StoreError::Transport(message) => SyncError::Transport(message),
        }
    }
}

/// Error returned at the sync boundary; every kind carries the same prefix.
#[derive(Debug, thiserror::Error)]
#[error("failed to sync {locator}: {kind}")]
pub struct SyncFailure {
    pub locator: String,
    #[source]
    pub kind: SyncError,
}

impl SyncFailure {
    pub fn new(locator: &str, kind: SyncError) -> Self {
        Self {
            locator: locator.to_string(),
            kind,
        }
    }
}
