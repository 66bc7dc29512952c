use std::{
    fmt,
    path::{Path, PathBuf},
    time::SystemTime,
};

pub const S3_SCHEME: &str = "s3://";

/// Bucket and key of a single remote object, parsed from `s3://bucket/key`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectLocation {
    pub bucket: String,
    pub key: String,
}

impl fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}/{}", S3_SCHEME, self.bucket, self.key)
    }
}

/// Metadata of either a remote object or a local file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FileMetadata {
    pub exists: bool,
    pub last_modified: Option<SystemTime>,
    pub content_tag: Option<String>,
    pub size: Option<u64>,
}

impl FileMetadata {
    pub fn missing() -> Self {
        Self::default()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncOutcome {
    pub was_downloaded: bool,
    pub local_path: PathBuf,
    pub filename: String,
}

impl SyncOutcome {
    pub fn new(was_downloaded: bool, local_path: PathBuf) -> Self {
        let filename = local_path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();

        Self {
            was_downloaded,
            local_path,
            filename,
        }
    }
}

/// Whether the bootstrap should run a sync at all.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncRequest {
    NoSyncRequested,
    SyncRequested(String),
}

impl From<Option<String>> for SyncRequest {
    fn from(locator: Option<String>) -> Self {
        match locator {
            Some(locator) if !locator.trim().is_empty() => SyncRequest::SyncRequested(locator),
            _ => SyncRequest::NoSyncRequested,
        }
    }
}

/// Where a synced object lands locally.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Destination {
    /// Directory the object is placed under; must already exist.
    Root(PathBuf),
    /// Exact file path; parent directories are created as needed.
    File(PathBuf),
}

impl Destination {
    pub fn path(&self) -> &Path {
        match self {
            Destination::Root(path) | Destination::File(path) => path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_location() {
        let location = ObjectLocation {
            bucket: "bucket".to_string(),
            key: "folder/data.json".to_string(),
        };

        assert_eq!(location.to_string(), "s3://bucket/folder/data.json");
    }

    #[test]
    fn test_outcome_filename() {
        let cases = vec![
            ("/data/data.json", "data.json"),
            ("/data/nested/report.csv", "report.csv"),
            ("/", ""),
        ];

        for (path, expected) in cases {
            let outcome = SyncOutcome::new(true, PathBuf::from(path));
            assert_eq!(outcome.filename, expected, "failed filename for case: {}", path);
        }
    }

    #[test]
    fn test_sync_request_from_option() {
        assert_eq!(SyncRequest::from(None), SyncRequest::NoSyncRequested);
        assert_eq!(
            SyncRequest::from(Some("  ".to_string())),
            SyncRequest::NoSyncRequested
        );
        assert_eq!(
            SyncRequest::from(Some("s3://b/k".to_string())),
            SyncRequest::SyncRequested("s3://b/k".to_string())
        );
    }
}
