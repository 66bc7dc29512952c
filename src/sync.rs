use std::{
    io,
    path::{Path, PathBuf},
    sync::Arc,
};

use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, span, warn, Instrument, Level};

use crate::{
    adapters::ObjectStore,
    model::{
        error::{StoreError, SyncError, SyncFailure},
        object::{Destination, FileMetadata, ObjectLocation, SyncOutcome},
    },
    util,
};

const PARTIAL_SUFFIX: &str = ".partial";

#[derive(Clone, Copy, Debug, Default)]
pub struct SyncOptions {
    /// Keep the key's directory layout under the root instead of only its file name.
    pub preserve_structure: bool,
}

/// Fetches a single remote object into the local filesystem when the remote
/// copy is newer than the local one.
pub struct ObjectSync {
    client: Arc<dyn ObjectStore>,
    options: SyncOptions,
}

impl ObjectSync {
    pub fn new(client: Arc<dyn ObjectStore>, options: SyncOptions) -> Self {
        Self { client, options }
    }

    pub async fn sync_to(
        &self,
        locator: &str,
        destination: &Destination,
    ) -> Result<SyncOutcome, SyncFailure> {
        match destination {
            Destination::Root(root) => self.sync_to_root(locator, root).await,
            Destination::File(path) => {
                let was_downloaded = self.sync_file(locator, path).await?;
                Ok(SyncOutcome::new(was_downloaded, path.clone()))
            }
        }
    }

    pub async fn sync_to_root(
        &self,
        locator: &str,
        root: &Path,
    ) -> Result<SyncOutcome, SyncFailure> {
        let span = span!(Level::INFO, "sync_to_root", context = "sync_to_root");

        self.try_sync_to_root(locator, root)
            .instrument(span)
            .await
            .map_err(|kind| SyncFailure::new(locator, kind))
    }

    /// Returns whether the object was downloaded.
    pub async fn sync_file(&self, locator: &str, local_path: &Path) -> Result<bool, SyncFailure> {
        let span = span!(Level::INFO, "sync_file", context = "sync_file");

        self.try_sync_file(locator, local_path)
            .instrument(span)
            .await
            .map_err(|kind| SyncFailure::new(locator, kind))
    }

    async fn try_sync_file(&self, locator: &str, local_path: &Path) -> Result<bool, SyncError> {
        let location = util::object::parse_location_from_uri(locator)?;
        self.sync_location(&location, local_path).await
    }

    async fn try_sync_to_root(&self, locator: &str, root: &Path) -> Result<SyncOutcome, SyncError> {
        info!(locator = locator, root = %root.display(), "called");

        util::path::validate_root(root).await?;
        let location = util::object::parse_location_from_uri(locator)?;

        let local_path =
            util::path::build_local_path(root, &location.key, self.options.preserve_structure)?;
        util::path::ensure_contained(root, &local_path).await?;

        let was_downloaded = self.sync_location(&location, &local_path).await?;

        Ok(SyncOutcome::new(was_downloaded, local_path))
    }

    async fn sync_location(
        &self,
        location: &ObjectLocation,
        local_path: &Path,
    ) -> Result<bool, SyncError> {
        info!(
            bucket = %location.bucket,
            key = %location.key,
            local_path = %local_path.display(),
            "called"
        );

        let (remote, local) = tokio::try_join!(self.stat_remote(location), stat_local(local_path))?;

        if !remote.exists {
            return Err(SyncError::RemoteObjectNotFound {
                bucket: location.bucket.clone(),
                key: location.key.clone(),
            });
        }

        if !is_remote_newer(&remote, &local) {
            info!(local_path = %local_path.display(), "local file is current");
            return Ok(false);
        }

        let written = self.download(location, local_path).await?;
        info!(
            local_path = %local_path.display(),
            bytes = written,
            content_tag = remote.content_tag.as_deref().unwrap_or(""),
            "downloaded"
        );

        Ok(true)
    }

    pub async fn stat_remote(&self, location: &ObjectLocation) -> Result<FileMetadata, SyncError> {
        match self
            .client
            .head_object(&location.bucket, &location.key)
            .await
        {
            Err(StoreError::NotFound { .. }) => Ok(FileMetadata::missing()),
            Err(err) => Err(err.into()),
            Ok(metadata) => Ok(metadata),
        }
    }

    async fn download(&self, location: &ObjectLocation, local_path: &Path) -> Result<u64, SyncError> {
        if let Some(parent) = local_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|err| SyncError::io("failed to create directory", parent, err))?;
        }

        let partial = partial_path(local_path);

        // removes a stale partial; a symlink is unlinked, never followed
        match tokio::fs::remove_file(&partial).await {
            Err(err) if err.kind() != io::ErrorKind::NotFound => {
                return Err(SyncError::io("failed to remove stale partial download", &partial, err));
            }
            _ => {}
        }

        let res = match self.write_body(location, &partial).await {
            Ok(written) => tokio::fs::rename(&partial, local_path)
                .await
                .map(|_| written)
                .map_err(|err| SyncError::io("failed to move download into place", local_path, err)),
            Err(err) => Err(err),
        };

        if res.is_err() {
            match tokio::fs::remove_file(&partial).await {
                Err(err) if err.kind() != io::ErrorKind::NotFound => {
                    warn!(
                        error_message = %err,
                        error_group = "cleanup",
                        partial = %partial.display(),
                        "failed to remove partial download"
                    );
                }
                _ => {}
            }
        }

        res
    }

    async fn write_body(&self, location: &ObjectLocation, partial: &Path) -> Result<u64, SyncError> {
        let mut body = self
            .client
            .get_object(&location.bucket, &location.key)
            .await?;
        debug!(
            partial = %partial.display(),
            size = body.metadata.size.unwrap_or(0),
            "streaming body"
        );

        // create_new refuses to open through anything already at the path
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(partial)
            .await
            .map_err(|err| SyncError::io("failed to create file", partial, err))?;

        let mut written = 0;
        while let Some(chunk) = body.chunks.next().await {
            let chunk = chunk?;
            file.write_all(&chunk)
                .await
                .map_err(|err| SyncError::io("failed to write file", partial, err))?;
            written += chunk.len() as u64;
        }

        file.flush()
            .await
            .map_err(|err| SyncError::io("failed to flush file", partial, err))?;
        file.sync_all()
            .await
            .map_err(|err| SyncError::io("failed to sync file", partial, err))?;

        Ok(written)
    }
}

pub async fn stat_local(path: &Path) -> Result<FileMetadata, SyncError> {
    match tokio::fs::metadata(path).await {
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(FileMetadata::missing()),
        Err(err) => Err(SyncError::io("failed to stat local file", path, err)),
        Ok(metadata) => Ok(FileMetadata {
            exists: true,
            last_modified: metadata.modified().ok(),
            content_tag: None,
            size: Some(metadata.len()),
        }),
    }
}

/// Remote wins only with a strictly later timestamp; a missing local file
/// always loses, anything without a timestamp never wins.
pub fn is_remote_newer(remote: &FileMetadata, local: &FileMetadata) -> bool {
    if !local.exists {
        return true;
    }

    if !remote.exists {
        return false;
    }

    match (remote.last_modified, local.last_modified) {
        (Some(remote_modified), Some(local_modified)) => remote_modified > local_modified,
        _ => false,
    }
}

fn partial_path(local_path: &Path) -> PathBuf {
    let filename = local_path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();

    local_path.with_file_name(format!(".{}{}", filename, PARTIAL_SUFFIX))
}
