use std::{
    ffi::OsString,
    future::Future,
    io,
    path::{Path, PathBuf},
    process,
    time::{SystemTime, UNIX_EPOCH},
};

use crate::{model::error::SyncError, util};

const PROBE_PREFIX: &str = ".objectsync-probe";

/// Checks that `root` exists, is a directory, and accepts a probe file.
pub async fn validate_root(root: &Path) -> Result<(), SyncError> {
    let metadata = match tokio::fs::metadata(root).await {
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(SyncError::RootNotFound(root.to_path_buf()));
        }
        Err(err) => return Err(SyncError::io("failed to inspect root", root, err)),
        Ok(metadata) => metadata,
    };

    if !metadata.is_dir() {
        return Err(SyncError::RootNotADirectory(root.to_path_buf()));
    }

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let probe = root.join(format!("{}-{}-{}", PROBE_PREFIX, process::id(), nanos));

    run_probe(
        root,
        tokio::fs::write(&probe, b""),
        tokio::fs::remove_file(&probe),
    )
    .await
}

/// `remove` is only awaited once `create` succeeded; either failure means the
/// root is not writable.
async fn run_probe<C, R>(root: &Path, create: C, remove: R) -> Result<(), SyncError>
where
    C: Future<Output = io::Result<()>>,
    R: Future<Output = io::Result<()>>,
{
    let not_writable = |source| SyncError::RootNotWritable {
        path: root.to_path_buf(),
        source,
    };

    create.await.map_err(not_writable)?;
    remove.await.map_err(not_writable)
}

/// Key segments with empty, `.` and `..` parts removed.
pub fn sanitize_key(key: &str) -> Vec<&str> {
    key.split('/')
        .filter(|segment| !segment.is_empty() && *segment != "." && *segment != "..")
        .collect()
}

pub fn build_local_path(
    root: &Path,
    key: &str,
    preserve_structure: bool,
) -> Result<PathBuf, SyncError> {
    if !preserve_structure {
        return util::object::parse_filename_from_key(key)
            .map(|filename| root.join(filename))
            .ok_or_else(|| SyncError::EmptyFilename(key.to_string()));
    }

    let segments = sanitize_key(key);
    if segments.is_empty() {
        return Err(SyncError::EmptyFilename(key.to_string()));
    }

    let mut path = root.to_path_buf();
    for segment in segments {
        path.push(segment);
    }

    Ok(path)
}

/// Fails with `PathEscapesRoot` unless `path`, with symlinks in its existing
/// ancestors resolved, is `root` or lies under it.
pub async fn ensure_contained(root: &Path, path: &Path) -> Result<(), SyncError> {
    let canonical_root = tokio::fs::canonicalize(root)
        .await
        .map_err(|err| SyncError::io("failed to resolve root", root, err))?;

    if let Some(resolved) = resolve_path(path).await? {
        if resolved.starts_with(&canonical_root) {
            return Ok(());
        }
    }

    Err(SyncError::PathEscapesRoot {
        path: path.to_path_buf(),
        root: root.to_path_buf(),
    })
}

/// Resolves symlinks and `..` through the deepest existing ancestor of
/// `path`. `None` when the missing tail itself climbs with `..`.
async fn resolve_path(path: &Path) -> Result<Option<PathBuf>, SyncError> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|err| SyncError::io("failed to read current directory", path, err))?
            .join(path)
    };

    // canonicalize only works on existing paths, so resolve the deepest
    // existing ancestor and re-append the rest
    let mut existing = absolute.as_path();
    let mut tail: Vec<OsString> = Vec::new();
    loop {
        match tokio::fs::canonicalize(existing).await {
            Ok(mut resolved) => {
                for name in tail.iter().rev() {
                    resolved.push(name);
                }
                return Ok(Some(resolved));
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                if tokio::fs::symlink_metadata(existing).await.is_ok() {
                    return Err(SyncError::io("dangling symlink", existing, err));
                }

                // file_name is None when the path ends in `..`
                match (existing.parent(), existing.file_name()) {
                    (Some(parent), Some(name)) => {
                        tail.push(name.to_os_string());
                        existing = parent;
                    }
                    _ => return Ok(None),
                }
            }
            Err(err) => return Err(SyncError::io("failed to resolve path", existing, err)),
        }
    }
}
