use std::future::Future;

use tracing::{error, info, span, Instrument, Level};

use crate::{
    model::object::{Destination, SyncOutcome, SyncRequest},
    sync::ObjectSync,
};

/// Runs the optional startup sync. Failures are logged and never abort
/// startup; the store client is only built when a sync was requested.
pub async fn prepare_workspace<F, Fut>(
    request: &SyncRequest,
    destination: &Destination,
    make_syncer: F,
) -> Option<SyncOutcome>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = ObjectSync>,
{
    let span = span!(Level::INFO, "prepare_workspace", context = "prepare_workspace");

    async {
        let locator = match request {
            SyncRequest::NoSyncRequested => {
                info!("no object to sync");
                return None;
            }
            SyncRequest::SyncRequested(locator) => locator,
        };

        info!(locator = %locator, destination = %destination.path().display(), "called");

        let syncer = make_syncer().await;
        match syncer.sync_to(locator, destination).await {
            Err(err) => {
                error!(error_message = %err, error_group = "sync", "continuing without synced file");
                None
            }
            Ok(outcome) => {
                info!(
                    was_downloaded = outcome.was_downloaded,
                    local_path = %outcome.local_path.display(),
                    filename = %outcome.filename,
                    "synced"
                );
                Some(outcome)
            }
        }
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use std::{
        sync::Arc,
        time::{Duration, SystemTime},
    };

    use super::*;
    use crate::{
        adapters::mock::{MockClient, MockObject},
        sync::SyncOptions,
    };

    #[tokio::test]
    async fn test_no_sync_requested() {
        let dir = tempfile::tempdir().unwrap();

        let outcome = prepare_workspace(
            &SyncRequest::NoSyncRequested,
            &Destination::Root(dir.path().to_path_buf()),
            || -> std::future::Ready<ObjectSync> { panic!("store client must not be built") },
        )
        .await;

        assert_eq!(outcome, None);
    }

    #[tokio::test]
    async fn test_sync_requested() {
        let dir = tempfile::tempdir().unwrap();
        let client = Arc::new(MockClient::new().with_object(
            "bucket",
            "data.json",
            MockObject::new(b"{}", SystemTime::UNIX_EPOCH + Duration::from_secs(1_600_000_000)),
        ));

        let outcome = prepare_workspace(
            &SyncRequest::SyncRequested("s3://bucket/data.json".to_string()),
            &Destination::Root(dir.path().to_path_buf()),
            || async move { ObjectSync::new(client, SyncOptions::default()) },
        )
        .await
        .unwrap();

        assert!(outcome.was_downloaded);
        assert_eq!(outcome.filename, "data.json");
        assert_eq!(std::fs::read(dir.path().join("data.json")).unwrap(), b"{}");
    }

    #[tokio::test]
    async fn test_sync_failure_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let client = Arc::new(MockClient::new());

        let outcome = prepare_workspace(
            &SyncRequest::SyncRequested("s3://bucket/missing.json".to_string()),
            &Destination::Root(dir.path().to_path_buf()),
            || async move { ObjectSync::new(client, SyncOptions::default()) },
        )
        .await;

        assert_eq!(outcome, None);
    }
}
