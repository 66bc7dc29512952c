use std::sync::Arc;

use clap::ArgMatches;
use tracing::{info, span, Instrument, Level};

mod adapters;
mod bootstrap;
mod cli;
mod config;
mod model;
mod sync;
mod util;

#[tokio::main]
async fn main() {
    let matches = cli::command().get_matches();

    let level = matches
        .get_one::<String>("LOG_LEVEL")
        .and_then(|level| level.parse::<Level>().ok())
        .unwrap_or(Level::INFO);

    // stdout is reserved for the protocol channel
    tracing_subscriber::fmt()
        .json()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .init();

    let span = span!(Level::INFO, "main", context = "main");
    run(matches).instrument(span).await;
}

async fn run(matches: ArgMatches) {
    info!("called");

    let request = model::object::SyncRequest::from(matches.get_one::<String>("S3_URI").cloned());
    let destination = cli::destination(&matches);
    let options = sync::SyncOptions {
        preserve_structure: matches.get_flag("PRESERVE_STRUCTURE"),
    };
    let store_config = config::StoreConfig::from_matches(&matches);
    info!(
        region = store_config.region.as_deref().unwrap_or("default"),
        endpoint_url = store_config.endpoint_url.as_deref().unwrap_or("default"),
        static_credentials = store_config.credentials.is_some(),
        preserve_structure = options.preserve_structure,
        "args"
    );

    let outcome = bootstrap::prepare_workspace(&request, &destination, || async move {
        let client = store_config.build_client().await;
        sync::ObjectSync::new(Arc::new(client), options)
    })
    .await;

    match outcome {
        Some(outcome) => info!(
            local_path = %outcome.local_path.display(),
            was_downloaded = outcome.was_downloaded,
            "workspace ready"
        ),
        None => info!(destination = %destination.path().display(), "workspace ready without synced file"),
    }
}
