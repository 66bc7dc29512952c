use std::path::PathBuf;

use clap::{Arg, ArgAction, ArgMatches, Command};

use crate::model::object::Destination;

pub fn command() -> Command {
    clap::command!()
        .about("Fetches a remote S3 object into a local workspace when it is newer")
        .arg(
            Arg::new("S3_URI")
                .long("s3-uri")
                .env("S3_URI")
                .help("Object to sync, e.g. s3://bucket/path/data.json; sync is skipped when unset"),
        )
        .arg(
            Arg::new("DATA_DIR")
                .long("data-dir")
                .env("DATA_DIR")
                .value_parser(clap::value_parser!(PathBuf))
                .default_value(".")
                .help("Existing directory the object is synced into"),
        )
        .arg(
            Arg::new("OUTPUT_FILE")
                .long("output-file")
                .value_parser(clap::value_parser!(PathBuf))
                .help("Exact file path to sync into; takes precedence over --data-dir"),
        )
        .arg(
            Arg::new("PRESERVE_STRUCTURE")
                .long("preserve-structure")
                .action(ArgAction::SetTrue)
                .help("Keep the object key's directories under the data directory"),
        )
        .arg(
            Arg::new("REGION")
                .long("region")
                .env("AWS_REGION"),
        )
        .arg(
            Arg::new("ENDPOINT_URL")
                .long("endpoint-url")
                .env("AWS_ENDPOINT_URL")
                .help("Custom endpoint for S3-compatible stores"),
        )
        .arg(
            Arg::new("FORCE_PATH_STYLE")
                .long("force-path-style")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("ACCESS_KEY_ID")
                .long("access-key-id")
                .env("AWS_ACCESS_KEY_ID")
                .hide_env_values(true),
        )
        .arg(
            Arg::new("SECRET_ACCESS_KEY")
                .long("secret-access-key")
                .env("AWS_SECRET_ACCESS_KEY")
                .hide_env_values(true),
        )
        .arg(
            Arg::new("SESSION_TOKEN")
                .long("session-token")
                .env("AWS_SESSION_TOKEN")
                .hide_env_values(true),
        )
        .arg(
            Arg::new("LOG_LEVEL")
                .long("log-level")
                .value_parser(["trace", "debug", "info", "warn", "error"])
                .default_value("info"),
        )
}

pub fn destination(matches: &ArgMatches) -> Destination {
    if let Some(path) = matches.get_one::<PathBuf>("OUTPUT_FILE") {
        return Destination::File(path.clone());
    }

    let root = matches
        .get_one::<PathBuf>("DATA_DIR")
        .cloned()
        .unwrap_or_else(|| PathBuf::from("."));

    Destination::Root(root)
}
