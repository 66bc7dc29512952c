use std::fmt;

use aws_sdk_s3::config::{Credentials, Region};
use clap::ArgMatches;
use tracing::warn;

const CREDENTIALS_PROVIDER: &str = "objectsync";

#[derive(Clone, PartialEq, Eq)]
pub struct StaticCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"** redacted **")
            .field("session_token", &self.session_token.as_ref().map(|_| "** redacted **"))
            .finish()
    }
}

/// Everything needed to build the S3 client. Unset fields fall back to the
/// AWS default chain (profiles, instance roles, ...).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StoreConfig {
    pub region: Option<String>,
    pub endpoint_url: Option<String>,
    pub force_path_style: bool,
    pub credentials: Option<StaticCredentials>,
}

impl StoreConfig {
    pub fn from_matches(matches: &ArgMatches) -> Self {
        let access_key_id = matches.get_one::<String>("ACCESS_KEY_ID").cloned();
        let secret_access_key = matches.get_one::<String>("SECRET_ACCESS_KEY").cloned();
        if access_key_id.is_some() != secret_access_key.is_some() {
            warn!("only one of access key id and secret access key is set, using default credential chain");
        }

        Self {
            region: matches.get_one::<String>("REGION").cloned(),
            endpoint_url: matches.get_one::<String>("ENDPOINT_URL").cloned(),
            force_path_style: matches.get_flag("FORCE_PATH_STYLE"),
            credentials: static_credentials(
                access_key_id,
                secret_access_key,
                matches.get_one::<String>("SESSION_TOKEN").cloned(),
            ),
        }
    }

    pub async fn build_client(&self) -> aws_sdk_s3::Client {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());

        if let Some(region) = &self.region {
            loader = loader.region(Region::new(region.clone()));
        }

        if let Some(endpoint_url) = &self.endpoint_url {
            loader = loader.endpoint_url(endpoint_url);
        }

        if let Some(creds) = &self.credentials {
            loader = loader.credentials_provider(Credentials::new(
                &creds.access_key_id,
                &creds.secret_access_key,
                creds.session_token.clone(),
                None,
                CREDENTIALS_PROVIDER,
            ));
        }

        let shared = loader.load().await;
        let config = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(self.force_path_style)
            .build();

        aws_sdk_s3::Client::from_conf(config)
    }
}

/// Explicit credentials are used only when both key id and secret are present.
pub fn static_credentials(
    access_key_id: Option<String>,
    secret_access_key: Option<String>,
    session_token: Option<String>,
) -> Option<StaticCredentials> {
    match (access_key_id, secret_access_key) {
        (Some(access_key_id), Some(secret_access_key))
            if !access_key_id.is_empty() && !secret_access_key.is_empty() =>
        {
            Some(StaticCredentials {
                access_key_id,
                secret_access_key,
                session_token: session_token.filter(|token| !token.is_empty()),
            })
        }
        _ => None,
    }
}
