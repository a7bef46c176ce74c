//! Runtime configuration for the pipeline jobs.
//!
//! Configuration is an explicitly constructed value built from the parsed
//! CLI and handed to each job at startup; there is no process-wide mutable
//! state.

use crate::cli::{Cli, RehostArgs};

/// Settings shared by every job: the D1 query endpoint and the discovery
/// homepage.
#[derive(Debug, Clone)]
pub struct Config {
    /// Cloudflare account id.
    pub account_id: String,
    /// D1 database id.
    pub database_id: String,
    /// Bearer token for the D1 REST API.
    pub api_key: String,
    /// Homepage scanned by the discovery job.
    pub homepage_url: String,
}

impl Config {
    /// Build the shared configuration from parsed CLI arguments.
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            account_id: cli.cloudflare_account_id.clone(),
            database_id: cli.cloudflare_database_id.clone(),
            api_key: cli.cloudflare_api_key.clone(),
            homepage_url: cli.homepage_url.clone(),
        }
    }

    /// The D1 query endpoint for this account and database.
    pub fn d1_endpoint(&self) -> String {
        format!(
            "https://api.cloudflare.com/client/v4/accounts/{}/d1/database/{}/query",
            self.account_id, self.database_id
        )
    }
}

/// Object-storage settings used only by the photo-rehosting job.
#[derive(Debug, Clone)]
pub struct RehostConfig {
    /// Destination bucket for rehosted photos.
    pub bucket: String,
    /// S3-compatible endpoint URL.
    pub endpoint: String,
    /// Custom public domain prefixed onto object keys.
    pub public_base_url: String,
}

impl RehostConfig {
    pub fn from_args(args: &RehostArgs) -> Self {
        Self {
            bucket: args.bucket.clone(),
            endpoint: args.endpoint.clone(),
            public_base_url: args.public_base_url.trim_end_matches('/').to_string(),
        }
    }
}
