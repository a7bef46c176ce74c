//! Command-line interface definitions for the Catalan News pipeline.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Credentials and endpoints can be provided via command-line flags or
//! environment variables (a `.env` file is loaded at startup).

use clap::{Parser, Subcommand};

/// Command-line arguments for the Catalan News pipeline.
///
/// The pipeline is three independent batch jobs sharing one database:
/// discovery inserts article URLs, enrichment fills in the extracted
/// content for one pending record per invocation.
///
/// # Examples
///
/// ```sh
/// # Discover new article URLs from the homepage
/// catalan_news_pipeline discover
///
/// # Enrich one pending record (title, photo, body)
/// catalan_news_pipeline enrich
///
/// # Enrich one pending record and rehost its photo in R2
/// catalan_news_pipeline enrich-full
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Cloudflare account id for the D1 REST endpoint
    #[arg(long, env = "CLOUDFLARE_ACCOUNT_ID")]
    pub cloudflare_account_id: String,

    /// Cloudflare D1 database id
    #[arg(long, env = "CLOUDFLARE_DATABASE_ID")]
    pub cloudflare_database_id: String,

    /// Cloudflare API token (bearer auth for the D1 query endpoint)
    #[arg(long, env = "CLOUDFLARE_API_KEY")]
    pub cloudflare_api_key: String,

    /// News homepage used by the discovery job
    #[arg(long, env = "NEWS_HOMEPAGE_URL", default_value = "https://www.catalannews.com")]
    pub homepage_url: String,

    #[command(subcommand)]
    pub command: Command,
}

/// The three pipeline jobs.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch the homepage and insert newly discovered article URLs
    Discover,

    /// Enrich one pending record with title, photo URL, and body text
    Enrich,

    /// Enrich one pending record, extract its publication date, and rehost
    /// the photo in object storage
    EnrichFull(RehostArgs),
}

/// Object-storage settings for the photo-rehosting job.
///
/// S3 credentials themselves come from the standard `AWS_ACCESS_KEY_ID` /
/// `AWS_SECRET_ACCESS_KEY` environment variables consumed by `aws-config`.
#[derive(clap::Args, Debug)]
pub struct RehostArgs {
    /// Bucket that receives rehosted photos
    #[arg(long, env = "R2_BUCKET")]
    pub bucket: String,

    /// S3-compatible endpoint URL (e.g. the account R2 endpoint)
    #[arg(long, env = "R2_ENDPOINT")]
    pub endpoint: String,

    /// Public base URL (custom domain) used to build rehosted photo URLs
    #[arg(long, env = "R2_PUBLIC_BASE_URL")]
    pub public_base_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Vec<&'static str> {
        vec![
            "catalan_news_pipeline",
            "--cloudflare-account-id",
            "acct",
            "--cloudflare-database-id",
            "db",
            "--cloudflare-api-key",
            "key",
        ]
    }

    #[test]
    fn test_discover_parsing() {
        let mut args = base_args();
        args.push("discover");
        let cli = Cli::parse_from(&args);

        assert_eq!(cli.cloudflare_account_id, "acct");
        assert_eq!(cli.homepage_url, "https://www.catalannews.com");
        assert!(matches!(cli.command, Command::Discover));
    }

    #[test]
    fn test_enrich_full_parsing() {
        let mut args = base_args();
        args.extend([
            "enrich-full",
            "--bucket",
            "photos",
            "--endpoint",
            "https://acct.r2.cloudflarestorage.com",
            "--public-base-url",
            "https://img.example.com",
        ]);
        let cli = Cli::parse_from(&args);

        match cli.command {
            Command::EnrichFull(rehost) => {
                assert_eq!(rehost.bucket, "photos");
                assert_eq!(rehost.public_base_url, "https://img.example.com");
            }
            other => panic!("expected enrich-full, got {other:?}"),
        }
    }

    #[test]
    fn test_homepage_override() {
        let mut args = base_args();
        args.extend(["--homepage-url", "https://example.org", "enrich"]);
        let cli = Cli::parse_from(&args);

        assert_eq!(cli.homepage_url, "https://example.org");
        assert!(matches!(cli.command, Command::Enrich));
    }
}
