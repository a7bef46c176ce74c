//! Photo rehosting into S3-compatible object storage.
//!
//! The full enrichment job re-uploads each article's lead photo to an owned
//! bucket (Cloudflare R2 over the S3 protocol) and substitutes a public URL
//! built from a configured custom domain. Keys are content-addressed and
//! namespaced by record id.
//!
//! Every failure mode here degrades to "no rehosted URL": the enrichment
//! run continues and the photo field is left empty.

use crate::config::RehostConfig;
use aws_config::meta::region::RegionProviderChain;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use aws_sdk_s3::Client;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use sha2::{Digest, Sha256};
use tracing::{debug, instrument, warn};

/// Short content hash used in object keys.
///
/// Same construction as the record `url_id`: URL-safe base64 of the
/// SHA-256 digest, truncated to 16 characters.
pub fn content_hash(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    URL_SAFE_NO_PAD.encode(digest)[..16].to_string()
}

/// Object key for a rehosted photo: `articles/{record_id}/{hash}{ext}`.
pub fn photo_key(record_id: i64, hash: &str, content_type: Option<&str>) -> String {
    format!("articles/{record_id}/{hash}{}", extension_for(content_type))
}

/// Public URL for an object key under the configured custom domain.
pub fn public_url(public_base_url: &str, key: &str) -> String {
    format!("{}/{}", public_base_url.trim_end_matches('/'), key)
}

fn extension_for(content_type: Option<&str>) -> &'static str {
    match content_type {
        Some(ct) if ct.starts_with("image/jpeg") => ".jpg",
        Some(ct) if ct.starts_with("image/png") => ".png",
        Some(ct) if ct.starts_with("image/webp") => ".webp",
        Some(ct) if ct.starts_with("image/gif") => ".gif",
        _ => "",
    }
}

/// Client for downloading photos and uploading them to the bucket.
pub struct PhotoStore {
    s3: Client,
    http: reqwest::Client,
    config: RehostConfig,
}

impl PhotoStore {
    /// Build an S3 client against the configured endpoint.
    ///
    /// Credentials come from the standard `AWS_ACCESS_KEY_ID` /
    /// `AWS_SECRET_ACCESS_KEY` environment variables. R2 ignores the
    /// region, so any placeholder satisfies the SDK.
    pub async fn connect(config: RehostConfig) -> Self {
        let region_provider = RegionProviderChain::default_provider().or_else(Region::new("auto"));
        let aws_config = aws_config::from_env().region(region_provider).load().await;
        let s3_config = aws_sdk_s3::config::Builder::from(&aws_config)
            .force_path_style(true)
            .endpoint_url(&config.endpoint)
            .build();

        Self {
            s3: Client::from_conf(s3_config),
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Download a photo and upload it under a content-addressed key.
    ///
    /// Returns the public URL of the rehosted object, or `None` when any
    /// step fails. Download and upload failures are reported separately.
    #[instrument(level = "info", skip_all, fields(%record_id, %photo_url))]
    pub async fn rehost(&self, record_id: i64, photo_url: &str) -> Option<String> {
        let (bytes, content_type) = match self.download(photo_url).await {
            Ok(downloaded) => downloaded,
            Err(e) => {
                warn!(error = %e, "Photo download failed; leaving photo empty");
                return None;
            }
        };

        let key = photo_key(record_id, &content_hash(&bytes), content_type.as_deref());
        match self.upload(&key, bytes, content_type.as_deref()).await {
            Ok(()) => {
                let url = public_url(&self.config.public_base_url, &key);
                debug!(%key, %url, "Photo rehosted");
                Some(url)
            }
            Err(e) => {
                warn!(%key, error = %e, "Photo upload failed; leaving photo empty");
                None
            }
        }
    }

    /// Stream the photo body into memory, keeping its content type.
    async fn download(
        &self,
        photo_url: &str,
    ) -> Result<(Vec<u8>, Option<String>), Box<dyn std::error::Error>> {
        let mut response = self.http.get(photo_url).send().await?.error_for_status()?;
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let mut bytes = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            bytes.extend_from_slice(&chunk);
        }
        Ok((bytes, content_type))
    }

    async fn upload(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let mut put = self
            .s3
            .put_object()
            .bucket(&self.config.bucket)
            .key(key)
            .acl(ObjectCannedAcl::PublicRead)
            .body(ByteStream::from(bytes));
        if let Some(ct) = content_type {
            put = put.content_type(ct);
        }
        put.send().await?;
        Ok(())
    }
}
