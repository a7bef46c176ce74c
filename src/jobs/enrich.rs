//! Enrichment job: claim one pending record, extract its content, and
//! write the fields back.
//!
//! Two variants exist. The basic job extracts title, photo URL, and body.
//! The full job additionally extracts the "First published" date and
//! rehosts the photo in object storage, storing the public URL in place of
//! the original.

use crate::config::Config;
use crate::db::D1Client;
use crate::models::ExtractedArticle;
use crate::rehost::PhotoStore;
use crate::scrapers::catalannews;
use std::error::Error;
use tracing::{error, info, instrument, warn};

/// Which enrichment variant is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrichMode {
    /// Title, photo URL, and body only. Historically writes
    /// `is_crawled = false`, leaving the record pending; kept until the
    /// intended semantics are confirmed.
    Basic,
    /// Adds the publication date label and photo rehosting, and marks the
    /// record crawled.
    Full,
}

impl EnrichMode {
    /// The `is_crawled` value written back by this variant.
    pub fn marks_crawled(self) -> bool {
        matches!(self, EnrichMode::Full)
    }

    /// Whether this variant keeps the extracted publication date.
    pub fn extracts_date(self) -> bool {
        matches!(self, EnrichMode::Full)
    }
}

/// Run one enrichment pass over at most one record.
///
/// "Nothing pending" is normal termination. A failed or empty article
/// fetch releases the claim and ends the run without an update; only
/// database errors during the claim itself propagate.
#[instrument(level = "info", skip_all, fields(mode = ?mode))]
pub async fn run(
    config: &Config,
    mode: EnrichMode,
    store: Option<&PhotoStore>,
) -> Result<(), Box<dyn Error>> {
    let db = D1Client::new(config);

    let Some(record) = db.claim_pending().await? else {
        println!("No uncrawled records found.");
        return Ok(());
    };

    let mut article = match catalannews::fetch_article(&record.source_url).await {
        Ok(article) => article,
        Err(e) => {
            error!(url = %record.source_url, error = %e, "Article fetch failed; skipping record");
            db.release_claim(record.id).await?;
            return Ok(());
        }
    };

    if article.is_empty() {
        warn!(url = %record.source_url, "No heading or body content found on the page");
        db.release_claim(record.id).await?;
        return Ok(());
    }

    article = prepare_for_mode(article, mode);

    if mode == EnrichMode::Full {
        article.photo = match (store, article.photo.as_deref()) {
            (Some(store), Some(photo_url)) => store.rehost(record.id, photo_url).await,
            _ => None,
        };
    }

    println!("Fetched title: {:?}", article.title);
    println!("Fetched photo URL: {:?}", article.photo);
    if mode.extracts_date() {
        println!("Fetched published date: {:?}", article.published_date);
    }
    println!("Fetched content: {:?}", article.body);

    info!(id = record.id, is_crawled = mode.marks_crawled(), "Writing enriched record");
    db.update_enriched(record.id, &article, mode.marks_crawled())
        .await
}

/// Drop the fields a variant does not persist.
fn prepare_for_mode(mut article: ExtractedArticle, mode: EnrichMode) -> ExtractedArticle {
    if !mode.extracts_date() {
        article.published_date = None;
    }
    article
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::update_payload;
    use crate::models::ArticleRecord;
    use crate::scrapers::catalannews::extract_article;
    use serde_json::Value;

    const ARTICLE_FIXTURE: &str = r#"
        <html><body>
            <h1>Example headline</h1>
            <figure class="representative-media_figure__DiZdo">
                <img src="https://www.catalannews.com/images/lead.jpg">
            </figure>
            <div class="story-body_body__yAPG3">
                <p>It's a story about Girona's farmers.</p>
            </div>
            <div>First published: June 5, 2025</div>
        </body></html>
    "#;

    fn claimed_record() -> ArticleRecord {
        serde_json::from_str(
            r#"{
                "id": 42,
                "url_id": "SkxD5-2KefSFXDeE",
                "source_url": "https://www.catalannews.com/x",
                "is_crawled": 0,
                "in_progress": 1
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_mode_flags() {
        assert!(!EnrichMode::Basic.marks_crawled());
        assert!(EnrichMode::Full.marks_crawled());
        assert!(!EnrichMode::Basic.extracts_date());
        assert!(EnrichMode::Full.extracts_date());
    }

    #[test]
    fn test_basic_mode_drops_published_date() {
        let article = prepare_for_mode(extract_article(ARTICLE_FIXTURE), EnrichMode::Basic);
        assert_eq!(article.published_date, None);
        assert!(article.title.is_some());
    }

    #[test]
    fn test_full_mode_keeps_published_date() {
        let article = prepare_for_mode(extract_article(ARTICLE_FIXTURE), EnrichMode::Full);
        assert_eq!(article.published_date.as_deref(), Some("June 5, 2025"));
    }

    // End to end over the pure pieces: claim a record, extract fixture
    // HTML, and check the resulting update payload addresses the claimed
    // row with the variant's is_crawled value.
    #[test]
    fn test_claimed_record_to_update_payload() {
        let record = claimed_record();
        let article = prepare_for_mode(extract_article(ARTICLE_FIXTURE), EnrichMode::Full);
        let mode = EnrichMode::Full;

        let request = update_payload(record.id, &article, mode.marks_crawled());

        assert_eq!(*request.params.last().unwrap(), Value::from(record.id));
        assert_eq!(request.params[4], Value::from(1));
        assert_eq!(request.params[0], Value::from("Example headline"));
        assert_eq!(
            request.params[2],
            Value::from("It's a story about Girona's farmers.")
        );
        // The apostrophes above never appear in the statement text.
        assert!(!request.sql.contains('\''));
    }

    #[test]
    fn test_basic_mode_payload_leaves_record_pending() {
        let record = claimed_record();
        let article = prepare_for_mode(extract_article(ARTICLE_FIXTURE), EnrichMode::Basic);

        let request = update_payload(record.id, &article, EnrichMode::Basic.marks_crawled());

        assert_eq!(request.params[4], Value::from(0));
        assert_eq!(request.params[3], Value::Null);
    }
}
