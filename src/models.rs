//! Data models for stored article records and extracted page content.
//!
//! This module defines the core data structures used throughout the pipeline:
//! - [`ArticleRecord`]: a row of the `catalan_news` table as returned by the
//!   D1 REST API
//! - [`ExtractedArticle`]: the fields pulled out of a fetched article page
//!
//! D1 serializes SQLite booleans as JSON `0`/`1`, so boolean columns accept
//! either integers or booleans when deserializing.

use serde::{Deserialize, Deserializer, Serialize};

/// A stored article row.
///
/// Created by the discovery job with only `url_id` and `source_url` set;
/// the enrichment jobs populate the remaining fields exactly once.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArticleRecord {
    /// Database-assigned primary key.
    pub id: i64,
    /// Stable 16-character identifier derived from `source_url`.
    pub url_id: String,
    /// Absolute URL of the article page.
    pub source_url: String,
    /// Extracted headline, if enriched.
    #[serde(default)]
    pub title_en: Option<String>,
    /// Lead photo URL (original or rehosted), if enriched.
    #[serde(default)]
    pub photo: Option<String>,
    /// Body paragraphs joined by blank lines, if enriched.
    #[serde(default)]
    pub content_en: Option<String>,
    /// Free-text publication date label from the source page, if enriched.
    #[serde(default)]
    pub published_date: Option<String>,
    /// Whether an enrichment job has completed this record.
    #[serde(default, deserialize_with = "bool_from_sqlite")]
    pub is_crawled: bool,
    /// Claim flag set while an enrichment run owns this record.
    #[serde(default, deserialize_with = "bool_from_sqlite")]
    pub in_progress: bool,
}

/// Fields extracted from one article page.
///
/// Every field is optional: a selector miss yields `None` rather than a
/// failure.
#[derive(Debug, Default, PartialEq)]
pub struct ExtractedArticle {
    /// First top-level heading, trimmed.
    pub title: Option<String>,
    /// `src` of the image inside the lead-media figure.
    pub photo: Option<String>,
    /// Paragraphs and subheadings of the story body, joined with `\n\n`.
    pub body: Option<String>,
    /// Text following the "First published" label.
    pub published_date: Option<String>,
}

impl ExtractedArticle {
    /// True when neither a title nor any body text was found, which means
    /// the page yielded nothing worth persisting.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.body.is_none()
    }
}

/// Accept SQLite-style `0`/`1` integers as well as JSON booleans.
fn bool_from_sqlite<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum SqliteBool {
        Bool(bool),
        Int(i64),
    }

    Ok(match SqliteBool::deserialize(deserializer)? {
        SqliteBool::Bool(b) => b,
        SqliteBool::Int(n) => n != 0,
    })
}
