//! Cloudflare D1 REST client.
//!
//! All persistence goes through the D1 query endpoint: an HTTP POST carrying
//! a JSON `{ "sql": ..., "params": [...] }` body, bearer-token
//! authenticated, answered with a JSON envelope holding a results array.
//!
//! Free text always travels in `params` with `?` placeholders in the SQL;
//! nothing extracted from a page is ever interpolated into a statement.

use crate::config::Config;
use crate::models::{ArticleRecord, ExtractedArticle};
use crate::utils::truncate_for_log;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::error::Error;
use tracing::{debug, error, info, instrument};

/// JSON body sent to the D1 query endpoint.
#[derive(Debug, Serialize, PartialEq)]
pub struct QueryRequest {
    pub sql: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<Value>,
}

/// Envelope returned by the D1 API.
#[derive(Debug, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub result: Vec<QueryResult>,
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub errors: Vec<ApiMessage>,
}

/// One statement's result inside the envelope.
#[derive(Debug, Deserialize)]
pub struct QueryResult {
    #[serde(default)]
    pub results: Vec<Value>,
    #[serde(default)]
    pub success: bool,
}

/// Error or informational message in the envelope.
#[derive(Debug, Deserialize)]
pub struct ApiMessage {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

/// Outcome of one discovery insert attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new row was created.
    Inserted,
    /// The `url_id` already exists; expected, not an error.
    Duplicate,
    /// The API rejected the statement; logged, the batch continues.
    Failed,
}

/// Build the insert payload for a newly discovered article URL.
pub fn insert_payload(url_id: &str, source_url: &str) -> QueryRequest {
    QueryRequest {
        sql: "INSERT INTO catalan_news (url_id, source_url) VALUES (?, ?)".to_string(),
        params: vec![Value::from(url_id), Value::from(source_url)],
    }
}

/// Build the atomic claim statement.
///
/// A single UPDATE flips `in_progress` on one pending row and returns it,
/// so two concurrent enrichment runs cannot select the same record.
pub fn claim_payload() -> QueryRequest {
    QueryRequest {
        sql: "UPDATE catalan_news SET in_progress = 1 \
              WHERE id = (SELECT id FROM catalan_news \
              WHERE is_crawled = 0 AND in_progress = 0 LIMIT 1) \
              RETURNING *"
            .to_string(),
        params: Vec::new(),
    }
}

/// Build the enrichment write-back payload.
///
/// Optional fields become SQL NULL via JSON nulls in `params`; the claim
/// flag is always cleared. `is_crawled` travels as a 0/1 integer since the
/// column is a SQLite boolean.
pub fn update_payload(id: i64, article: &ExtractedArticle, is_crawled: bool) -> QueryRequest {
    QueryRequest {
        sql: "UPDATE catalan_news SET title_en = ?, photo = ?, content_en = ?, \
              published_date = ?, is_crawled = ?, in_progress = 0 WHERE id = ?"
            .to_string(),
        params: vec![
            opt_param(article.title.as_deref()),
            opt_param(article.photo.as_deref()),
            opt_param(article.body.as_deref()),
            opt_param(article.published_date.as_deref()),
            Value::from(i64::from(is_crawled)),
            Value::from(id),
        ],
    }
}

/// Build the statement that returns a claimed record to the pending pool.
pub fn release_payload(id: i64) -> QueryRequest {
    QueryRequest {
        sql: "UPDATE catalan_news SET in_progress = 0 WHERE id = ?".to_string(),
        params: vec![Value::from(id)],
    }
}

fn opt_param(value: Option<&str>) -> Value {
    match value {
        Some(v) => Value::from(v),
        None => Value::Null,
    }
}

/// True when the envelope reports a UNIQUE constraint violation.
///
/// D1 answers some conflicting inserts with HTTP 409 and others with a
/// 200 envelope carrying the SQLite constraint error, so both are treated
/// as the expected-duplicate case.
pub fn is_unique_violation(response: &QueryResponse) -> bool {
    response
        .errors
        .iter()
        .any(|e| e.message.contains("UNIQUE constraint"))
}

/// Thin client over the D1 query endpoint.
pub struct D1Client {
    http: Client,
    endpoint: String,
    api_key: String,
}

impl D1Client {
    /// Create a client for the configured account and database.
    pub fn new(config: &Config) -> Self {
        Self {
            http: Client::new(),
            endpoint: config.d1_endpoint(),
            api_key: config.api_key.clone(),
        }
    }

    async fn send(&self, request: &QueryRequest) -> Result<reqwest::Response, reqwest::Error> {
        self.http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
    }

    /// Execute a statement and return the rows of its first result set.
    ///
    /// Non-success HTTP statuses and `success: false` envelopes are
    /// surfaced as errors after being logged with status and body.
    #[instrument(level = "debug", skip_all)]
    pub async fn query(&self, request: &QueryRequest) -> Result<Vec<Value>, Box<dyn Error>> {
        let response = self.send(request).await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            error!(%status, body = %truncate_for_log(&body, 500), "D1 query rejected");
            return Err(format!("D1 query failed with status {status}").into());
        }

        let envelope: QueryResponse = serde_json::from_str(&body)?;
        if !envelope.success {
            error!(body = %truncate_for_log(&body, 500), "D1 envelope reported failure");
            return Err("D1 envelope reported failure".into());
        }

        Ok(envelope
            .result
            .into_iter()
            .next()
            .map(|r| r.results)
            .unwrap_or_default())
    }

    /// Insert a discovered article, classifying conflicts as duplicates.
    ///
    /// Only transport-level failures propagate; a rejected statement is
    /// logged and reported as [`InsertOutcome::Failed`] so the discovery
    /// batch can continue with the next URL.
    #[instrument(level = "info", skip_all, fields(%url_id))]
    pub async fn insert_article(
        &self,
        url_id: &str,
        source_url: &str,
    ) -> Result<InsertOutcome, Box<dyn Error>> {
        let request = insert_payload(url_id, source_url);
        let response = self.send(&request).await?;
        let status = response.status();

        if status == StatusCode::CONFLICT {
            info!(%source_url, "Duplicate record skipped");
            return Ok(InsertOutcome::Duplicate);
        }

        let body = response.text().await?;
        if !status.is_success() {
            error!(%status, %source_url, body = %truncate_for_log(&body, 500), "Failed to insert record");
            return Ok(InsertOutcome::Failed);
        }

        let envelope: QueryResponse = serde_json::from_str(&body)?;
        if envelope.success {
            debug!(%source_url, "Inserted record");
            Ok(InsertOutcome::Inserted)
        } else if is_unique_violation(&envelope) {
            info!(%source_url, "Duplicate record skipped");
            Ok(InsertOutcome::Duplicate)
        } else {
            error!(%source_url, body = %truncate_for_log(&body, 500), "Failed to insert record");
            Ok(InsertOutcome::Failed)
        }
    }

    /// Atomically claim one pending record.
    ///
    /// Returns `Ok(None)` when nothing is pending, which is the normal
    /// termination condition for an enrichment run.
    #[instrument(level = "info", skip_all)]
    pub async fn claim_pending(&self) -> Result<Option<ArticleRecord>, Box<dyn Error>> {
        let rows = self.query(&claim_payload()).await?;
        match rows.into_iter().next() {
            Some(row) => {
                let record: ArticleRecord = serde_json::from_value(row)?;
                info!(id = record.id, url = %record.source_url, "Claimed pending record");
                Ok(Some(record))
            }
            None => {
                info!("No pending records");
                Ok(None)
            }
        }
    }

    /// Return a claimed record to the pending pool.
    ///
    /// Used when the article fetch fails or yields nothing, so the record
    /// stays visible to a later run instead of being parked in-progress
    /// forever.
    #[instrument(level = "info", skip_all, fields(%id))]
    pub async fn release_claim(&self, id: i64) -> Result<(), Box<dyn Error>> {
        self.query(&release_payload(id)).await?;
        info!("Released claim on record");
        Ok(())
    }

    /// Write the enriched fields back by record id.
    ///
    /// A rejected update is logged with status and body and otherwise
    /// ignored: there is no retry and nothing to roll back.
    #[instrument(level = "info", skip_all, fields(%id))]
    pub async fn update_enriched(
        &self,
        id: i64,
        article: &ExtractedArticle,
        is_crawled: bool,
    ) -> Result<(), Box<dyn Error>> {
        let request = update_payload(id, article, is_crawled);
        let response = self.send(&request).await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            error!(%status, body = %truncate_for_log(&body, 500), "Failed to update record");
            return Ok(());
        }

        match serde_json::from_str::<QueryResponse>(&body) {
            Ok(envelope) if envelope.success => {
                info!("Record updated successfully");
            }
            _ => {
                error!(body = %truncate_for_log(&body, 500), "Failed to update record");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_payload_is_parameterized() {
        let request = insert_payload("SkxD5-2KefSFXDeE", "https://www.catalannews.com/x");

        assert_eq!(request.sql.matches('?').count(), 2);
        assert!(!request.sql.contains("catalannews.com"));
        assert_eq!(
            request.params,
            vec![
                Value::from("SkxD5-2KefSFXDeE"),
                Value::from("https://www.catalannews.com/x"),
            ]
        );
    }

    #[test]
    fn test_claim_payload_is_atomic() {
        let request = claim_payload();

        assert!(request.sql.contains("RETURNING *"));
        assert!(request.sql.contains("in_progress = 1"));
        assert!(request.sql.contains("is_crawled = 0 AND in_progress = 0"));
        assert!(request.params.is_empty());
    }

    #[test]
    fn test_update_payload_carries_apostrophes_in_params() {
        let article = ExtractedArticle {
            title: Some("Barcelona's mayor announces 'ambitious' plan".to_string()),
            photo: Some("https://img.example.com/a.jpg".to_string()),
            body: Some("The city's council said it's \"on track\".".to_string()),
            published_date: None,
        };

        let request = update_payload(42, &article, true);

        // No free text reaches the statement itself, so an apostrophe can
        // never terminate a literal.
        assert!(!request.sql.contains('\''));
        assert_eq!(request.sql.matches('?').count(), 6);
        assert_eq!(
            request.params[0],
            Value::from("Barcelona's mayor announces 'ambitious' plan")
        );
        assert_eq!(
            request.params[2],
            Value::from("The city's council said it's \"on track\".")
        );
    }

    #[test]
    fn test_update_payload_nulls_absent_fields() {
        let article = ExtractedArticle {
            title: Some("Headline".to_string()),
            photo: None,
            body: Some("Body.".to_string()),
            published_date: None,
        };

        let request = update_payload(7, &article, false);

        assert_eq!(request.params[1], Value::Null);
        assert_eq!(request.params[3], Value::Null);
        assert_eq!(request.params[4], Value::from(0));
        assert_eq!(request.params[5], Value::from(7));
    }

    #[test]
    fn test_update_payload_clears_claim_flag() {
        let request = update_payload(1, &ExtractedArticle::default(), true);
        assert!(request.sql.contains("in_progress = 0"));
    }

    #[test]
    fn test_release_payload() {
        let request = release_payload(42);
        assert_eq!(request.sql, "UPDATE catalan_news SET in_progress = 0 WHERE id = ?");
        assert_eq!(request.params, vec![Value::from(42)]);
    }

    #[test]
    fn test_unique_violation_classification() {
        let conflict: QueryResponse = serde_json::from_str(
            r#"{
                "result": [],
                "success": false,
                "errors": [{"code": 7500, "message": "UNIQUE constraint failed: catalan_news.url_id"}]
            }"#,
        )
        .unwrap();
        assert!(is_unique_violation(&conflict));

        let other: QueryResponse = serde_json::from_str(
            r#"{
                "result": [],
                "success": false,
                "errors": [{"code": 7500, "message": "no such table: catalan_news"}]
            }"#,
        )
        .unwrap();
        assert!(!is_unique_violation(&other));
    }

    #[test]
    fn test_query_request_serialization_omits_empty_params() {
        let json = serde_json::to_string(&claim_payload()).unwrap();
        assert!(!json.contains("params"));

        let json = serde_json::to_string(&insert_payload("id", "url")).unwrap();
        assert!(json.contains("\"params\""));
    }

    #[test]
    fn test_envelope_results_deserialization() {
        let envelope: QueryResponse = serde_json::from_str(
            r#"{
                "result": [{"results": [{"id": 1, "url_id": "x", "source_url": "u"}], "success": true}],
                "success": true,
                "errors": []
            }"#,
        )
        .unwrap();

        assert!(envelope.success);
        assert_eq!(envelope.result[0].results.len(), 1);
    }
}
