//! Discovery job: index the homepage and insert new article records.

use crate::config::Config;
use crate::db::{D1Client, InsertOutcome};
use crate::scrapers::catalannews;
use crate::utils::url_id;
use std::error::Error;
use tracing::{error, info, instrument};

/// Run one discovery pass.
///
/// Fails outright only when the homepage itself cannot be fetched. Each
/// candidate URL is inserted independently: duplicates are skipped,
/// rejected inserts and per-item transport errors are logged and the batch
/// continues.
#[instrument(level = "info", skip_all)]
pub async fn run(config: &Config) -> Result<(), Box<dyn Error>> {
    let urls = catalannews::index_articles(&config.homepage_url).await?;
    let db = D1Client::new(config);

    let mut outcomes = Vec::with_capacity(urls.len());
    for url in &urls {
        match db.insert_article(&url_id(url), url).await {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => {
                error!(%url, error = %e, "Error reaching the database");
                outcomes.push(InsertOutcome::Failed);
            }
        }
    }

    let inserted = inserted_count(&outcomes);
    info!(attempted = urls.len(), inserted, "Discovery completed");
    println!("Process completed. Inserted {inserted} new records.");
    Ok(())
}

/// Count only genuinely new rows; duplicates and failures do not count.
pub fn inserted_count(outcomes: &[InsertOutcome]) -> usize {
    outcomes
        .iter()
        .filter(|o| matches!(o, InsertOutcome::Inserted))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicates_do_not_increment_count() {
        let outcomes = [
            InsertOutcome::Inserted,
            InsertOutcome::Duplicate,
            InsertOutcome::Inserted,
            InsertOutcome::Duplicate,
            InsertOutcome::Failed,
        ];

        assert_eq!(inserted_count(&outcomes), 2);
    }

    #[test]
    fn test_empty_batch_counts_zero() {
        assert_eq!(inserted_count(&[]), 0);
    }
}
