//! Catalan News scraper.
//!
//! Discovers article links from the [Catalan News](https://www.catalannews.com)
//! homepage and extracts title, lead photo, body text, and the
//! "First published" label from individual article pages.
//!
//! The CSS class names are the site's generated ones and are expected to
//! break when the site is redeployed; they are kept in one place here.

use crate::models::ExtractedArticle;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use std::error::Error;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Maximum number of homepage entries considered per discovery run.
pub const ARTICLE_LIMIT: usize = 10;

/// Sites reject reqwest's default identifier, so article fetches present a
/// browser-like User-Agent.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/114.0.0.0 Safari/537.36";

static PUBLISHED_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)First published[:\s]*").unwrap());

/// Index the homepage and return absolute article URLs.
///
/// A non-success status or transport failure aborts the discovery job;
/// there is nothing useful to do without the homepage.
#[instrument(level = "info", skip_all, fields(%homepage_url))]
pub async fn index_articles(homepage_url: &str) -> Result<Vec<String>, Box<dyn Error>> {
    let base_url = Url::parse(homepage_url)?;
    let html = reqwest::get(homepage_url)
        .await?
        .error_for_status()?
        .text()
        .await?;

    let urls = parse_article_links(&html, &base_url);
    info!(count = urls.len(), "Indexed article URLs");
    debug!(?urls, "Discovered URLs");
    Ok(urls)
}

/// Extract up to [`ARTICLE_LIMIT`] story links from homepage HTML.
///
/// Each `article` element is expected to carry a story link anchor;
/// entries without one are skipped. Site-relative hrefs are resolved
/// against the homepage origin.
pub fn parse_article_links(html: &str, base_url: &Url) -> Vec<String> {
    let document = Html::parse_document(html);
    let article_selector = Selector::parse("article").unwrap();
    let link_selector = Selector::parse("a.home-story_link__6nXJf").unwrap();

    let mut urls = Vec::new();
    for article in document.select(&article_selector).take(ARTICLE_LIMIT) {
        let Some(link) = article.select(&link_selector).next() else {
            continue;
        };
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        match base_url.join(href) {
            Ok(resolved) => urls.push(resolved.to_string()),
            Err(e) => warn!(%href, error = %e, "Skipping unresolvable href"),
        }
    }
    urls
}

/// Fetch one article page and extract its fields.
///
/// Only the fetch itself can fail; a page that matches none of the
/// selectors yields an [`ExtractedArticle`] full of `None`s.
#[instrument(level = "info", skip_all, fields(%url))]
pub async fn fetch_article(url: &str) -> Result<ExtractedArticle, Box<dyn Error>> {
    let client = reqwest::Client::new();
    let html = client
        .get(url)
        .header(reqwest::header::USER_AGENT, BROWSER_USER_AGENT)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    let article = extract_article(&html);
    info!(
        title = ?article.title,
        photo = ?article.photo,
        body_bytes = article.body.as_ref().map(String::len).unwrap_or(0),
        published = ?article.published_date,
        "Extracted article fields"
    );
    Ok(article)
}

/// Extract title, photo, body, and publication date label from article HTML.
///
/// Selector misses yield `None` for the corresponding field rather than an
/// error.
pub fn extract_article(html: &str) -> ExtractedArticle {
    let document = Html::parse_document(html);

    ExtractedArticle {
        title: extract_title(&document),
        photo: extract_photo(&document),
        body: extract_body(&document),
        published_date: extract_published_date(&document),
    }
}

/// First top-level heading, trimmed.
fn extract_title(document: &Html) -> Option<String> {
    let selector = Selector::parse("h1").unwrap();
    document
        .select(&selector)
        .next()
        .map(|h1| h1.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
}

/// `src` of the image nested in the lead-media figure.
fn extract_photo(document: &Html) -> Option<String> {
    let selector = Selector::parse("figure.representative-media_figure__DiZdo img").unwrap();
    document
        .select(&selector)
        .next()
        .and_then(|img| img.value().attr("src"))
        .map(str::to_string)
}

/// Paragraphs and subheadings of the story body, joined with blank lines.
fn extract_body(document: &Html) -> Option<String> {
    let selector = Selector::parse("div.story-body_body__yAPG3 p, div.story-body_body__yAPG3 h4")
        .unwrap();

    let paragraphs: Vec<String> = document
        .select(&selector)
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();

    if paragraphs.is_empty() {
        None
    } else {
        Some(paragraphs.join("\n\n"))
    }
}

/// The date string following the "First published" label.
///
/// The label and the date may share a text node or sit in adjacent nodes
/// (e.g. a `strong` label followed by plain text), so the remainder of the
/// matching node is taken first and the following non-empty node otherwise.
fn extract_published_date(document: &Html) -> Option<String> {
    let mut nodes = document.root_element().text();
    while let Some(node) = nodes.next() {
        let Some(label) = PUBLISHED_LABEL.find(node) else {
            continue;
        };
        let rest = node[label.end()..].trim();
        if !rest.is_empty() {
            return Some(rest.to_string());
        }
        for follow in nodes.by_ref() {
            let follow = follow.trim();
            if !follow.is_empty() {
                return Some(follow.to_string());
            }
        }
        return None;
    }
    None
}
