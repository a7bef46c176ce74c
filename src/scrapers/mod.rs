//! Site scrapers for discovering and extracting articles.
//!
//! Each scraper follows a two-phase pattern:
//!
//! 1. **Indexing**: discover article URLs from the source's homepage
//! 2. **Extraction**: pull title, lead photo, body, and the publication
//!    date label out of a fetched article page
//!
//! Parsing is separated from fetching so every selector can be exercised
//! against fixture HTML without a network.

pub mod catalannews;
