//! The pipeline's batch jobs.
//!
//! Each job is a short-lived, strictly sequential process sharing only the
//! database with the others:
//!
//! - [`discover`]: homepage → article URLs → insert pending records
//! - [`enrich`]: claim one pending record → extract → write back

pub mod discover;
pub mod enrich;
