//! Lyrics discovery pipeline
//!
//! This module provides:
//! - query normalization and direct URL synthesis
//! - a mockable document fetcher
//! - search-page link discovery and candidate scoring
//! - lyrics container extraction
//! - the orchestrator tying them together

pub mod discovery;
pub mod dom;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod finder;
pub mod query;
pub mod score;
pub mod urls;

#[cfg(test)]
pub mod testing;

pub use error::LyricsError;
pub use fetch::{Fetcher, HttpFetcher, HttpSettings};
pub use finder::{FinderConfig, Lyrics, LyricsFinder};
pub use query::Query;

use tokio_util::sync::CancellationToken;

/// One-shot lookup with a fresh HTTP client.
pub async fn find_lyrics(
    label: &str,
    http: &HttpSettings,
    config: FinderConfig,
    cancel: &CancellationToken,
) -> anyhow::Result<Result<Lyrics, LyricsError>> {
    let fetcher = HttpFetcher::new(http)?;
    Ok(LyricsFinder::new(fetcher, config).find(label, cancel).await)
}
