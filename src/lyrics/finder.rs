//! Lyrics discovery orchestration
//!
//! One call to [`LyricsFinder::find`] is one fresh run:
//! 1. guessed direct URLs, in order, until one yields text;
//! 2. otherwise the search page: blocked-page check, link discovery, scoring,
//!    then the best few candidates in score order.
//!
//! Only a network failure of the search page itself is retried. Single bad
//! candidates are logged and skipped.

use super::discovery::{self, DiscoveryContext, SearchCandidate};
use super::error::LyricsError;
use super::extract;
use super::fetch::{FetchError, FetchOptions, FetchedPage, Fetcher};
use super::query::Query;
use super::score;
use super::urls::{self, Sources};
use reqwest::Url;
use scraper::Html;
use serde::Serialize;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Everything the orchestrator is tuned with.
#[derive(Debug, Clone)]
pub struct FinderConfig {
    pub sources: Sources,
    pub referrer: Option<String>,
    /// Per-request timeout for guessed URLs; `None` keeps the client default
    pub direct_timeout: Option<Duration>,
    pub max_search_attempts: u32,
    pub retry_delay: Duration,
    /// How many ranked search candidates get fetched
    pub top_candidates: usize,
    pub max_links: usize,
    pub ancestor_depth: usize,
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            sources: Sources::default(),
            referrer: Some("https://www.google.com/".to_string()),
            direct_timeout: Some(Duration::from_secs(8)),
            max_search_attempts: 2,
            retry_delay: Duration::from_secs(2),
            top_candidates: 3,
            max_links: 10,
            ancestor_depth: 5,
        }
    }
}

/// Lyrics found for a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Lyrics {
    /// Normalized `"Artist - Title"` label
    pub query: String,
    /// Page the text was extracted from
    pub url: String,
    pub text: String,
}

pub struct LyricsFinder<F> {
    fetcher: F,
    config: FinderConfig,
}

/// The caller's token fired.
struct Cancelled;

impl From<Cancelled> for LyricsError {
    fn from(_: Cancelled) -> Self {
        LyricsError::Cancelled
    }
}

enum SearchFailure {
    Blocked(String),
    Network(FetchError),
    Cancelled,
}

impl From<Cancelled> for SearchFailure {
    fn from(_: Cancelled) -> Self {
        SearchFailure::Cancelled
    }
}

impl<F: Fetcher> LyricsFinder<F> {
    pub fn new(fetcher: F, config: FinderConfig) -> Self {
        Self { fetcher, config }
    }

    /// Look up lyrics for a raw `"Artist - Title"` label.
    pub async fn find(&self, raw_label: &str, cancel: &CancellationToken) -> Result<Lyrics, LyricsError> {
        if cancel.is_cancelled() {
            return Err(LyricsError::Cancelled);
        }

        let query = Query::parse(raw_label);
        if query.is_empty() {
            debug!(raw = %query.raw_text, "nothing left of the label after normalization");
            return Err(LyricsError::not_found());
        }
        info!(artist = %query.artist, title = %query.title, "lyrics lookup");

        let mut tried = Vec::new();
        if let Some(found) = self.direct_attempt(&query, &mut tried, cancel).await? {
            return Ok(found);
        }
        debug!(tried = tried.len(), "direct urls exhausted");

        self.search_phase(&query, &tried, cancel).await
    }

    async fn direct_attempt(
        &self,
        query: &Query,
        tried: &mut Vec<String>,
        cancel: &CancellationToken,
    ) -> Result<Option<Lyrics>, Cancelled> {
        let opts = FetchOptions {
            ignore_http_errors: false,
            referrer: self.config.referrer.clone(),
            timeout: self.config.direct_timeout,
        };

        for candidate in urls::synthesize(query, &self.config.sources) {
            debug!(url = %candidate.url, strategy = candidate.strategy.label(), "trying direct url");
            tried.push(candidate.url.clone());
            match self.fetch(&candidate.url, &opts, cancel).await? {
                Ok(page) => {
                    if let Some(found) = lyrics_from_page(query, &page) {
                        info!(url = %found.url, "found lyrics at direct url");
                        return Ok(Some(found));
                    }
                    debug!(url = %candidate.url, "no lyrics container");
                }
                Err(e) => debug!(error = %e, "direct url failed"),
            }
        }
        Ok(None)
    }

    async fn search_phase(
        &self,
        query: &Query,
        tried: &[String],
        cancel: &CancellationToken,
    ) -> Result<Lyrics, LyricsError> {
        let attempts = self.config.max_search_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            info!(attempt, of = attempts, "search attempt");
            match self.search_attempt(query, tried, cancel).await {
                Ok(Some(found)) => return Ok(found),
                Ok(None) => {
                    info!("no usable search candidates");
                    return Err(LyricsError::not_found());
                }
                Err(SearchFailure::Blocked(url)) => {
                    warn!(%url, "search page blocked");
                    return Err(LyricsError::Blocked { url });
                }
                Err(SearchFailure::Cancelled) => return Err(LyricsError::Cancelled),
                Err(SearchFailure::Network(e)) => {
                    warn!(attempt, error = %e, "search attempt failed");
                    last_error = Some(e);
                    if attempt < attempts {
                        self.back_off(cancel).await?;
                    }
                }
            }
        }

        Err(LyricsError::NotFound {
            cause: last_error.map(|e| e.to_string()),
        })
    }

    async fn search_attempt(
        &self,
        query: &Query,
        tried: &[String],
        cancel: &CancellationToken,
    ) -> Result<Option<Lyrics>, SearchFailure> {
        let opts = FetchOptions {
            ignore_http_errors: true,
            referrer: self.config.referrer.clone(),
            timeout: None,
        };
        let search_url = urls::search_url(&self.config.sources, &query.phrase());
        debug!(url = %search_url, "fetching search page");

        let page = match self.fetch(&search_url, &opts, cancel).await? {
            Ok(page) => page,
            Err(e) if e.is_network() => return Err(SearchFailure::Network(e)),
            Err(e) => {
                debug!(error = %e, "search page unusable");
                return Ok(None);
            }
        };

        let ranked = self.rank_search_page(query, &page)?;
        for candidate in ranked
            .into_iter()
            .filter(|c| !tried.contains(&c.url))
            .take(self.config.top_candidates)
        {
            debug!(url = %candidate.url, score = candidate.score, "trying search candidate");
            match self.fetch(&candidate.url, &opts, cancel).await? {
                Ok(page) if (200..300).contains(&page.status) || !page.body.is_empty() => {
                    if let Some(found) = lyrics_from_page(query, &page) {
                        info!(url = %found.url, score = candidate.score, "found lyrics via search");
                        return Ok(Some(found));
                    }
                    debug!(url = %candidate.url, "no lyrics container");
                }
                Ok(page) => debug!(url = %candidate.url, status = page.status, "empty error page"),
                Err(e) => debug!(error = %e, "search candidate failed"),
            }
        }
        Ok(None)
    }

    /// Parse the results page and rank what the strategies find.
    fn rank_search_page(
        &self,
        query: &Query,
        page: &FetchedPage,
    ) -> Result<Vec<SearchCandidate>, SearchFailure> {
        let doc = Html::parse_document(&page.body);
        if discovery::is_blocked(&doc, &query.phrase()) {
            return Err(SearchFailure::Blocked(page.url.clone()));
        }

        let Ok(page_url) = Url::parse(&page.url) else {
            debug!(url = %page.url, "search page url does not parse");
            return Ok(Vec::new());
        };
        let ctx = DiscoveryContext {
            page_url: &page_url,
            lyrics_host: &self.config.sources.lyrics_host,
            max_links: self.config.max_links,
            ancestor_depth: self.config.ancestor_depth,
        };

        let Some((strategy, found)) = discovery::discover(&doc, &ctx) else {
            return Ok(Vec::new());
        };
        let ranked = score::rank(query, found);
        debug!(
            strategy = strategy.label(),
            candidates = ranked.len(),
            best = ranked.first().map(|c| c.score).unwrap_or_default(),
            "ranked search candidates"
        );
        Ok(ranked)
    }

    async fn fetch(
        &self,
        url: &str,
        opts: &FetchOptions,
        cancel: &CancellationToken,
    ) -> Result<Result<FetchedPage, FetchError>, Cancelled> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Cancelled),
            res = self.fetcher.fetch(url, opts) => Ok(res),
        }
    }

    async fn back_off(&self, cancel: &CancellationToken) -> Result<(), LyricsError> {
        debug!(delay_ms = self.config.retry_delay.as_millis() as u64, "backing off before retry");
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(LyricsError::Cancelled),
            _ = tokio::time::sleep(self.config.retry_delay) => Ok(()),
        }
    }
}

fn lyrics_from_page(query: &Query, page: &FetchedPage) -> Option<Lyrics> {
    let doc = Html::parse_document(&page.body);
    extract::extract(&doc).map(|text| Lyrics {
        query: query.label(),
        url: page.url.clone(),
        text,
    })
}
