//! Bounded-concurrency batch lookups.
//!
//! Each label runs its own independent pipeline on a tokio task; a semaphore
//! caps how many run at once. Results come back in input order.

use crate::lyrics::{Fetcher, Lyrics, LyricsError, LyricsFinder};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupOutcome {
    pub label: String,
    pub result: Result<Lyrics, LyricsError>,
}

pub struct LookupPool<F> {
    finder: Arc<LyricsFinder<F>>,
    permits: Arc<Semaphore>,
}

impl<F: Fetcher + 'static> LookupPool<F> {
    pub fn new(finder: LyricsFinder<F>, max_concurrent: usize) -> Self {
        Self {
            finder: Arc::new(finder),
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    pub async fn run(&self, labels: Vec<String>, cancel: &CancellationToken) -> Vec<LookupOutcome> {
        tracing::info!(labels = labels.len(), "starting batch lookup");

        let mut set = JoinSet::new();
        for (idx, label) in labels.iter().cloned().enumerate() {
            let finder = Arc::clone(&self.finder);
            let permits = Arc::clone(&self.permits);
            let cancel = cancel.clone();
            set.spawn(async move {
                let result = match permits.acquire_owned().await {
                    Ok(_permit) => finder.find(&label, &cancel).await,
                    // Closed semaphore: the pool is shutting down.
                    Err(_) => Err(LyricsError::Cancelled),
                };
                (idx, result)
            });
        }

        let mut results: Vec<Option<Result<Lyrics, LyricsError>>> = vec![None; labels.len()];
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((idx, result)) => results[idx] = Some(result),
                Err(e) => tracing::warn!(error = %e, "lookup task failed"),
            }
        }

        labels
            .into_iter()
            .zip(results)
            .map(|(label, result)| {
                let result = result.unwrap_or_else(|| {
                    Err(LyricsError::NotFound {
                        cause: Some("lookup task aborted".to_string()),
                    })
                });
                if let Err(e) = &result {
                    tracing::debug!(%label, error = %e, "lookup failed");
                }
                LookupOutcome { label, result }
            })
            .collect()
    }
}
