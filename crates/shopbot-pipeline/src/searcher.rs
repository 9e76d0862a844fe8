//! Candidate collection: single search calls and the multi-wave strategy.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use shopbot_core::{PipelineConfig, SearchCandidate, SearchMode, WarningLog};
use shopbot_scraper::{domain_matches, host_of, is_absolute_http_url, SearchError, SearchProvider};

use crate::pool::run_bounded;

pub const SEARCH_DEGRADED_WARNING: &str =
    "Some searches failed; results may be incomplete.";

/// Priority domains OR-ed into one scoped query.
const DOMAINS_PER_SCOPED_QUERY: usize = 4;

/// Appended to the query in the second wave to surface discounted listings.
const DISCOUNT_VARIANT: &str = "discount clearance sale";

/// How much searching a collection pass may do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionScope {
    /// First wave, then the wider second wave if too few candidates came back.
    Full,
    /// First wave only.
    Reduced,
}

#[derive(Debug, Clone)]
pub struct SearcherSettings {
    pub priority_domains: Vec<String>,
    pub excluded_domains: Vec<String>,
    pub min_candidates: usize,
    pub max_candidates: usize,
    pub concurrency: usize,
    pub timeout: Duration,
}

impl From<&PipelineConfig> for SearcherSettings {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            priority_domains: config.priority_domains.clone(),
            excluded_domains: config.excluded_domains.clone(),
            min_candidates: config.min_candidates,
            max_candidates: config.max_candidates,
            concurrency: config.search_concurrency,
            timeout: Duration::from_secs(config.search_timeout_secs),
        }
    }
}

#[derive(Debug, Clone)]
struct SearchCall {
    query: String,
    mode: SearchMode,
    page: u32,
}

pub struct CandidateSearcher {
    provider: Arc<dyn SearchProvider>,
    settings: SearcherSettings,
}

impl CandidateSearcher {
    #[must_use]
    pub fn new(provider: Arc<dyn SearchProvider>, settings: SearcherSettings) -> Self {
        Self { provider, settings }
    }

    /// Issue one search call. Failures are logged and yield no candidates;
    /// hits without an absolute http(s) URL are dropped.
    pub async fn collect(&self, query: &str, mode: SearchMode, page: u32) -> Vec<SearchCandidate> {
        self.collect_or_log(query, mode, page).await.unwrap_or_default()
    }

    /// Like [`Self::collect`], but `None` tells the caller the call failed.
    async fn collect_or_log(
        &self,
        query: &str,
        mode: SearchMode,
        page: u32,
    ) -> Option<Vec<SearchCandidate>> {
        match self.try_collect(query, mode, page).await {
            Ok(candidates) => Some(candidates),
            Err(e) => {
                tracing::warn!(
                    provider = self.provider.name(),
                    query,
                    %mode,
                    page,
                    error = %e,
                    "search call failed"
                );
                None
            }
        }
    }

    async fn try_collect(
        &self,
        query: &str,
        mode: SearchMode,
        page: u32,
    ) -> Result<Vec<SearchCandidate>, SearchError> {
        let call = self.provider.search(query, mode, page);
        let hits = tokio::time::timeout(self.settings.timeout, call)
            .await
            .map_err(|_| SearchError::Timeout {
                provider: self.provider.name().to_string(),
                timeout_secs: self.settings.timeout.as_secs(),
            })??;

        let total = hits.len();
        let candidates: Vec<SearchCandidate> = hits
            .into_iter()
            .filter_map(|hit| {
                let url = hit.url.trim();
                is_absolute_http_url(url).then(|| SearchCandidate {
                    url: url.to_string(),
                    title: hit.title.trim().to_string(),
                    snippet: hit.snippet.trim().to_string(),
                })
            })
            .collect();

        tracing::debug!(
            query,
            %mode,
            page,
            hits = total,
            usable = candidates.len(),
            "search call returned"
        );
        Ok(candidates)
    }

    /// Run the wave strategy for `query` and return unique, non-excluded
    /// candidates in discovery order, capped at `max_candidates`.
    ///
    /// Priority-retailer queries run first so their hits survive the cap.
    pub async fn collect_waves(
        &self,
        query: &str,
        scope: CollectionScope,
        warnings: &WarningLog,
    ) -> Vec<SearchCandidate> {
        let mut merged =
            CandidateSet::new(&self.settings.excluded_domains, self.settings.max_candidates);

        self.run_wave(self.first_wave(query), &mut merged, warnings).await;
        tracing::info!(wave = 1, candidates = merged.len(), "collected candidates");

        if scope == CollectionScope::Full
            && merged.len() < self.settings.min_candidates
            && !merged.is_full()
        {
            self.run_wave(Self::second_wave(query), &mut merged, warnings).await;
            tracing::info!(wave = 2, candidates = merged.len(), "collected candidates");
        }

        merged.into_candidates()
    }

    fn first_wave(&self, query: &str) -> Vec<SearchCall> {
        let mut calls: Vec<SearchCall> = self
            .settings
            .priority_domains
            .chunks(DOMAINS_PER_SCOPED_QUERY)
            .map(|domains| SearchCall {
                query: self.provider.scoped_query(query, domains),
                mode: SearchMode::Organic,
                page: 0,
            })
            .collect();
        calls.push(SearchCall {
            query: query.to_string(),
            mode: SearchMode::Organic,
            page: 0,
        });
        calls.push(SearchCall {
            query: query.to_string(),
            mode: SearchMode::Product,
            page: 0,
        });
        calls
    }

    fn second_wave(query: &str) -> Vec<SearchCall> {
        vec![
            SearchCall {
                query: query.to_string(),
                mode: SearchMode::Organic,
                page: 1,
            },
            SearchCall {
                query: query.to_string(),
                mode: SearchMode::Product,
                page: 1,
            },
            SearchCall {
                query: format!("{query} {DISCOUNT_VARIANT}"),
                mode: SearchMode::Organic,
                page: 0,
            },
        ]
    }

    async fn run_wave(
        &self,
        calls: Vec<SearchCall>,
        merged: &mut CandidateSet<'_>,
        warnings: &WarningLog,
    ) {
        let results = run_bounded(calls, self.settings.concurrency, |call| async move {
            self.collect_or_log(&call.query, call.mode, call.page).await
        })
        .await;

        for result in results {
            match result {
                Some(candidates) => merged.extend(candidates),
                None => {
                    warnings.push(SEARCH_DEGRADED_WARNING);
                }
            }
        }
    }
}

/// URL-deduplicating, domain-filtering, capped candidate accumulator.
struct CandidateSet<'a> {
    excluded_domains: &'a [String],
    cap: usize,
    seen: HashSet<String>,
    candidates: Vec<SearchCandidate>,
}

impl<'a> CandidateSet<'a> {
    fn new(excluded_domains: &'a [String], cap: usize) -> Self {
        Self {
            excluded_domains,
            cap,
            seen: HashSet::new(),
            candidates: Vec::new(),
        }
    }

    fn len(&self) -> usize {
        self.candidates.len()
    }

    fn is_full(&self) -> bool {
        self.candidates.len() >= self.cap
    }

    fn is_excluded(&self, url: &str) -> bool {
        host_of(url).is_some_and(|host| {
            self.excluded_domains
                .iter()
                .any(|domain| domain_matches(&host, domain))
        })
    }

    fn extend(&mut self, candidates: Vec<SearchCandidate>) {
        for candidate in candidates {
            if self.is_full() {
                return;
            }
            if self.is_excluded(&candidate.url) {
                tracing::debug!(url = %candidate.url, "skipping excluded domain");
                continue;
            }
            if self.seen.insert(candidate.url.clone()) {
                self.candidates.push(candidate);
            }
        }
    }

    fn into_candidates(self) -> Vec<SearchCandidate> {
        self.candidates
    }
}

#[cfg(test)]
#[path = "searcher_test.rs"]
mod tests;
