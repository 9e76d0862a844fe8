//! Orchestrator: enhance, collect, fetch, judge, filter, rank, and fall back.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::FutureExt;
use shopbot_core::{
    CurrencyError, CurrencyNormalizer, Judgment, PipelineConfig, ProductOffer, RejectReason,
    SearchOutcome, SearchRequest, WarningLog,
};
use shopbot_judge::{CandidateJudge, ImageQueryAdapter, JudgeSettings, LlmClient, QueryEnhancer};
use shopbot_scraper::{FetchTransport, FetcherConfig, PageFetcher, SearchProvider};
use tracing::Instrument;
use uuid::Uuid;

use crate::pool::run_bounded;
use crate::rank::{accept, rank};
use crate::searcher::{CandidateSearcher, CollectionScope, SearcherSettings};

pub const NO_QUERY_WARNING: &str = "Please enter a search query or upload a product photo.";
pub const IMAGE_UNREADABLE_WARNING: &str =
    "The photo could not be analysed; it was not used for this search.";
pub const QUOTA_WARNING: &str =
    "The AI judge has reached its usage quota; some listings could not be evaluated.";
pub const NO_MATCHES_WARNING: &str =
    "No listings matched your request closely enough. Try a more general description.";
pub const FALLBACK_NOTICE_PREFIX: &str =
    "No exact matches were found. Showing similar products for";
pub const UNEXPECTED_ERROR_WARNING: &str =
    "An unexpected server error occurred. Please try again later.";

/// External collaborators the pipeline calls.
pub struct PipelineDeps {
    pub search: Arc<dyn SearchProvider>,
    pub transport: Arc<dyn FetchTransport>,
    /// Text completions: judging, enhancement, fallback queries.
    pub llm: Arc<dyn LlmClient>,
    /// Vision-capable completions for image queries.
    pub vision_llm: Arc<dyn LlmClient>,
}

/// Which pass of the algorithm produced a set of offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    Primary,
    Fallback,
}

pub struct ShoppingPipeline {
    config: PipelineConfig,
    searcher: CandidateSearcher,
    fetcher: PageFetcher,
    judge: CandidateJudge,
    enhancer: QueryEnhancer,
    vision: ImageQueryAdapter,
    normalizer: CurrencyNormalizer,
}

impl ShoppingPipeline {
    /// # Errors
    ///
    /// Returns [`CurrencyError::Unsupported`] if the configured reference
    /// currency is not in the static rate table.
    pub fn new(config: PipelineConfig, deps: PipelineDeps) -> Result<Self, CurrencyError> {
        let normalizer = CurrencyNormalizer::new(&config.reference_currency)?;
        let judge_timeout = Duration::from_secs(config.judge_timeout_secs);

        let searcher = CandidateSearcher::new(deps.search, SearcherSettings::from(&config));
        let fetcher = PageFetcher::new(
            deps.transport,
            FetcherConfig {
                timeout_secs: config.fetch_timeout_secs,
                max_text_chars: config.max_text_chars,
            },
        );
        let judge = CandidateJudge::new(
            Arc::clone(&deps.llm),
            JudgeSettings {
                target_market: config.target_market.clone(),
                reference_currency: normalizer.reference().to_string(),
                timeout: judge_timeout,
            },
        );
        let enhancer = QueryEnhancer::new(
            deps.llm,
            config.target_market.clone(),
            normalizer.reference(),
            judge_timeout,
        );
        let vision = ImageQueryAdapter::new(deps.vision_llm, judge_timeout);

        Ok(Self {
            config,
            searcher,
            fetcher,
            judge,
            enhancer,
            vision,
            normalizer,
        })
    }

    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run one search. Never fails and never panics outward: every problem
    /// ends up as a warning in the returned outcome, and an empty offer list
    /// always comes with at least one warning.
    pub async fn search(&self, request: SearchRequest) -> SearchOutcome {
        let search_id = Uuid::new_v4();
        let span = tracing::info_span!("search", %search_id);
        let warnings = WarningLog::new();

        let result = AssertUnwindSafe(self.run(&request, &warnings))
            .catch_unwind()
            .instrument(span.clone())
            .await;

        let (offers, is_alternative) = match result {
            Ok(Some(found)) => found,
            Ok(None) => (Vec::new(), false),
            Err(panic) => {
                let detail = panic
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "non-string panic payload".to_string());
                span.in_scope(|| tracing::error!(panic = %detail, "search pipeline panicked"));
                warnings.push(UNEXPECTED_ERROR_WARNING);
                (Vec::new(), false)
            }
        };

        if offers.is_empty() && warnings.is_empty() {
            warnings.push(NO_MATCHES_WARNING);
        }

        SearchOutcome {
            offers,
            warnings: warnings.snapshot(),
            is_alternative,
            searched_at: Utc::now(),
        }
    }

    /// `None` when the request carried nothing searchable.
    async fn run(
        &self,
        request: &SearchRequest,
        warnings: &WarningLog,
    ) -> Option<(Vec<ProductOffer>, bool)> {
        let raw_query = self.resolve_query(request, warnings).await?;
        tracing::info!(raw_query = %raw_query, "search started");

        let enhanced = self.enhancer.enhance(&raw_query, warnings).await;

        let offers = self
            .run_pass(&raw_query, &enhanced, Pass::Primary, warnings)
            .await;
        if !offers.is_empty() {
            let ranked = rank(offers, self.config.ranking, self.config.max_results);
            tracing::info!(offers = ranked.len(), "search finished");
            return Some((ranked, false));
        }

        let Some(broader) = self.enhancer.broaden(&raw_query, &enhanced).await else {
            tracing::info!("no offers and no fallback query");
            warnings.push(NO_MATCHES_WARNING);
            return Some((Vec::new(), false));
        };
        tracing::info!(fallback_query = %broader, "primary pass empty; trying fallback");

        let offers = self
            .run_pass(&raw_query, &broader, Pass::Fallback, warnings)
            .await;
        if offers.is_empty() {
            tracing::info!("fallback pass found nothing");
            warnings.push(NO_MATCHES_WARNING);
            return Some((Vec::new(), false));
        }

        warnings.prepend(format!("{FALLBACK_NOTICE_PREFIX} \"{broader}\"."));
        let ranked = rank(offers, self.config.ranking, self.config.max_results);
        tracing::info!(offers = ranked.len(), "search finished with fallback offers");
        Some((ranked, true))
    }

    /// The photo, when present and readable, takes precedence over text.
    async fn resolve_query(
        &self,
        request: &SearchRequest,
        warnings: &WarningLog,
    ) -> Option<String> {
        if let Some(image) = request.image.as_ref().filter(|i| !i.bytes.is_empty()) {
            match self.vision.describe(image).await {
                Ok(query) => return Some(query),
                Err(e) => {
                    tracing::warn!(error = %e, "image query extraction failed");
                    warnings.push(IMAGE_UNREADABLE_WARNING);
                }
            }
        }

        let text = request
            .text_query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty());
        if text.is_none() {
            warnings.push(NO_QUERY_WARNING);
        }
        text.map(str::to_owned)
    }

    /// Collect, fetch, judge and filter once. `judge_query` is what relevance
    /// is scored against and is always the shopper's own query;
    /// `search_query` is what is sent to the search provider.
    async fn run_pass(
        &self,
        judge_query: &str,
        search_query: &str,
        pass: Pass,
        warnings: &WarningLog,
    ) -> Vec<ProductOffer> {
        let scope = match pass {
            Pass::Primary => CollectionScope::Full,
            Pass::Fallback => CollectionScope::Reduced,
        };

        let candidates = self
            .searcher
            .collect_waves(search_query, scope, warnings)
            .await;
        if candidates.is_empty() {
            tracing::info!(?pass, "no candidates collected");
            return Vec::new();
        }

        let pages = run_bounded(candidates, self.config.fetch_concurrency, |candidate| async move {
            self.fetcher.fetch(&candidate.url).await
        })
        .await;
        let fetched = pages.len();
        let eligible: Vec<_> = pages
            .into_iter()
            .filter(|page| page.has_signal(self.config.min_text_chars))
            .collect();
        tracing::info!(?pass, fetched, eligible = eligible.len(), "fetched candidate pages");

        let judged = run_bounded(eligible, self.config.judge_concurrency, |page| async move {
            let judgment = self.judge.judge(&page, judge_query).await;
            (page, judgment)
        })
        .await;

        let mut offers = Vec::new();
        for (page, judgment) in judged {
            match judgment {
                Judgment::Verdict(verdict) => {
                    match accept(
                        &page,
                        &verdict,
                        &self.normalizer,
                        &self.config,
                        pass == Pass::Fallback,
                    ) {
                        Ok(offer) => offers.push(offer),
                        Err(reason) => {
                            tracing::debug!(url = %page.url, %reason, "candidate rejected");
                        }
                    }
                }
                Judgment::Rejected(RejectReason::QuotaExhausted) => {
                    warnings.push(QUOTA_WARNING);
                }
                Judgment::Rejected(reason) => {
                    tracing::debug!(url = %page.url, %reason, "candidate not judged");
                }
            }
        }
        tracing::info!(?pass, accepted = offers.len(), "filtered judged candidates");
        offers
    }
}
