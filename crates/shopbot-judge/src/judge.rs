//! Candidate judgment: one LLM call per scraped page.

use std::sync::Arc;
use std::time::Duration;

use shopbot_core::{Judgment, RejectReason, ScrapedPage};

use crate::client::{complete_within, LlmClient};
use crate::error::LlmError;
use crate::prompts::{self, MarketContext};
use crate::verdict::parse_verdict;

#[derive(Debug, Clone)]
pub struct JudgeSettings {
    pub target_market: String,
    pub reference_currency: String,
    pub timeout: Duration,
}

pub struct CandidateJudge {
    llm: Arc<dyn LlmClient>,
    settings: JudgeSettings,
}

impl CandidateJudge {
    #[must_use]
    pub fn new(llm: Arc<dyn LlmClient>, settings: JudgeSettings) -> Self {
        Self { llm, settings }
    }

    /// Judge `page` against the shopper's own wording.
    ///
    /// Never fails: provider errors, timeouts and unparseable output all
    /// become [`Judgment::Rejected`].
    pub async fn judge(&self, page: &ScrapedPage, original_query: &str) -> Judgment {
        if page.text_content.trim().is_empty() {
            return Judgment::Rejected(RejectReason::Malformed(
                "page has no text content".to_string(),
            ));
        }

        let market = MarketContext {
            target_market: &self.settings.target_market,
            reference_currency: &self.settings.reference_currency,
        };
        let prompt = prompts::judge(page, original_query, market);

        let raw = match complete_within(self.llm.as_ref(), &prompt, self.settings.timeout).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(url = %page.url, error = %e, "judge call failed");
                return Judgment::Rejected(reject_reason(&e));
            }
        };

        match parse_verdict(&raw) {
            Ok(verdict) => {
                tracing::debug!(
                    url = %page.url,
                    relevance = verdict.relevance_score,
                    price_accuracy = verdict.price_accuracy_score,
                    price = verdict.price,
                    currency = %verdict.currency,
                    region_fit = verdict.is_region_fit,
                    "judged candidate"
                );
                Judgment::Verdict(verdict)
            }
            Err(e) => {
                tracing::debug!(
                    url = %page.url,
                    prompt_version = prompts::JUDGE_VERSION,
                    error = %e,
                    "discarding malformed verdict"
                );
                Judgment::Rejected(RejectReason::Malformed(e.to_string()))
            }
        }
    }
}

fn reject_reason(error: &LlmError) -> RejectReason {
    match error {
        LlmError::QuotaExhausted => RejectReason::QuotaExhausted,
        LlmError::Timeout { .. } => RejectReason::TimedOut,
        other => RejectReason::Unavailable(other.to_string()),
    }
}
