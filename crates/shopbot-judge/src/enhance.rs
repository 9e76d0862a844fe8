//! Query enhancement and fallback-query derivation.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use shopbot_core::WarningLog;

use crate::client::{complete_within, LlmClient};
use crate::prompts::{self, MarketContext};
use crate::verdict::strip_wrappers;

pub const ENHANCE_UNAVAILABLE_WARNING: &str =
    "Query enhancement is unavailable; searching with your original wording.";

const MAX_QUERY_CHARS: usize = 200;

pub struct QueryEnhancer {
    llm: Arc<dyn LlmClient>,
    target_market: String,
    reference_currency: String,
    timeout: Duration,
}

impl QueryEnhancer {
    #[must_use]
    pub fn new(
        llm: Arc<dyn LlmClient>,
        target_market: impl Into<String>,
        reference_currency: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            llm,
            target_market: target_market.into(),
            reference_currency: reference_currency.into(),
            timeout,
        }
    }

    fn market(&self) -> MarketContext<'_> {
        MarketContext {
            target_market: &self.target_market,
            reference_currency: &self.reference_currency,
        }
    }

    /// Rewrite `raw_query` into a product-search string.
    ///
    /// On any failure the original query comes back unchanged and one
    /// warning is recorded in `warnings`.
    pub async fn enhance(&self, raw_query: &str, warnings: &WarningLog) -> String {
        let prompt = prompts::enhance(raw_query, self.market());
        let cleaned = match complete_within(self.llm.as_ref(), &prompt, self.timeout).await {
            Ok(raw) => clean_query(&raw),
            Err(e) => {
                tracing::warn!(error = %e, "query enhancement failed");
                None
            }
        };

        if let Some(enhanced) = cleaned {
            tracing::info!(raw_query, enhanced_query = %enhanced, "enhanced query");
            enhanced
        } else {
            warnings.push(ENHANCE_UNAVAILABLE_WARNING);
            raw_query.trim().to_string()
        }
    }

    /// Ask for one slightly broader query. Returns `None` when the call fails
    /// or the suggestion is no different from what was already searched.
    pub async fn broaden(&self, raw_query: &str, enhanced_query: &str) -> Option<String> {
        let prompt = prompts::fallback(raw_query, enhanced_query, self.market());
        let raw = match complete_within(self.llm.as_ref(), &prompt, self.timeout).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, "fallback query derivation failed");
                return None;
            }
        };

        let suggestion = strip_wrappers(&raw)
            .and_then(|object| serde_json::from_str::<Value>(object).ok())
            .and_then(|v| v.get("query").and_then(Value::as_str).map(str::to_owned))
            .and_then(|q| clean_query(&q));

        let Some(query) = suggestion else {
            tracing::debug!(
                prompt_version = prompts::FALLBACK_VERSION,
                "unusable fallback suggestion"
            );
            return None;
        };

        let already_tried = [raw_query, enhanced_query]
            .iter()
            .any(|q| q.trim().eq_ignore_ascii_case(&query));
        if already_tried {
            tracing::debug!(query = %query, "fallback suggestion repeats an earlier query");
            return None;
        }
        Some(query)
    }
}

/// Reduce a free-text completion to a single clean search line.
pub(crate) fn clean_query(raw: &str) -> Option<String> {
    let line = raw.lines().map(str::trim).find(|l| !l.is_empty())?;
    let line = strip_label(line);
    let line = line.trim_matches(|c: char| matches!(c, '"' | '\'' | '`' | '“' | '”'));
    let collapsed = line.split_whitespace().collect::<Vec<_>>().join(" ");
    let capped: String = collapsed.chars().take(MAX_QUERY_CHARS).collect();
    let capped = capped.trim().to_string();
    (!capped.is_empty()).then_some(capped)
}

fn strip_label(line: &str) -> &str {
    let lower = line.to_ascii_lowercase();
    for label in ["search query:", "query:"] {
        if lower.starts_with(label) {
            return line[label.len()..].trim_start();
        }
    }
    line
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::client::Prompt;
    use crate::error::LlmError;

    struct QueuedLlm {
        replies: Mutex<Vec<Result<String, LlmError>>>,
    }

    impl QueuedLlm {
        fn new(replies: Vec<Result<String, LlmError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies),
            })
        }
    }

    #[async_trait]
    impl LlmClient for QueuedLlm {
        async fn complete(&self, _prompt: &Prompt) -> Result<String, LlmError> {
            self.replies.lock().unwrap().remove(0)
        }
    }

    fn enhancer(llm: Arc<QueuedLlm>) -> QueryEnhancer {
        QueryEnhancer::new(llm, "United States", "USD", Duration::from_secs(1))
    }

    #[tokio::test]
    async fn enhance_returns_cleaned_completion() {
        let llm = QueuedLlm::new(vec![Ok("\"blue painter's tape 2 inch roll\"\n".to_string())]);
        let warnings = WarningLog::new();
        let q = enhancer(llm).enhance("cinta azul de pintor", &warnings).await;
        assert_eq!(q, "blue painter's tape 2 inch roll");
        assert!(warnings.is_empty());
    }

    #[tokio::test]
    async fn enhance_failure_returns_original_and_warns_once() {
        let llm = QueuedLlm::new(vec![
            Err(LlmError::QuotaExhausted),
            Ok("   ".to_string()),
        ]);
        let warnings = WarningLog::new();
        let enhancer = enhancer(llm);
        assert_eq!(enhancer.enhance(" tape ", &warnings).await, "tape");
        assert_eq!(enhancer.enhance("tape", &warnings).await, "tape");
        assert_eq!(warnings.snapshot(), vec![ENHANCE_UNAVAILABLE_WARNING]);
    }

    #[tokio::test]
    async fn broaden_parses_json_suggestion() {
        let llm = QueuedLlm::new(vec![Ok(
            "```json\n{\"query\": \"industrial widget\"}\n```".to_string()
        )]);
        let q = enhancer(llm).broaden("widget", "acme widget x100").await;
        assert_eq!(q.as_deref(), Some("industrial widget"));
    }

    #[tokio::test]
    async fn broaden_rejects_repeats_and_garbage() {
        let llm = QueuedLlm::new(vec![
            Ok(r#"{"query": "Widget"}"#.to_string()),
            Ok("industrial widget".to_string()),
            Err(LlmError::EmptyResponse),
        ]);
        let enhancer = enhancer(llm);
        assert_eq!(enhancer.broaden("widget", "acme widget").await, None);
        assert_eq!(enhancer.broaden("widget", "acme widget").await, None);
        assert_eq!(enhancer.broaden("widget", "acme widget").await, None);
    }

    #[test]
    fn clean_query_strips_labels_quotes_and_extra_lines() {
        assert_eq!(
            clean_query("Query: `usb c cable 2m`\nThis finds cables.").as_deref(),
            Some("usb c cable 2m")
        );
        assert_eq!(clean_query("\n\n  a   b  ").as_deref(), Some("a b"));
        assert_eq!(clean_query("\"\""), None);
        assert_eq!(clean_query(&"x".repeat(500)).map(|q| q.len()), Some(200));
    }
}
