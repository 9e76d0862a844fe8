use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Offers priced below this many reference-currency units are treated as
/// garbage extractions and never returned.
pub const MIN_OFFER_PRICE: f64 = 0.50;

/// Which search index a query is issued against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// General web search.
    Organic,
    /// Product / shopping-specific index.
    Product,
}

impl std::fmt::Display for SearchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchMode::Organic => write!(f, "organic"),
            SearchMode::Product => write!(f, "product"),
        }
    }
}

/// A provisional reference to a possible product page, keyed by `url`
/// within one search run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCandidate {
    pub url: String,
    pub title: String,
    pub snippet: String,
}

/// Price found in a page's structured data (schema.org `Offer`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceHint {
    pub amount: f64,
    pub currency: Option<String>,
}

/// Result of fetching and lightly parsing a candidate URL.
///
/// A failed fetch still yields a page, with [`ScrapedPage::UNTITLED`] as the
/// title and every other field empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapedPage {
    pub url: String,
    pub title: String,
    /// Absolute preview image URL, or empty.
    pub image_url: String,
    /// Whitespace-collapsed visible text, capped in length.
    pub text_content: String,
    pub price_hint: Option<PriceHint>,
}

impl ScrapedPage {
    pub const UNTITLED: &'static str = "Untitled page";

    /// A page carrying no signal, used for every fetch failure.
    #[must_use]
    pub fn empty(url: &str) -> Self {
        Self {
            url: url.to_string(),
            title: Self::UNTITLED.to_string(),
            image_url: String::new(),
            text_content: String::new(),
            price_hint: None,
        }
    }

    /// Whether the page has enough text to be worth sending to the judge.
    #[must_use]
    pub fn has_signal(&self, min_text_chars: usize) -> bool {
        !self.text_content.is_empty() && self.text_content.chars().count() >= min_text_chars
    }
}

/// Fully-typed, validated judge output for one scraped page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudgmentVerdict {
    pub price: f64,
    /// Uppercase ISO-4217 style code.
    pub currency: String,
    /// 1–10.
    pub relevance_score: u8,
    /// 1–10.
    pub price_accuracy_score: u8,
    pub is_region_fit: bool,
    pub reasoning: String,
}

/// Why the judge produced no usable verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// Response was not valid JSON, missed a field, or failed validation.
    Malformed(String),
    /// Provider reported quota exhaustion or rate limiting.
    QuotaExhausted,
    /// Network failure, unexpected status, or empty response.
    Unavailable(String),
    TimedOut,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::Malformed(reason) => write!(f, "malformed verdict: {reason}"),
            RejectReason::QuotaExhausted => write!(f, "judge quota exhausted"),
            RejectReason::Unavailable(reason) => write!(f, "judge unavailable: {reason}"),
            RejectReason::TimedOut => write!(f, "judge timed out"),
        }
    }
}

/// Outcome of judging one page. `Rejected` is equivalent to a zero/zero verdict.
#[derive(Debug, Clone, PartialEq)]
pub enum Judgment {
    Verdict(JudgmentVerdict),
    Rejected(RejectReason),
}

/// A validated, priced candidate ready for ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductOffer {
    pub name: String,
    /// Derived from the candidate's domain.
    pub store: String,
    pub url: String,
    pub image_url: String,
    pub price_in_reference_currency: f64,
    pub original_price: f64,
    pub original_currency: String,
    pub relevance_score: u8,
    pub price_accuracy_score: u8,
    pub reasoning: String,
    pub is_fallback_suggestion: bool,
}

/// Image payload accepted as an alternative query channel.
#[derive(Debug, Clone)]
pub struct ImageInput {
    pub bytes: Vec<u8>,
    /// e.g. `image/jpeg`.
    pub mime_type: String,
}

/// Input to one search call. At least one of the fields should carry data.
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    pub text_query: Option<String>,
    pub image: Option<ImageInput>,
}

impl SearchRequest {
    #[must_use]
    pub fn text(query: impl Into<String>) -> Self {
        Self {
            text_query: Some(query.into()),
            image: None,
        }
    }
}

/// What the core hands back to the front-end layer. Always well-formed.
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub offers: Vec<ProductOffer>,
    pub warnings: Vec<String>,
    /// True when `offers` came from the broadened fallback pass.
    pub is_alternative: bool,
    pub searched_at: DateTime<Utc>,
}
