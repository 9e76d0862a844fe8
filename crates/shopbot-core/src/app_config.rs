use serde::{Deserialize, Serialize};

/// Final ordering applied to accepted offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingStrategy {
    /// Cheapest first; ties broken by higher relevance.
    PriceAscending,
    /// Highest `relevance² / price` first.
    RelevanceWeighted,
}

impl std::str::FromStr for RankingStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "price" | "price_ascending" => Ok(Self::PriceAscending),
            "relevance_weighted" | "weighted" => Ok(Self::RelevanceWeighted),
            other => Err(format!(
                "expected one of price, relevance_weighted; got \"{other}\""
            )),
        }
    }
}

impl std::fmt::Display for RankingStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RankingStrategy::PriceAscending => write!(f, "price"),
            RankingStrategy::RelevanceWeighted => write!(f, "relevance_weighted"),
        }
    }
}

pub const DEFAULT_PRIORITY_DOMAINS: &[&str] = &[
    "amazon.com",
    "walmart.com",
    "target.com",
    "bestbuy.com",
    "homedepot.com",
    "lowes.com",
    "ebay.com",
    "costco.com",
];

pub const DEFAULT_EXCLUDED_DOMAINS: &[&str] = &[
    "youtube.com",
    "wikipedia.org",
    "reddit.com",
    "pinterest.com",
    "facebook.com",
    "instagram.com",
    "tiktok.com",
    "quora.com",
];

/// Tunables for one search run. Handed to the pipeline by value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub relevance_threshold: u8,
    pub price_accuracy_threshold: u8,
    pub ranking: RankingStrategy,
    pub max_results: usize,
    /// Below this many unique candidates after the first wave, a second,
    /// wider wave is issued.
    pub min_candidates: usize,
    /// Upper bound on candidates fetched per pass.
    pub max_candidates: usize,
    pub search_concurrency: usize,
    pub fetch_concurrency: usize,
    pub judge_concurrency: usize,
    pub search_timeout_secs: u64,
    pub fetch_timeout_secs: u64,
    pub judge_timeout_secs: u64,
    pub max_text_chars: usize,
    pub min_text_chars: usize,
    pub reference_currency: String,
    pub target_market: String,
    pub priority_domains: Vec<String>,
    pub excluded_domains: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            relevance_threshold: 7,
            price_accuracy_threshold: 7,
            ranking: RankingStrategy::PriceAscending,
            max_results: 30,
            min_candidates: 15,
            max_candidates: 40,
            search_concurrency: 5,
            fetch_concurrency: 8,
            judge_concurrency: 5,
            search_timeout_secs: 20,
            fetch_timeout_secs: 12,
            judge_timeout_secs: 45,
            max_text_chars: 4000,
            min_text_chars: 200,
            reference_currency: "USD".to_string(),
            target_market: "United States".to_string(),
            priority_domains: DEFAULT_PRIORITY_DOMAINS
                .iter()
                .map(|d| (*d).to_string())
                .collect(),
            excluded_domains: DEFAULT_EXCLUDED_DOMAINS
                .iter()
                .map(|d| (*d).to_string())
                .collect(),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub serpapi_api_key: String,
    pub serpapi_base_url: String,
    pub search_results_per_page: u32,
    pub search_country: String,
    pub search_language: String,
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub llm_model: String,
    pub vision_model: String,
    pub pipeline: PipelineConfig,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("log_level", &self.log_level)
            .field("serpapi_api_key", &"[redacted]")
            .field("serpapi_base_url", &self.serpapi_base_url)
            .field("search_results_per_page", &self.search_results_per_page)
            .field("search_country", &self.search_country)
            .field("search_language", &self.search_language)
            .field("openai_api_key", &"[redacted]")
            .field("openai_base_url", &self.openai_base_url)
            .field("llm_model", &self.llm_model)
            .field("vision_model", &self.vision_model)
            .field("pipeline", &self.pipeline)
            .finish()
    }
}
