//! `SerpApi` search provider (Google organic + Google Shopping engines).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use shopbot_core::SearchMode;

use super::{SearchHit, SearchProvider};
use crate::error::SearchError;

const PROVIDER: &str = "serpapi";

/// `SerpApi` returns this as an `error` when a query simply has no hits.
const NO_RESULTS_MARKER: &str = "hasn't returned any results";

#[derive(Debug, Clone)]
pub struct SerpApiConfig {
    pub api_key: String,
    pub base_url: String,
    pub results_per_page: u32,
    /// Two-letter market code passed as `gl`.
    pub country: String,
    /// Interface language passed as `hl`.
    pub language: String,
    pub timeout_secs: u64,
}

pub struct SerpApiClient {
    client: Client,
    api_key: String,
    base_url: Url,
    results_per_page: u32,
    country: String,
    language: String,
}

#[derive(Debug, Deserialize)]
struct SerpApiResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    organic_results: Vec<OrganicResult>,
    #[serde(default)]
    shopping_results: Vec<ShoppingResult>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    snippet: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ShoppingResult {
    #[serde(default)]
    product_link: Option<String>,
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    price: Option<String>,
}

impl SerpApiClient {
    /// # Errors
    ///
    /// Returns [`SearchError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`SearchError::InvalidBaseUrl`] if
    /// `config.base_url` is not a valid URL.
    pub fn new(config: SerpApiConfig) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        // Normalise to exactly one trailing slash so `join` appends rather
        // than replacing the last path segment.
        let normalised = format!("{}/", config.base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| SearchError::InvalidBaseUrl {
            base_url: config.base_url.clone(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            api_key: config.api_key,
            base_url,
            results_per_page: config.results_per_page.max(1),
            country: config.country,
            language: config.language,
        })
    }

    fn engine(mode: SearchMode) -> &'static str {
        match mode {
            SearchMode::Organic => "google",
            SearchMode::Product => "google_shopping",
        }
    }

    fn build_url(&self, query: &str, mode: SearchMode, page: u32) -> Result<Url, SearchError> {
        let mut url =
            self.base_url
                .join("search.json")
                .map_err(|e| SearchError::InvalidBaseUrl {
                    base_url: self.base_url.to_string(),
                    reason: e.to_string(),
                })?;

        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("engine", Self::engine(mode))
                .append_pair("q", query)
                .append_pair("num", &self.results_per_page.to_string())
                .append_pair("gl", &self.country)
                .append_pair("hl", &self.language);
            if page > 0 {
                let start = page.saturating_mul(self.results_per_page);
                pairs.append_pair("start", &start.to_string());
            }
            pairs.append_pair("api_key", &self.api_key);
        }

        Ok(url)
    }

    fn hits_from_response(response: SerpApiResponse, mode: SearchMode) -> Vec<SearchHit> {
        match mode {
            SearchMode::Organic => response
                .organic_results
                .into_iter()
                .map(|r| SearchHit {
                    url: r.link.unwrap_or_default(),
                    title: r.title.unwrap_or_default(),
                    snippet: r.snippet.unwrap_or_default(),
                })
                .collect(),
            SearchMode::Product => response
                .shopping_results
                .into_iter()
                .map(|r| {
                    let snippet = [r.source, r.price]
                        .into_iter()
                        .flatten()
                        .collect::<Vec<_>>()
                        .join(" ");
                    // `link` is the merchant offer; `product_link` is Google's own page.
                    SearchHit {
                        url: r.link.or(r.product_link).unwrap_or_default(),
                        title: r.title.unwrap_or_default(),
                        snippet,
                    }
                })
                .collect(),
        }
    }
}

#[async_trait]
impl SearchProvider for SerpApiClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn search(
        &self,
        query: &str,
        mode: SearchMode,
        page: u32,
    ) -> Result<Vec<SearchHit>, SearchError> {
        let url = self.build_url(query, mode, page)?;
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(SearchError::RateLimited {
                provider: PROVIDER.to_string(),
            });
        }

        let body = response.text().await?;

        if !status.is_success() {
            // SerpApi reports some failures (bad key, exhausted plan) as a
            // JSON `error` with a 4xx status.
            if let Ok(parsed) = serde_json::from_str::<SerpApiResponse>(&body) {
                if let Some(message) = parsed.error {
                    return Err(SearchError::Api(message));
                }
            }
            return Err(SearchError::UnexpectedStatus {
                status: status.as_u16(),
                provider: PROVIDER.to_string(),
            });
        }

        let parsed: SerpApiResponse =
            serde_json::from_str(&body).map_err(|e| SearchError::Deserialize {
                context: format!("{PROVIDER} {mode} results for \"{query}\""),
                source: e,
            })?;

        if let Some(message) = parsed.error.as_deref() {
            if message.contains(NO_RESULTS_MARKER) {
                return Ok(Vec::new());
            }
            return Err(SearchError::Api(message.to_string()));
        }

        Ok(Self::hits_from_response(parsed, mode))
    }
}
