//! Search-provider abstraction.

mod serpapi;

use async_trait::async_trait;
use shopbot_core::SearchMode;

use crate::error::SearchError;

pub use serpapi::{SerpApiClient, SerpApiConfig};

/// One raw hit as returned by a provider. `url` may be empty or relative;
/// the caller decides what is usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub url: String,
    pub title: String,
    pub snippet: String,
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Issue one search call. `page` is zero-based.
    async fn search(
        &self,
        query: &str,
        mode: SearchMode,
        page: u32,
    ) -> Result<Vec<SearchHit>, SearchError>;

    /// Build a query restricted to `domains`.
    ///
    /// The default uses the `(site:a OR site:b) query` operator syntax
    /// understood by the major web engines.
    fn scoped_query(&self, query: &str, domains: &[String]) -> String {
        let sites: Vec<String> = domains
            .iter()
            .map(|d| d.trim())
            .filter(|d| !d.is_empty())
            .map(|d| format!("site:{d}"))
            .collect();
        if sites.is_empty() {
            return query.to_string();
        }
        format!("({}) {query}", sites.join(" OR "))
    }
}
