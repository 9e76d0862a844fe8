//! Candidate page fetcher.
//!
//! [`PageFetcher::fetch`] never fails: every network, status, or content
//! problem is logged and turned into [`ScrapedPage::empty`]. Callers that
//! want the reason use [`PageFetcher::try_fetch`].

use std::sync::Arc;
use std::time::Duration;

use rand::seq::IndexedRandom;
use shopbot_core::ScrapedPage;

use crate::error::ScraperError;
use crate::extract::extract_page;
use crate::origin::is_absolute_http_url;
use crate::transport::FetchTransport;

/// Desktop browser identities rotated per request.
const BROWSER_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36 Edg/124.0.0.0",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetcherConfig {
    pub timeout_secs: u64,
    pub max_text_chars: usize,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 12,
            max_text_chars: 4000,
        }
    }
}

pub struct PageFetcher {
    transport: Arc<dyn FetchTransport>,
    config: FetcherConfig,
}

impl PageFetcher {
    #[must_use]
    pub fn new(transport: Arc<dyn FetchTransport>, config: FetcherConfig) -> Self {
        Self { transport, config }
    }

    /// Fetch `url` and extract its signal, degrading to an empty page on any
    /// failure.
    pub async fn fetch(&self, url: &str) -> ScrapedPage {
        match self.try_fetch(url).await {
            Ok(page) => {
                tracing::debug!(
                    url,
                    title = %page.title,
                    text_chars = page.text_content.len(),
                    "fetched candidate page"
                );
                page
            }
            Err(e) => {
                tracing::warn!(url, error = %e, "page fetch failed; treating as no signal");
                ScrapedPage::empty(url)
            }
        }
    }

    /// Fetch `url` and extract its signal.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::InvalidUrl`] if `url` is not an absolute http(s) URL.
    /// - [`ScraperError::Timeout`] if the transport exceeds the configured timeout.
    /// - [`ScraperError::UnexpectedStatus`] for any non-2xx response.
    /// - [`ScraperError::NotHtml`] when the response declares a non-HTML type.
    /// - [`ScraperError::Http`] on network failure.
    pub async fn try_fetch(&self, url: &str) -> Result<ScrapedPage, ScraperError> {
        if !is_absolute_http_url(url) {
            return Err(ScraperError::InvalidUrl {
                url: url.to_string(),
                reason: "not an absolute http(s) URL".to_string(),
            });
        }

        let timeout = Duration::from_secs(self.config.timeout_secs);
        let headers = browser_headers();
        let response = tokio::time::timeout(timeout, self.transport.get(url, &headers, timeout))
            .await
            .map_err(|_| ScraperError::Timeout {
                url: url.to_string(),
                timeout_secs: self.config.timeout_secs,
            })??;

        if !(200..300).contains(&response.status) {
            return Err(ScraperError::UnexpectedStatus {
                status: response.status,
                url: url.to_string(),
            });
        }

        if let Some(content_type) = response.content_type.as_deref() {
            if !is_html_content_type(content_type) {
                return Err(ScraperError::NotHtml {
                    url: url.to_string(),
                    content_type: content_type.to_string(),
                });
            }
        }

        Ok(extract_page(url, &response.body, self.config.max_text_chars))
    }
}

fn is_html_content_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence.is_empty()
        || essence == "text/html"
        || essence == "application/xhtml+xml"
        || essence == "text/plain"
}

/// Browser-like request identity with a randomly chosen User-Agent.
pub(crate) fn browser_headers() -> Vec<(String, String)> {
    let user_agent = BROWSER_USER_AGENTS
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or(BROWSER_USER_AGENTS[0]);
    vec![
        ("User-Agent".to_string(), user_agent.to_string()),
        (
            "Accept".to_string(),
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8".to_string(),
        ),
        ("Accept-Language".to_string(), "en-US,en;q=0.9".to_string()),
        ("Referer".to_string(), "https://www.google.com/".to_string()),
        ("Cache-Control".to_string(), "no-cache".to_string()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn browser_headers_carry_identity_and_language() {
        let headers = browser_headers();
        let ua = headers
            .iter()
            .find(|(k, _)| k == "User-Agent")
            .map(|(_, v)| v.as_str())
            .unwrap();
        assert!(BROWSER_USER_AGENTS.contains(&ua));
        assert!(headers.iter().any(|(k, _)| k == "Accept-Language"));
        assert!(headers.iter().any(|(k, _)| k == "Referer"));
    }

    #[test]
    fn html_content_types_are_recognized() {
        assert!(is_html_content_type("text/html; charset=utf-8"));
        assert!(is_html_content_type("application/xhtml+xml"));
        assert!(!is_html_content_type("application/pdf"));
        assert!(!is_html_content_type("image/jpeg"));
    }
}
