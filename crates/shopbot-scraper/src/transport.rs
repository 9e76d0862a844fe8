//! HTTP GET seam used by the page fetcher.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::ScraperError;

/// Bodies larger than this are truncated before parsing.
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Raw response handed back by a [`FetchTransport`].
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

/// `GET(url, headers, timeout) -> (status, body)`.
///
/// Implementations keep no cookies or session state between calls.
#[async_trait]
pub trait FetchTransport: Send + Sync {
    async fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
        timeout: Duration,
    ) -> Result<TransportResponse, ScraperError>;
}

/// `reqwest`-backed transport.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(connect_timeout_secs: u64) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(8))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl FetchTransport for ReqwestTransport {
    async fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
        timeout: Duration,
    ) -> Result<TransportResponse, ScraperError> {
        let mut request = self.client.get(url).timeout(timeout);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        let bytes = response.bytes().await?;
        let capped = &bytes[..bytes.len().min(MAX_BODY_BYTES)];
        let body = String::from_utf8_lossy(capped).into_owned();

        Ok(TransportResponse {
            status,
            content_type,
            body,
        })
    }
}
