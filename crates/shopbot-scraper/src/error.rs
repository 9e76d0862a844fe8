use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("non-HTML content ({content_type}) at {url}")]
    NotHtml { url: String, content_type: String },

    #[error("fetch of {url} timed out after {timeout_secs}s")]
    Timeout { url: String, timeout_secs: u64 },
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rate limited by search provider {provider}")]
    RateLimited { provider: String },

    #[error("unexpected HTTP status {status} from {provider}")]
    UnexpectedStatus { status: u16, provider: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("search provider error: {0}")]
    Api(String),

    #[error("search call to {provider} timed out after {timeout_secs}s")]
    Timeout { provider: String, timeout_secs: u64 },

    #[error("invalid search base URL \"{base_url}\": {reason}")]
    InvalidBaseUrl { base_url: String, reason: String },
}
