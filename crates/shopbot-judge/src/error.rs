use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// HTTP 429 or an `insufficient_quota` error body.
    #[error("LLM provider quota exhausted or rate limited")]
    QuotaExhausted,

    #[error("unexpected status {status} from LLM provider: {message}")]
    UnexpectedStatus { status: u16, message: String },

    #[error("LLM provider returned an empty completion")]
    EmptyResponse,

    #[error("failed to deserialize LLM provider response: {0}")]
    Deserialize(#[from] serde_json::Error),

    #[error("invalid LLM base URL {base_url}: {reason}")]
    InvalidBaseUrl { base_url: String, reason: String },

    #[error("LLM call timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },
}
