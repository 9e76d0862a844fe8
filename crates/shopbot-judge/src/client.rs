//! Chat-completion client seam and the OpenAI-compatible implementation.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use reqwest::{Client, StatusCode, Url};
use serde_json::{json, Value};
use shopbot_core::ImageInput;

use crate::error::LlmError;

/// One rendered prompt for a single completion call.
#[derive(Debug, Clone)]
pub struct Prompt {
    /// Template identifier, logged with every call.
    pub version: &'static str,
    pub system: String,
    pub user: String,
    /// Ask the provider for its structured JSON output mode.
    pub json_output: bool,
    pub image: Option<ImageInput>,
    pub temperature: f32,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Run one completion and return the raw assistant text.
    async fn complete(&self, prompt: &Prompt) -> Result<String, LlmError>;
}

/// Run `llm.complete` under `timeout`, mapping expiry to [`LlmError::Timeout`].
pub(crate) async fn complete_within(
    llm: &dyn LlmClient,
    prompt: &Prompt,
    timeout: Duration,
) -> Result<String, LlmError> {
    tokio::time::timeout(timeout, llm.complete(prompt))
        .await
        .map_err(|_| LlmError::Timeout {
            timeout_secs: timeout.as_secs(),
        })?
}

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    /// Provider root without the `/v1` suffix, e.g. `https://api.openai.com`.
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

pub struct OpenAiClient {
    client: Client,
    api_key: String,
    endpoint: Url,
    model: String,
}

impl OpenAiClient {
    /// # Errors
    ///
    /// Returns [`LlmError::Http`] if the `reqwest::Client` cannot be built, or
    /// [`LlmError::InvalidBaseUrl`] if `config.base_url` does not parse.
    pub fn new(config: OpenAiConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        let normalised = format!("{}/", config.base_url.trim_end_matches('/'));
        let endpoint = Url::parse(&normalised)
            .and_then(|base| base.join("v1/chat/completions"))
            .map_err(|e| LlmError::InvalidBaseUrl {
                base_url: config.base_url.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            api_key: config.api_key,
            endpoint,
            model: config.model,
        })
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    fn request_body(&self, prompt: &Prompt) -> Value {
        let user_content = match &prompt.image {
            Some(image) => json!([
                { "type": "text", "text": prompt.user },
                { "type": "image_url", "image_url": { "url": image_data_url(image) } }
            ]),
            None => json!(prompt.user),
        };

        let mut body = json!({
            "model": self.model,
            "temperature": prompt.temperature,
            "messages": [
                { "role": "system", "content": prompt.system },
                { "role": "user", "content": user_content }
            ]
        });
        if prompt.json_output {
            body["response_format"] = json!({ "type": "json_object" });
        }
        body
    }
}

fn image_data_url(image: &ImageInput) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(&image.bytes);
    format!("data:{};base64,{encoded}", image.mime_type)
}

/// Pull `error.message` out of an OpenAI-style error body, falling back to a
/// short excerpt of the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(Value::as_str)
                .map(str::to_owned)
        })
        .unwrap_or_else(|| body.chars().take(200).collect())
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, prompt: &Prompt) -> Result<String, LlmError> {
        tracing::debug!(
            model = %self.model,
            prompt_version = prompt.version,
            with_image = prompt.image.is_some(),
            "sending chat completion"
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&self.request_body(prompt))
            .send()
            .await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(LlmError::QuotaExhausted);
        }

        let body = response.text().await?;

        if !status.is_success() {
            if body.contains("insufficient_quota") {
                return Err(LlmError::QuotaExhausted);
            }
            return Err(LlmError::UnexpectedStatus {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let parsed: Value = serde_json::from_str(&body)?;
        let content = parsed
            .get("choices")
            .and_then(Value::as_array)
            .and_then(|choices| choices.first())
            .and_then(|choice| choice.get("message"))
            .and_then(|msg| msg.get("content"))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or(LlmError::EmptyResponse)?;

        Ok(content.to_string())
    }
}
