//! Image-to-query adapter: a vision completion distilled into a short
//! keyword query for the text pipeline.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use shopbot_core::ImageInput;

use crate::client::{complete_within, LlmClient};
use crate::error::LlmError;
use crate::prompts;
use crate::verdict::strip_wrappers;

const MAX_KEYWORDS: usize = 6;

/// Words that carry no product identity in a search query.
const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "in", "on", "for", "with", "by", "of", "to", "new", "sale",
    "buy", "com", "www", "https", "http", "price", "free", "shipping", "review", "image",
    "stock", "photo", "picture",
];

#[derive(Debug, Deserialize)]
struct VisionReply {
    #[serde(default)]
    product: String,
    #[serde(default)]
    keywords: Vec<String>,
}

pub struct ImageQueryAdapter {
    llm: Arc<dyn LlmClient>,
    timeout: Duration,
}

impl ImageQueryAdapter {
    #[must_use]
    pub fn new(llm: Arc<dyn LlmClient>, timeout: Duration) -> Self {
        Self { llm, timeout }
    }

    /// Describe `image` and return a compact search query for it.
    ///
    /// # Errors
    ///
    /// Propagates the provider's [`LlmError`]; returns
    /// [`LlmError::EmptyResponse`] when nothing usable survives distillation.
    pub async fn describe(&self, image: &ImageInput) -> Result<String, LlmError> {
        let prompt = prompts::vision(image);
        let raw = complete_within(self.llm.as_ref(), &prompt, self.timeout).await?;

        // A reply that ignored the JSON instruction is treated as a bare label.
        let reply = strip_wrappers(&raw)
            .and_then(|object| serde_json::from_str::<VisionReply>(object).ok())
            .unwrap_or_else(|| VisionReply {
                product: raw.clone(),
                keywords: Vec::new(),
            });

        let query = distill_query(&reply.product, &reply.keywords).ok_or(LlmError::EmptyResponse)?;
        tracing::info!(
            product = %reply.product,
            query = %query,
            "derived query from image"
        );
        Ok(query)
    }
}

/// Keep the most frequent meaningful words of a product label and keyword
/// list, in order of frequency then first appearance.
#[must_use]
pub fn distill_query(product: &str, keywords: &[String]) -> Option<String> {
    let text = std::iter::once(product)
        .chain(keywords.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    let words = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() > 2)
        .filter(|w| !w.chars().all(|c| c.is_ascii_digit()))
        .filter(|w| !STOP_WORDS.contains(w));
    for (position, word) in words.enumerate() {
        counts.entry(word).or_insert((0, position)).0 += 1;
    }

    let mut ranked: Vec<(&str, usize, usize)> = counts
        .into_iter()
        .map(|(word, (count, first))| (word, count, first))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

    let query = ranked
        .into_iter()
        .take(MAX_KEYWORDS)
        .map(|(word, _, _)| word)
        .collect::<Vec<_>>()
        .join(" ");
    (!query.is_empty()).then_some(query)
}
