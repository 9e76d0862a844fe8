//! Strict parsing of judge output into a [`JudgmentVerdict`].
//!
//! A verdict is either fully typed and in range, or an error. Nothing is
//! defaulted or coerced: a string price, a fractional score, or a missing key
//! all reject the candidate.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use shopbot_core::JudgmentVerdict;
use thiserror::Error;

static CODE_FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```[A-Za-z]*\s*(.*?)```").expect("valid regex"));

const SCORE_RANGE: std::ops::RangeInclusive<i64> = 1..=10;
const MAX_REASONING_CHARS: usize = 500;

#[derive(Debug, Error, PartialEq)]
pub enum VerdictError {
    #[error("response contains no JSON object")]
    NoJsonObject,

    #[error("invalid verdict JSON: {0}")]
    InvalidJson(String),

    #[error("{field} out of range: {value}")]
    ScoreOutOfRange { field: &'static str, value: i64 },

    #[error("invalid price: {0}")]
    InvalidPrice(f64),

    #[error("invalid currency code: {0:?}")]
    InvalidCurrency(String),
}

#[derive(Debug, Deserialize)]
struct RawVerdict {
    price: f64,
    currency: String,
    relevance_score: i64,
    price_accuracy_score: i64,
    is_region_fit: bool,
    reasoning: String,
}

/// Extract the JSON object from a completion that may be wrapped in a
/// markdown code fence or surrounded by prose.
#[must_use]
pub fn strip_wrappers(raw: &str) -> Option<&str> {
    let inner = CODE_FENCE_RE
        .captures(raw)
        .and_then(|c| c.get(1))
        .map_or(raw, |m| m.as_str());
    let start = inner.find('{')?;
    let end = inner.rfind('}')?;
    (start < end).then(|| &inner[start..=end])
}

/// Parse and validate one judge completion.
///
/// # Errors
///
/// Returns a [`VerdictError`] describing the first problem found.
pub fn parse_verdict(raw: &str) -> Result<JudgmentVerdict, VerdictError> {
    let object = strip_wrappers(raw).ok_or(VerdictError::NoJsonObject)?;
    let parsed: RawVerdict =
        serde_json::from_str(object).map_err(|e| VerdictError::InvalidJson(e.to_string()))?;

    let relevance_score = score("relevance_score", parsed.relevance_score)?;
    let price_accuracy_score = score("price_accuracy_score", parsed.price_accuracy_score)?;

    if !parsed.price.is_finite() || parsed.price < 0.0 {
        return Err(VerdictError::InvalidPrice(parsed.price));
    }

    let currency = parsed.currency.trim().to_ascii_uppercase();
    if currency.len() != 3 || !currency.bytes().all(|b| b.is_ascii_alphabetic()) {
        return Err(VerdictError::InvalidCurrency(parsed.currency));
    }

    Ok(JudgmentVerdict {
        price: parsed.price,
        currency,
        relevance_score,
        price_accuracy_score,
        is_region_fit: parsed.is_region_fit,
        reasoning: parsed
            .reasoning
            .trim()
            .chars()
            .take(MAX_REASONING_CHARS)
            .collect(),
    })
}

fn score(field: &'static str, value: i64) -> Result<u8, VerdictError> {
    if !SCORE_RANGE.contains(&value) {
        return Err(VerdictError::ScoreOutOfRange { field, value });
    }
    u8::try_from(value).map_err(|_| VerdictError::ScoreOutOfRange { field, value })
}

#[cfg(test)]
#[path = "verdict_test.rs"]
mod tests;
