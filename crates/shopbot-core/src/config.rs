use crate::app_config::{AppConfig, PipelineConfig, RankingStrategy};
use crate::currency;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a pure
/// `HashMap` lookup.
#[allow(clippy::too_many_lines)]
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .trim()
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .trim()
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .trim()
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    // Worker pools must never be configured down to zero.
    let parse_pool_size = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let size = parse_usize(var, default)?;
        if size == 0 {
            return Err(invalid(var, "must be at least 1".to_string()));
        }
        Ok(size)
    };

    let parse_score = |var: &str, default: &str| -> Result<u8, ConfigError> {
        let raw = or_default(var, default);
        let score = raw
            .trim()
            .parse::<u8>()
            .map_err(|e| invalid(var, e.to_string()))?;
        if !(1..=10).contains(&score) {
            return Err(invalid(var, format!("{score} is outside 1..=10")));
        }
        Ok(score)
    };

    let parse_domains = |var: &str, defaults: &[String]| -> Vec<String> {
        match lookup(var) {
            Ok(raw) => parse_domain_list(&raw),
            Err(_) => defaults.to_vec(),
        }
    };

    let serpapi_api_key = require("SERPAPI_API_KEY")?;
    let openai_api_key = require("OPENAI_API_KEY")?;

    let log_level = or_default("SHOPBOT_LOG_LEVEL", "info");
    let openai_base_url = or_default("SHOPBOT_OPENAI_BASE_URL", "https://api.openai.com");
    let llm_model = or_default("SHOPBOT_LLM_MODEL", "gpt-4o-mini");
    let vision_model = or_default("SHOPBOT_VISION_MODEL", "gpt-4o-mini");
    let serpapi_base_url = or_default("SHOPBOT_SERPAPI_BASE_URL", "https://serpapi.com");
    let search_results_per_page = parse_u32("SHOPBOT_SEARCH_RESULTS_PER_PAGE", "10")?;
    let search_country = or_default("SHOPBOT_SEARCH_COUNTRY", "us");
    let search_language = or_default("SHOPBOT_SEARCH_LANGUAGE", "en");

    let defaults = PipelineConfig::default();

    let ranking_raw = or_default("SHOPBOT_RANKING", "price");
    let ranking = ranking_raw
        .parse::<RankingStrategy>()
        .map_err(|reason| invalid("SHOPBOT_RANKING", reason))?;

    let reference_currency = or_default("SHOPBOT_REFERENCE_CURRENCY", "USD")
        .trim()
        .to_ascii_uppercase();
    if !currency::is_supported(&reference_currency) {
        return Err(invalid(
            "SHOPBOT_REFERENCE_CURRENCY",
            format!("{reference_currency} is not in the currency table"),
        ));
    }

    let pipeline = PipelineConfig {
        relevance_threshold: parse_score("SHOPBOT_RELEVANCE_THRESHOLD", "7")?,
        price_accuracy_threshold: parse_score("SHOPBOT_PRICE_ACCURACY_THRESHOLD", "7")?,
        ranking,
        max_results: parse_usize("SHOPBOT_MAX_RESULTS", "30")?,
        min_candidates: parse_usize("SHOPBOT_MIN_CANDIDATES", "15")?,
        max_candidates: parse_usize("SHOPBOT_MAX_CANDIDATES", "40")?,
        search_concurrency: parse_pool_size("SHOPBOT_SEARCH_CONCURRENCY", "5")?,
        fetch_concurrency: parse_pool_size("SHOPBOT_FETCH_CONCURRENCY", "8")?,
        judge_concurrency: parse_pool_size("SHOPBOT_JUDGE_CONCURRENCY", "5")?,
        search_timeout_secs: parse_u64("SHOPBOT_SEARCH_TIMEOUT_SECS", "20")?,
        fetch_timeout_secs: parse_u64("SHOPBOT_FETCH_TIMEOUT_SECS", "12")?,
        judge_timeout_secs: parse_u64("SHOPBOT_JUDGE_TIMEOUT_SECS", "45")?,
        max_text_chars: parse_usize("SHOPBOT_MAX_TEXT_CHARS", "4000")?,
        min_text_chars: parse_usize("SHOPBOT_MIN_TEXT_CHARS", "200")?,
        reference_currency,
        target_market: or_default("SHOPBOT_TARGET_MARKET", "United States"),
        priority_domains: parse_domains("SHOPBOT_PRIORITY_DOMAINS", &defaults.priority_domains),
        excluded_domains: parse_domains("SHOPBOT_EXCLUDED_DOMAINS", &defaults.excluded_domains),
    };

    Ok(AppConfig {
        log_level,
        serpapi_api_key,
        serpapi_base_url,
        search_results_per_page,
        search_country,
        search_language,
        openai_api_key,
        openai_base_url,
        llm_model,
        vision_model,
        pipeline,
    })
}

/// Split a comma-separated domain list, lowercasing and dropping blanks and
/// any leading `www.`.
fn parse_domain_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|d| d.trim().to_ascii_lowercase())
        .map(|d| d.trim_start_matches("www.").to_string())
        .filter(|d| !d.is_empty())
        .collect()
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
