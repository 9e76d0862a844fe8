//! Shared domain types, configuration, and currency normalization for the
//! shopping assistant workspace.

pub mod app_config;
pub mod config;
pub mod currency;
pub mod types;
pub mod warnings;

use thiserror::Error;

pub use app_config::{AppConfig, PipelineConfig, RankingStrategy};
pub use config::{load_app_config, load_app_config_from_env};
pub use currency::{CurrencyError, CurrencyNormalizer};
pub use types::{
    ImageInput, Judgment, JudgmentVerdict, PriceHint, ProductOffer, RejectReason, ScrapedPage,
    SearchCandidate, SearchMode, SearchOutcome, SearchRequest, MIN_OFFER_PRICE,
};
pub use warnings::WarningLog;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
