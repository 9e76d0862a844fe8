//! Search-collect-validate-rank pipeline.
//!
//! [`ShoppingPipeline::search`] is the only entry point front-ends need: it
//! always returns a well-formed [`shopbot_core::SearchOutcome`].

pub mod pipeline;
pub mod pool;
pub mod rank;
pub mod searcher;

pub use pipeline::{
    PipelineDeps, ShoppingPipeline, FALLBACK_NOTICE_PREFIX, IMAGE_UNREADABLE_WARNING,
    NO_MATCHES_WARNING, NO_QUERY_WARNING, QUOTA_WARNING, UNEXPECTED_ERROR_WARNING,
};
pub use pool::run_bounded;
pub use rank::{accept, rank, Rejection};
pub use searcher::{CandidateSearcher, CollectionScope, SearcherSettings, SEARCH_DEGRADED_WARNING};
