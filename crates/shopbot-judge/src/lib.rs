//! LLM-backed judgment: the chat-completion client seam, versioned prompt
//! templates, strict verdict parsing, and the three call sites built on them
//! (candidate judging, query enhancement/broadening, image-to-query).

pub mod client;
pub mod enhance;
pub mod error;
pub mod judge;
pub mod prompts;
pub mod verdict;
pub mod vision;

pub use client::{LlmClient, OpenAiClient, OpenAiConfig, Prompt};
pub use enhance::{QueryEnhancer, ENHANCE_UNAVAILABLE_WARNING};
pub use error::LlmError;
pub use judge::{CandidateJudge, JudgeSettings};
pub use verdict::{parse_verdict, VerdictError};
pub use vision::{distill_query, ImageQueryAdapter};
