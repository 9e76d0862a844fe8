//! Page fetching, HTML signal extraction, and search-provider access.
//!
//! Everything here talks to the network through a trait seam
//! ([`FetchTransport`], [`SearchProvider`]) so the pipeline can be driven by
//! in-memory fakes in tests.

pub mod error;
pub mod extract;
pub mod fetcher;
pub mod origin;
pub mod search;
pub mod transport;

pub use error::{ScraperError, SearchError};
pub use fetcher::{FetcherConfig, PageFetcher};
pub use origin::{domain_matches, host_of, is_absolute_http_url, store_name};
pub use search::{SearchHit, SearchProvider, SerpApiClient, SerpApiConfig};
pub use transport::{FetchTransport, ReqwestTransport, TransportResponse};
