//! Core crawler functionality
//!
//! Fetching (with manual redirect resolution), the bounded-retry policy,
//! HTML extraction, and the coordinator that drives the crawl loop.

mod coordinator;
mod fetcher;
mod parser;
mod retry;

pub use coordinator::{run_crawl, Coordinator};
pub use fetcher::{build_http_client, navigate_once, FetchError, NavigationOutcome};
pub use parser::{extract_page, ExtractedPage};
pub use retry::{navigate_with_retry, RetryPolicy};
