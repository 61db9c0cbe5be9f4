//! Frontier state for Pagewalk
//!
//! Tracks every known URL's status and the pending work queue.

mod frontier;
mod status;

pub use frontier::{CrawlSnapshot, Frontier};
pub use status::UrlStatus;
