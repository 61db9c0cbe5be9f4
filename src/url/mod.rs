//! URL handling module for Pagewalk
//!
//! This module provides URL normalization, internal/external classification,
//! and glob-style path pattern matching.

mod classify;
mod matcher;
mod normalize;

// Re-export main functions
pub use classify::is_external;
pub use matcher::matches_path_pattern;
pub use normalize::{normalize_external_url, normalize_url, CanonicalHost};
