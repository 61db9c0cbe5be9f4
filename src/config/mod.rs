//! Configuration module for Pagewalk
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use pagewalk::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Seed URL: {}", config.site.seed_url);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, CrossOriginRedirects, MetadataConfig, OutputConfig, RetryConfig,
    SiteConfig, UserAgentConfig, KNOWN_METADATA_FIELDS,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
