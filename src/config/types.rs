use serde::Deserialize;

/// Main configuration structure for Pagewalk
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub metadata: MetadataConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
}

/// Target site configuration: seed, aliases, and path filters
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// The seed URL the crawl starts from; its host becomes the canonical host
    #[serde(rename = "seed-url")]
    pub seed_url: String,

    /// Alias origins that count as the same site (e.g. the www. variant)
    #[serde(default, rename = "alias-urls")]
    pub alias_urls: Vec<String>,

    /// Glob-style path patterns; when non-empty, a path must match at least one
    #[serde(default, rename = "include-paths")]
    pub include_paths: Vec<String>,

    /// Glob-style path patterns; a matching path is treated as external
    #[serde(default, rename = "exclude-paths")]
    pub exclude_paths: Vec<String>,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Delay between the completion of one fetch and the start of the next (milliseconds)
    #[serde(default = "default_request_delay", rename = "request-delay-ms")]
    pub request_delay_ms: u64,

    /// Maximum redirect hops to follow before giving up
    #[serde(default = "default_max_redirects", rename = "max-redirects")]
    pub max_redirects: u32,

    /// Also fetch external URLs for reachability (never scraped for links)
    #[serde(default, rename = "check-externals")]
    pub check_externals: bool,

    /// What to do when a redirect chain leaves the configured origins
    #[serde(default, rename = "cross-origin-redirects")]
    pub cross_origin_redirects: CrossOriginRedirects,
}

/// Policy for redirect chains that cross from an internal to an external origin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum CrossOriginRedirects {
    /// Follow the chain and record the external destination as visited
    #[default]
    Follow,
    /// Record the external destination in the external set instead
    External,
}

/// Bounded-retry fetch configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per URL, including the first
    #[serde(default = "default_max_attempts", rename = "max-attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry (milliseconds)
    #[serde(default = "default_base_delay", rename = "base-delay-ms")]
    pub base_delay_ms: u64,

    /// Multiplier applied to the delay after each retry
    #[serde(default = "default_backoff_factor", rename = "backoff-factor")]
    pub backoff_factor: f64,
}

/// Metadata collection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MetadataConfig {
    /// Whether to extract and persist per-page metadata at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Which field groups to collect; empty means all known groups
    #[serde(default)]
    pub fields: Vec<String>,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the JSON crawl-state snapshot file
    #[serde(rename = "state-path")]
    pub state_path: String,

    /// Path to the JSON per-page metadata file
    #[serde(rename = "metadata-path")]
    pub metadata_path: String,
}

/// Metadata field groups accepted in `[metadata] fields`
pub const KNOWN_METADATA_FIELDS: &[&str] =
    &["title", "description", "social", "resources", "hash"];

impl MetadataConfig {
    /// Returns true if the given field group should be collected
    pub fn collects(&self, field: &str) -> bool {
        self.enabled && (self.fields.is_empty() || self.fields.iter().any(|f| f == field))
    }
}

fn default_request_delay() -> u64 {
    250
}

fn default_max_redirects() -> u32 {
    10
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay() -> u64 {
    1000
}

fn default_backoff_factor() -> f64 {
    1.5
}

fn default_true() -> bool {
    true
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            request_delay_ms: default_request_delay(),
            max_redirects: default_max_redirects(),
            check_externals: false,
            cross_origin_redirects: CrossOriginRedirects::default(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay(),
            backoff_factor: default_backoff_factor(),
        }
    }
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            fields: Vec::new(),
        }
    }
}
