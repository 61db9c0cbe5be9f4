use crate::config::Config;
use crate::url::matcher::matches_path_pattern;
use crate::UrlError;
use url::Url;

/// Classifies an anchor URL as internal or external
///
/// An anchor is **external** if any of the following hold:
///
/// 1. Its origin matches none of the configured domains (seed URL plus
///    alias URLs), where `http` and `https` count as the same scheme.
/// 2. Its path matches any exclude pattern.
/// 3. At least one include pattern is configured and the path matches none
///    of them.
///
/// A malformed anchor is never silently classified external; it is reported
/// as a `UrlError` and the caller skips it.
///
/// # Examples
///
/// ```no_run
/// use pagewalk::url::is_external;
/// # use pagewalk::config::Config;
/// # fn example(config: &Config) {
/// assert!(!is_external("https://example.com/about", config).unwrap());
/// assert!(is_external("https://other.com/x", config).unwrap());
/// # }
/// ```
pub fn is_external(raw_anchor: &str, config: &Config) -> Result<bool, UrlError> {
    let anchor = Url::parse(raw_anchor).map_err(|e| UrlError::Malformed(e.to_string()))?;

    if !origin_matches_any(&anchor, config)? {
        return Ok(true);
    }

    let path = anchor.path();

    // Exclude patterns push an internal-origin URL out of the crawl
    if config
        .site
        .exclude_paths
        .iter()
        .any(|p| matches_path_pattern(p, path))
    {
        return Ok(true);
    }

    // When include patterns exist, the path must match at least one
    if !config.site.include_paths.is_empty()
        && !config
            .site
            .include_paths
            .iter()
            .any(|p| matches_path_pattern(p, path))
    {
        return Ok(true);
    }

    Ok(false)
}

/// Checks the anchor's origin against the seed and alias origins
fn origin_matches_any(anchor: &Url, config: &Config) -> Result<bool, UrlError> {
    if anchor.scheme() != "http" && anchor.scheme() != "https" {
        // Non-web schemes can never match a configured web origin
        return Ok(false);
    }

    let seed = Url::parse(&config.site.seed_url)
        .map_err(|e| UrlError::Parse(format!("seed-url: {}", e)))?;

    if same_origin(anchor, &seed) {
        return Ok(true);
    }

    for alias in &config.site.alias_urls {
        let alias_url =
            Url::parse(alias).map_err(|e| UrlError::Parse(format!("alias-url: {}", e)))?;
        if same_origin(anchor, &alias_url) {
            return Ok(true);
        }
    }

    Ok(false)
}

/// Origin comparison with http/https treated as aliases of each other
///
/// Hosts compare case-insensitively; explicit ports must agree.
fn same_origin(a: &Url, b: &Url) -> bool {
    let host_a = a.host_str().map(|h| h.to_lowercase());
    let host_b = b.host_str().map(|h| h.to_lowercase());
    host_a.is_some() && host_a == host_b && a.port() == b.port()
}
