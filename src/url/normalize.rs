use crate::UrlError;
use url::Url;

/// Loopback hosts that keep plain http during development crawls
const LOOPBACK_HOSTS: &[&str] = &["localhost", "127.0.0.1", "::1", "[::1]"];

/// The canonical origin every internal URL is rewritten to
///
/// Derived from the seed URL once at startup. Internal URLs are assumed to
/// belong to one canonical origin regardless of which alias reached them, so
/// the host (and port) component is rewritten before any set-membership check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalHost {
    host: String,
    port: Option<u16>,
}

impl CanonicalHost {
    /// Builds the canonical host from a parsed seed URL
    pub fn from_seed(seed: &Url) -> Result<Self, UrlError> {
        let host = seed
            .host_str()
            .ok_or(UrlError::MissingHost)?
            .to_lowercase();
        Ok(Self {
            host,
            port: seed.port(),
        })
    }

    /// The canonical host string (lowercase)
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The explicit port, if the seed carried one
    pub fn port(&self) -> Option<u16> {
        self.port
    }
}

/// Returns true for hosts that should not be upgraded to https
fn is_loopback(host: &str) -> bool {
    LOOPBACK_HOSTS.contains(&host)
}

/// Normalizes an internal URL to its canonical identity
///
/// Rules, applied in order:
///
/// 1. Rewrite scheme `http` to `https`, unless the host is a loopback
///    development host.
/// 2. Rewrite the host (and port) to the canonical host.
/// 3. Clear the fragment.
///
/// Normalization is idempotent: normalizing an already-normalized URL
/// returns the same string.
///
/// # Examples
///
/// ```
/// use pagewalk::url::{normalize_url, CanonicalHost};
/// use url::Url;
///
/// let seed = Url::parse("https://example.com/").unwrap();
/// let canonical = CanonicalHost::from_seed(&seed).unwrap();
///
/// let url = normalize_url("http://www.example.com/page#frag", &canonical).unwrap();
/// assert_eq!(url.as_str(), "https://example.com/page");
/// ```
pub fn normalize_url(url_str: &str, canonical: &CanonicalHost) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str).map_err(|e| UrlError::Malformed(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    let host = url.host_str().ok_or(UrlError::MissingHost)?.to_lowercase();

    // Step 1: enforce https, except for loopback development hosts
    if url.scheme() == "http" && !is_loopback(&host) {
        url.set_scheme("https")
            .map_err(|_| UrlError::Malformed(format!("Failed to set scheme on {}", url_str)))?;
    }

    // Step 2: rewrite host and port to the canonical origin
    url.set_host(Some(canonical.host()))
        .map_err(|e| UrlError::Malformed(format!("Failed to set host: {}", e)))?;
    url.set_port(canonical.port())
        .map_err(|_| UrlError::Malformed(format!("Failed to set port on {}", url_str)))?;

    // Step 3: clear the fragment
    url.set_fragment(None);

    Ok(url)
}

/// Normalizes an external URL
///
/// Only the fragment is cleared. External origins must not be rewritten:
/// nothing is known about a third-party site's canonicalization, so the raw
/// scheme and host are preserved.
pub fn normalize_external_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str).map_err(|e| UrlError::Malformed(e.to_string()))?;
    url.set_fragment(None);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canonical(seed: &str) -> CanonicalHost {
        CanonicalHost::from_seed(&Url::parse(seed).unwrap()).unwrap()
    }

    #[test]
    fn test_http_to_https() {
        let result = normalize_url("http://example.com/page", &canonical("https://example.com/"));
        assert_eq!(result.unwrap().as_str(), "https://example.com/page");
    }

    #[test]
    fn test_loopback_keeps_http() {
        let result = normalize_url(
            "http://127.0.0.1:8080/page",
            &canonical("http://127.0.0.1:8080/"),
        );
        assert_eq!(result.unwrap().as_str(), "http://127.0.0.1:8080/page");
    }

    #[test]
    fn test_localhost_keeps_http() {
        let result = normalize_url("http://localhost/page", &canonical("http://localhost/"));
        assert_eq!(result.unwrap().as_str(), "http://localhost/page");
    }

    #[test]
    fn test_alias_host_rewritten() {
        let result = normalize_url(
            "https://www.example.com/about",
            &canonical("https://example.com/"),
        );
        assert_eq!(result.unwrap().as_str(), "https://example.com/about");
    }

    #[test]
    fn test_fragment_cleared() {
        let result = normalize_url(
            "https://example.com/page#section",
            &canonical("https://example.com/"),
        );
        assert_eq!(result.unwrap().as_str(), "https://example.com/page");
    }

    #[test]
    fn test_port_rewritten_to_canonical() {
        let result = normalize_url(
            "http://127.0.0.1:9999/page",
            &canonical("http://127.0.0.1:8080/"),
        );
        assert_eq!(result.unwrap().as_str(), "http://127.0.0.1:8080/page");
    }

    #[test]
    fn test_idempotent() {
        let canonical = canonical("https://example.com/");
        let urls = [
            "http://www.example.com/a/b?q=1#frag",
            "https://example.com/",
            "http://example.com/x",
        ];
        for raw in urls {
            let once = normalize_url(raw, &canonical).unwrap();
            let twice = normalize_url(once.as_str(), &canonical).unwrap();
            assert_eq!(once.as_str(), twice.as_str(), "not idempotent for {}", raw);
        }
    }

    #[test]
    fn test_query_preserved() {
        let result = normalize_url(
            "https://example.com/search?q=rust&page=2",
            &canonical("https://example.com/"),
        );
        assert_eq!(
            result.unwrap().as_str(),
            "https://example.com/search?q=rust&page=2"
        );
    }

    #[test]
    fn test_malformed_url() {
        let result = normalize_url("not a url", &canonical("https://example.com/"));
        assert!(matches!(result.unwrap_err(), UrlError::Malformed(_)));
    }

    #[test]
    fn test_invalid_scheme() {
        let result = normalize_url("ftp://example.com/file", &canonical("https://example.com/"));
        assert!(matches!(result.unwrap_err(), UrlError::InvalidScheme(_)));
    }

    #[test]
    fn test_external_clears_fragment_only() {
        let result = normalize_external_url("http://other.com/x#frag").unwrap();
        assert_eq!(result.as_str(), "http://other.com/x");
    }

    #[test]
    fn test_external_never_rewrites_host_or_scheme() {
        let result = normalize_external_url("http://Other.com/x").unwrap();
        assert_eq!(result.scheme(), "http");
        assert_eq!(result.host_str(), Some("other.com"));
    }

    #[test]
    fn test_external_malformed() {
        assert!(normalize_external_url("::::").is_err());
    }
}
