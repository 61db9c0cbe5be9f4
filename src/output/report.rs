//! Offline link-audit report
//!
//! Derives a per-page audit from the persisted state: every anchor a page
//! was seen to carry is classified against the frontier snapshot, so broken
//! and still-pending links can be read off without re-crawling anything.

use crate::config::Config;
use crate::metadata::PageRecord;
use crate::state::{CrawlSnapshot, UrlStatus};
use crate::url::{is_external, normalize_external_url, normalize_url, CanonicalHost};
use serde::Serialize;
use std::collections::HashMap;
use url::Url;

/// Audit result for one recorded page
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkAudit {
    /// The page whose anchors were audited
    pub url: String,

    /// Anchors whose target is unreachable
    pub broken: Vec<String>,

    /// Anchors whose target has not been fetched yet
    pub pending: Vec<String>,

    /// Anchors the frontier has no record of
    pub unclassified: Vec<String>,

    /// Anchors that failed to parse. Parsing problems are filtered out
    /// during extraction, so this stays empty; the field is kept so the
    /// report schema has a place for them.
    pub malformed: Vec<String>,
}

impl LinkAudit {
    pub fn is_clean(&self) -> bool {
        self.broken.is_empty() && self.pending.is_empty() && self.unclassified.is_empty()
    }
}

/// Aggregate counts across the whole crawl
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub visited: usize,
    pub pending: usize,
    pub external: usize,
    pub unreachable: usize,
    pub pages_with_metadata: usize,
    pub pages_with_broken_links: usize,
    pub broken_links: usize,
}

/// Classifies every recorded page's anchors against the frontier snapshot
///
/// Anchors are stored raw in the metadata records while the snapshot keys
/// internal URLs by canonical form, so each anchor is mapped to its frontier
/// identity before lookup. Pages are returned in sorted order.
pub fn audit_links(
    snapshot: &CrawlSnapshot,
    records: &HashMap<String, PageRecord>,
    config: &Config,
) -> Result<Vec<LinkAudit>, crate::PagewalkError> {
    let seed = Url::parse(&config.site.seed_url)?;
    let canonical = CanonicalHost::from_seed(&seed)?;

    let mut pages: Vec<&String> = records.keys().collect();
    pages.sort();

    let mut audits = Vec::new();
    for page in pages {
        let record = &records[page];
        let mut audit = LinkAudit {
            url: page.clone(),
            ..Default::default()
        };

        for anchor in &record.anchors {
            let key = frontier_key(anchor, config, &canonical);
            match snapshot.status_of(&key) {
                Some(UrlStatus::Unreachable) => audit.broken.push(anchor.clone()),
                Some(UrlStatus::Pending) => audit.pending.push(anchor.clone()),
                Some(UrlStatus::Visited) | Some(UrlStatus::External) => {}
                None => audit.unclassified.push(anchor.clone()),
            }
        }

        audits.push(audit);
    }

    Ok(audits)
}

/// Aggregates snapshot counts and audit findings
pub fn summarize(snapshot: &CrawlSnapshot, audits: &[LinkAudit]) -> ReportSummary {
    ReportSummary {
        visited: snapshot.visited_urls.len(),
        pending: snapshot.pending_urls.len(),
        external: snapshot.external_urls.len(),
        unreachable: snapshot.unreachable_urls.len(),
        pages_with_metadata: audits.len(),
        pages_with_broken_links: audits.iter().filter(|a| !a.broken.is_empty()).count(),
        broken_links: audits.iter().map(|a| a.broken.len()).sum(),
    }
}

/// Prints the audit to stdout
///
/// Clean pages are skipped; the summary always prints.
pub fn print_report(snapshot: &CrawlSnapshot, audits: &[LinkAudit]) {
    let summary = summarize(snapshot, audits);

    println!("Link audit");
    println!("==========");
    println!();

    for audit in audits {
        if audit.is_clean() {
            continue;
        }

        println!("{}", audit.url);
        for link in &audit.broken {
            println!("  broken       {}", link);
        }
        for link in &audit.pending {
            println!("  pending      {}", link);
        }
        for link in &audit.unclassified {
            println!("  unclassified {}", link);
        }
        println!();
    }

    println!("Summary");
    println!("-------");
    println!("  visited:     {}", summary.visited);
    println!("  pending:     {}", summary.pending);
    println!("  external:    {}", summary.external);
    println!("  unreachable: {}", summary.unreachable);
    println!(
        "  pages with metadata: {} ({} with broken links, {} broken links total)",
        summary.pages_with_metadata, summary.pages_with_broken_links, summary.broken_links
    );
}

/// Maps a raw anchor to the identity the snapshot keys it by
fn frontier_key(anchor: &str, config: &Config, canonical: &CanonicalHost) -> String {
    match is_external(anchor, config) {
        Ok(false) => normalize_url(anchor, canonical)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| anchor.to_string()),
        Ok(true) => anchor.to_string(),
        Err(_) => {
            // Malformed anchors never reach the records; keep the raw form
            // if one somehow does
            normalize_external_url(anchor)
                .map(|u| u.to_string())
                .unwrap_or_else(|_| anchor.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        CrawlerConfig, MetadataConfig, OutputConfig, RetryConfig, SiteConfig, UserAgentConfig,
    };

    fn test_config() -> Config {
        Config {
            site: SiteConfig {
                seed_url: "https://example.com/".to_string(),
                alias_urls: vec![],
                include_paths: vec![],
                exclude_paths: vec![],
            },
            crawler: CrawlerConfig::default(),
            retry: RetryConfig::default(),
            metadata: MetadataConfig::default(),
            user_agent: UserAgentConfig {
                crawler_name: "TestWalker".to_string(),
                crawler_version: "1.0".to_string(),
                contact_url: "https://example.com/about".to_string(),
                contact_email: "admin@example.com".to_string(),
            },
            output: OutputConfig {
                state_path: "state.json".to_string(),
                metadata_path: "meta.json".to_string(),
            },
        }
    }

    fn record_with_anchors(anchors: &[&str]) -> PageRecord {
        PageRecord {
            anchors: anchors.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_audit_classifies_anchors() {
        let snapshot = CrawlSnapshot {
            visited_urls: vec![
                "https://example.com/".to_string(),
                "https://example.com/ok".to_string(),
            ],
            pending_urls: vec!["https://example.com/later".to_string()],
            external_urls: vec!["https://other.com/x".to_string()],
            unreachable_urls: vec!["https://example.com/gone".to_string()],
        };

        let mut records = HashMap::new();
        records.insert(
            "https://example.com/".to_string(),
            record_with_anchors(&[
                "https://example.com/ok",
                "https://example.com/gone",
                "https://example.com/later",
                "https://other.com/x",
                "https://example.com/never-seen",
            ]),
        );

        let audits = audit_links(&snapshot, &records, &test_config()).unwrap();
        assert_eq!(audits.len(), 1);
        let audit = &audits[0];
        assert_eq!(audit.broken, vec!["https://example.com/gone"]);
        assert_eq!(audit.pending, vec!["https://example.com/later"]);
        assert_eq!(audit.unclassified, vec!["https://example.com/never-seen"]);
        assert!(audit.malformed.is_empty());
    }

    #[test]
    fn test_audit_normalizes_internal_anchors() {
        // Snapshot keys are canonical; the anchor carries a fragment and the
        // http scheme
        let snapshot = CrawlSnapshot {
            visited_urls: vec!["https://example.com/a".to_string()],
            ..Default::default()
        };
        let mut records = HashMap::new();
        records.insert(
            "https://example.com/".to_string(),
            record_with_anchors(&["http://example.com/a#section"]),
        );

        let audits = audit_links(&snapshot, &records, &test_config()).unwrap();
        assert!(audits[0].is_clean());
    }

    #[test]
    fn test_summary_counts() {
        let snapshot = CrawlSnapshot {
            visited_urls: vec!["a".to_string(), "b".to_string()],
            pending_urls: vec!["c".to_string()],
            external_urls: vec![],
            unreachable_urls: vec!["d".to_string()],
        };
        let audits = vec![
            LinkAudit {
                url: "a".to_string(),
                broken: vec!["d".to_string(), "e".to_string()],
                ..Default::default()
            },
            LinkAudit {
                url: "b".to_string(),
                ..Default::default()
            },
        ];

        let summary = summarize(&snapshot, &audits);
        assert_eq!(summary.visited, 2);
        assert_eq!(summary.pending, 1);
        assert_eq!(summary.unreachable, 1);
        assert_eq!(summary.pages_with_metadata, 2);
        assert_eq!(summary.pages_with_broken_links, 1);
        assert_eq!(summary.broken_links, 2);
    }

    #[test]
    fn test_audit_orders_pages() {
        let snapshot = CrawlSnapshot::default();
        let mut records = HashMap::new();
        records.insert("https://example.com/b".to_string(), record_with_anchors(&[]));
        records.insert("https://example.com/a".to_string(), record_with_anchors(&[]));

        let audits = audit_links(&snapshot, &records, &test_config()).unwrap();
        let urls: Vec<&str> = audits.iter().map(|a| a.url.as_str()).collect();
        assert_eq!(urls, vec!["https://example.com/a", "https://example.com/b"]);
    }
}
