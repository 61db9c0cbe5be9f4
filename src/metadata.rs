//! Per-page metadata records and merge rules
//!
//! Records are keyed by the final, post-redirect canonical URL. A record is
//! created on the first successful visit and merged, never replaced, on
//! later visits: content fields are first-write-wins, while redirect lineage
//! and anchor lists only ever grow (with deduplication).

use crate::url::{normalize_url, CanonicalHost};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Optional audit scores attached by an external page-quality tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LighthouseScores {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accessibility: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_practices: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seo: Option<f64>,
}

/// Per-resource-type URL lists observed while rendering a page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceLists {
    #[serde(default)]
    pub scripts: Vec<String>,
    #[serde(default)]
    pub stylesheets: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

impl ResourceLists {
    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty() && self.stylesheets.is_empty() && self.images.is_empty()
    }
}

/// Durable metadata record for one final URL
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Social meta fields (og:*, twitter:*) keyed by property name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub social: BTreeMap<String, String>,

    /// URLs that redirected to this one, in discovery order, deduplicated
    #[serde(default)]
    pub redirected_from: Vec<String>,

    /// Outbound links as seen on the page, deduplicated by canonical form
    #[serde(default)]
    pub anchors: Vec<String>,

    /// Content digest of the rendered page, for duplicate detection
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub lighthouse: Option<LighthouseScores>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceLists>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_visited: Option<DateTime<Utc>>,
}

/// Fields extracted from one successful page visit
#[derive(Debug, Clone, Default)]
pub struct PageExtract {
    pub title: Option<String>,
    pub description: Option<String>,
    pub social: BTreeMap<String, String>,
    pub anchors: Vec<String>,
    pub hash: Option<String>,
    pub resources: Option<ResourceLists>,
}

/// In-memory map of all metadata records, keyed by final canonical URL
#[derive(Debug, Default)]
pub struct MetadataLedger {
    records: HashMap<String, PageRecord>,
}

impl MetadataLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores a ledger from the persisted metadata map
    pub fn from_records(records: HashMap<String, PageRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &HashMap<String, PageRecord> {
        &self.records
    }

    pub fn contains(&self, final_url: &str) -> bool {
        self.records.contains_key(final_url)
    }

    pub fn get(&self, final_url: &str) -> Option<&PageRecord> {
        self.records.get(final_url)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Re-keys every record against the current canonical host
    ///
    /// Keys carry the canonical host of the run that wrote them, which may
    /// differ if a different alias seeded a prior run; this sweep runs
    /// alongside the frontier's so the two files stay keyed consistently.
    /// Keys the `is_external` predicate classifies as third-party keep
    /// their raw form. When two records collapse to the same key, the more
    /// recently visited one wins. Keys that no longer parse are dropped.
    pub fn renormalize<F>(&mut self, canonical: &CanonicalHost, is_external: F) -> usize
    where
        F: Fn(&str) -> bool,
    {
        let mut rekeyed = 0;
        let old = std::mem::take(&mut self.records);

        for (key, record) in old {
            let new_key = if is_external(&key) {
                key
            } else {
                match normalize_url(&key, canonical) {
                    Ok(normalized) => {
                        let normalized = normalized.to_string();
                        if normalized != key {
                            rekeyed += 1;
                        }
                        normalized
                    }
                    Err(e) => {
                        tracing::warn!("Dropping metadata record with unparseable key {}: {}", key, e);
                        continue;
                    }
                }
            };

            match self.records.get(&new_key) {
                Some(existing) if existing.last_visited >= record.last_visited => {}
                _ => {
                    self.records.insert(new_key, record);
                }
            }
        }

        rekeyed
    }

    /// Merges one visit's extraction into the record for `final_url`
    ///
    /// `redirect_sources` is the redirect chain that led to this final URL
    /// on this visit. On a repeat visit, scraped content fields keep their
    /// prior values; only lineage and anchor lists are extended.
    pub fn merge_visit(
        &mut self,
        final_url: &str,
        extract: PageExtract,
        redirect_sources: &[String],
    ) {
        let record = self.records.entry(final_url.to_string()).or_default();
        let first_visit = record.last_visited.is_none();

        for source in redirect_sources {
            if !record.redirected_from.contains(source) {
                record.redirected_from.push(source.clone());
            }
        }

        for anchor in extract.anchors {
            if !record.anchors.contains(&anchor) {
                record.anchors.push(anchor);
            }
        }

        if first_visit {
            record.title = extract.title;
            record.description = extract.description;
            record.social = extract.social;
            record.hash = extract.hash;
            record.resources = extract.resources;
        }

        record.last_visited = Some(Utc::now());
    }
}
