//! Crawl frontier: the state machine over URL identities
//!
//! The frontier owns every URL the crawler knows about and its current
//! status. All membership changes go through [`Frontier::transition`], which
//! validates the prior state, so the "exactly one status per URL" invariant
//! holds structurally instead of by discipline at every call site.

use crate::state::UrlStatus;
use crate::url::{normalize_url, CanonicalHost};
use crate::PagewalkError;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

/// Serializable snapshot of the four frontier sets
///
/// This is the unit of persistence and what the report printer consumes.
/// Field names match the on-disk JSON state file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlSnapshot {
    #[serde(default)]
    pub visited_urls: Vec<String>,
    #[serde(default)]
    pub pending_urls: Vec<String>,
    #[serde(default)]
    pub external_urls: Vec<String>,
    #[serde(default)]
    pub unreachable_urls: Vec<String>,
}

impl CrawlSnapshot {
    /// Returns the status recorded for a URL, if any set contains it
    pub fn status_of(&self, url: &str) -> Option<UrlStatus> {
        if self.visited_urls.iter().any(|u| u == url) {
            Some(UrlStatus::Visited)
        } else if self.pending_urls.iter().any(|u| u == url) {
            Some(UrlStatus::Pending)
        } else if self.unreachable_urls.iter().any(|u| u == url) {
            Some(UrlStatus::Unreachable)
        } else if self.external_urls.iter().any(|u| u == url) {
            Some(UrlStatus::External)
        } else {
            None
        }
    }
}

/// The crawl frontier state machine
///
/// Internally a single map from canonical URL to status tag plus a FIFO
/// queue over the pending subset. External URLs are keyed in their raw form
/// because nothing is known about a third-party site's canonicalization.
#[derive(Debug, Default)]
pub struct Frontier {
    statuses: HashMap<String, UrlStatus>,
    pending_queue: VecDeque<String>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a frontier from a persisted snapshot
    pub fn from_snapshot(snapshot: &CrawlSnapshot) -> Self {
        let mut frontier = Self::new();
        for url in &snapshot.visited_urls {
            frontier.statuses.insert(url.clone(), UrlStatus::Visited);
        }
        for url in &snapshot.unreachable_urls {
            frontier
                .statuses
                .insert(url.clone(), UrlStatus::Unreachable);
        }
        for url in &snapshot.external_urls {
            frontier.statuses.insert(url.clone(), UrlStatus::External);
        }
        for url in &snapshot.pending_urls {
            if frontier
                .statuses
                .insert(url.clone(), UrlStatus::Pending)
                .is_none()
            {
                frontier.pending_queue.push_back(url.clone());
            }
        }
        frontier
    }

    /// Returns the current status of a URL
    pub fn status_of(&self, url: &str) -> Option<UrlStatus> {
        self.statuses.get(url).copied()
    }

    /// Number of URLs currently pending
    pub fn pending_len(&self) -> usize {
        self.statuses
            .values()
            .filter(|s| **s == UrlStatus::Pending)
            .count()
    }

    /// Total number of URLs the frontier knows about
    pub fn known_len(&self) -> usize {
        self.statuses.len()
    }

    /// Moves a URL into the given status
    ///
    /// This is the only mutation primitive. The transition is validated
    /// against the prior status; re-asserting the current status is a no-op.
    pub fn transition(&mut self, url: &str, to: UrlStatus) -> Result<(), PagewalkError> {
        let from = self.status_of(url);

        if from == Some(to) {
            return Ok(());
        }

        if !transition_allowed(from, to) {
            return Err(PagewalkError::InvalidTransition {
                url: url.to_string(),
                from,
                to,
            });
        }

        self.statuses.insert(url.to_string(), to);
        if to == UrlStatus::Pending {
            self.pending_queue.push_back(url.to_string());
        }

        Ok(())
    }

    /// Pops the next pending URL, if any
    ///
    /// Queue entries whose status changed since enqueue (e.g. a URL marked
    /// visited through a redirect chain) are skipped.
    pub fn next_pending(&mut self) -> Option<String> {
        while let Some(url) = self.pending_queue.pop_front() {
            if self.status_of(&url) == Some(UrlStatus::Pending) {
                return Some(url);
            }
        }
        None
    }

    /// Produces the four-set snapshot for persistence and reporting
    ///
    /// Sets are sorted so successive snapshots of the same state are
    /// byte-identical on disk.
    pub fn snapshot(&self) -> CrawlSnapshot {
        let mut snapshot = CrawlSnapshot::default();
        for (url, status) in &self.statuses {
            let set = match status {
                UrlStatus::Visited => &mut snapshot.visited_urls,
                UrlStatus::Pending => &mut snapshot.pending_urls,
                UrlStatus::External => &mut snapshot.external_urls,
                UrlStatus::Unreachable => &mut snapshot.unreachable_urls,
            };
            set.push(url.clone());
        }
        snapshot.visited_urls.sort();
        snapshot.pending_urls.sort();
        snapshot.external_urls.sort();
        snapshot.unreachable_urls.sort();
        snapshot
    }

    /// Startup sweep: every unreachable URL gets another chance
    pub fn requeue_unreachable(&mut self) -> Result<usize, PagewalkError> {
        let unreachable: Vec<String> = self
            .statuses
            .iter()
            .filter(|(_, s)| **s == UrlStatus::Unreachable)
            .map(|(u, _)| u.clone())
            .collect();
        for url in &unreachable {
            self.transition(url, UrlStatus::Pending)?;
        }
        Ok(unreachable.len())
    }

    /// Startup sweep: visited URLs without a metadata record are re-queued
    ///
    /// Guards against a prior crash between "marked visited" and "metadata
    /// flushed".
    pub fn requeue_visited_without_metadata<F>(&mut self, has_metadata: F) -> Result<usize, PagewalkError>
    where
        F: Fn(&str) -> bool,
    {
        let missing: Vec<String> = self
            .statuses
            .iter()
            .filter(|(url, s)| **s == UrlStatus::Visited && !has_metadata(url))
            .map(|(u, _)| u.clone())
            .collect();
        for url in &missing {
            self.transition(url, UrlStatus::Pending)?;
        }
        Ok(missing.len())
    }

    /// Startup sweep for check-externals mode: externals get fetched too
    pub fn requeue_externals(&mut self) -> Result<usize, PagewalkError> {
        let externals: Vec<String> = self
            .statuses
            .iter()
            .filter(|(_, s)| **s == UrlStatus::External)
            .map(|(u, _)| u.clone())
            .collect();
        for url in &externals {
            self.transition(url, UrlStatus::Pending)?;
        }
        Ok(externals.len())
    }

    /// Re-normalizes every visited and pending URL against the current
    /// canonical host
    ///
    /// The host may differ from a prior run if a different alias was
    /// supplied as the seed. When two URLs collapse to the same canonical
    /// identity, Visited wins over Pending. URLs the `is_external` predicate
    /// classifies as third-party keep their raw form whatever their status:
    /// check-externals liveness fetches and followed cross-origin redirects
    /// leave external-origin URLs in Visited, and rewriting those against
    /// the canonical host would fabricate internal URLs that were never
    /// fetched. Unreachable entries are left untouched.
    pub fn renormalize<F>(&mut self, canonical: &CanonicalHost, is_external: F) -> usize
    where
        F: Fn(&str) -> bool,
    {
        let mut rewritten = 0;
        let mut new_statuses: HashMap<String, UrlStatus> = HashMap::new();
        let mut new_queue: VecDeque<String> = VecDeque::new();

        for (url, status) in &self.statuses {
            let (key, status) = match status {
                UrlStatus::Visited | UrlStatus::Pending if !is_external(url) => {
                    match normalize_url(url, canonical) {
                        Ok(normalized) => {
                            let normalized = normalized.to_string();
                            if normalized != *url {
                                rewritten += 1;
                            }
                            (normalized, *status)
                        }
                        // A previously-persisted URL that no longer parses
                        // is dropped rather than poisoning the frontier.
                        Err(e) => {
                            tracing::warn!("Dropping unparseable persisted URL {}: {}", url, e);
                            continue;
                        }
                    }
                }
                _ => (url.clone(), *status),
            };

            match new_statuses.get(&key) {
                Some(UrlStatus::Visited) => {}
                _ => {
                    new_statuses.insert(key, status);
                }
            }
        }

        for (url, status) in &new_statuses {
            if *status == UrlStatus::Pending {
                new_queue.push_back(url.clone());
            }
        }

        self.statuses = new_statuses;
        self.pending_queue = new_queue;
        rewritten
    }
}

/// Validates a status transition
///
/// Discovery (no prior status) may land anywhere: redirect-chain members are
/// sometimes first seen already visited or unreachable. Nothing ever
/// transitions *into* External; external membership is decided once, at
/// discovery.
fn transition_allowed(from: Option<UrlStatus>, to: UrlStatus) -> bool {
    use UrlStatus::*;
    match (from, to) {
        (None, _) => true,
        (Some(Pending), Visited | Unreachable) => true,
        (Some(Unreachable), Pending | Visited) => true,
        (Some(Visited), Pending | Unreachable) => true,
        (Some(External), Pending | Visited | Unreachable) => true,
        _ => false,
    }
}
