//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop that coordinates all aspects of
//! the crawling process:
//! - Restoring persisted state and running the startup reconciliation sweeps
//! - Pulling pending URLs from the frontier, one at a time
//! - Fetching under the retry policy and resolving redirect chains
//! - Classifying discovered anchors and advancing the frontier
//! - Merging metadata records and flushing both persisted files

use crate::config::{Config, CrossOriginRedirects};
use crate::crawler::fetcher::{build_http_client, FetchError};
use crate::crawler::parser::{extract_page, ExtractedPage};
use crate::crawler::retry::{navigate_with_retry, RetryPolicy};
use crate::metadata::{MetadataLedger, PageExtract};
use crate::state::{Frontier, UrlStatus};
use crate::storage::{load_metadata, load_snapshot, SnapshotWriter, StorageError};
use crate::url::{is_external, normalize_external_url, normalize_url, CanonicalHost};
use crate::PagewalkError;
use reqwest::Client;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Main crawler coordinator structure
///
/// Owns the frontier, the metadata ledger, and one snapshot writer per
/// persisted file for the duration of the process.
pub struct Coordinator {
    config: Config,
    canonical: CanonicalHost,
    client: Client,
    policy: RetryPolicy,
    frontier: Frontier,
    ledger: MetadataLedger,
    state_writer: SnapshotWriter,
    metadata_writer: SnapshotWriter,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `fresh` - Whether to start a fresh crawl (ignores persisted state)
    pub fn new(config: Config, fresh: bool) -> Result<Self, PagewalkError> {
        let seed = Url::parse(&config.site.seed_url)?;
        let canonical = CanonicalHost::from_seed(&seed)?;

        let (frontier, ledger) = if fresh {
            (Frontier::new(), MetadataLedger::new())
        } else {
            let snapshot = load_snapshot(Path::new(&config.output.state_path))?;
            let records = load_metadata(Path::new(&config.output.metadata_path))?;

            let frontier = match snapshot {
                Some(s) => {
                    tracing::info!(
                        "Restored state: {} visited, {} pending, {} external, {} unreachable",
                        s.visited_urls.len(),
                        s.pending_urls.len(),
                        s.external_urls.len(),
                        s.unreachable_urls.len()
                    );
                    Frontier::from_snapshot(&s)
                }
                None => {
                    tracing::info!("No persisted state found, starting new crawl");
                    Frontier::new()
                }
            };
            let ledger = records
                .map(MetadataLedger::from_records)
                .unwrap_or_default();
            (frontier, ledger)
        };

        let client = build_http_client(&config.user_agent)?;
        let policy = RetryPolicy::from_config(&config.retry);
        let state_writer = SnapshotWriter::new(&config.output.state_path);
        let metadata_writer = SnapshotWriter::new(&config.output.metadata_path);

        Ok(Self {
            config,
            canonical,
            client,
            policy,
            frontier,
            ledger,
            state_writer,
            metadata_writer,
        })
    }

    /// Startup reconciliation, run once before the loop
    ///
    /// 1. Every unreachable URL is re-queued (retry-on-restart policy).
    /// 2. With metadata collection enabled, visited URLs lacking a metadata
    ///    record are re-queued; this covers a crash between "marked visited"
    ///    and "metadata flushed".
    /// 3. Visited and pending URLs and metadata record keys are
    ///    re-normalized against the current canonical host, which may differ
    ///    if a different alias seeded a prior run; external-origin URLs keep
    ///    their raw form.
    /// 4. In check-externals mode, external URLs are re-queued for a
    ///    liveness check.
    /// 5. The seed itself is queued if the frontier doesn't know it.
    pub fn reconcile(&mut self) -> Result<(), PagewalkError> {
        let retried = self.frontier.requeue_unreachable()?;
        if retried > 0 {
            tracing::info!("Re-queued {} previously unreachable URLs", retried);
        }

        if self.config.metadata.enabled {
            let ledger = &self.ledger;
            let config = &self.config;
            let requeued = self.frontier.requeue_visited_without_metadata(|url| {
                // Externals never carry metadata records; don't churn them
                ledger.contains(url) || is_external(url, config).unwrap_or(false)
            })?;
            if requeued > 0 {
                tracing::info!("Re-queued {} visited URLs without metadata", requeued);
            }
        }

        let canonical = &self.canonical;
        let config = &self.config;
        let external = |url: &str| is_external(url, config).unwrap_or(false);
        let rewritten = self.frontier.renormalize(canonical, &external);
        if rewritten > 0 {
            tracing::info!("Re-normalized {} URLs against the current canonical host", rewritten);
        }
        let rekeyed = self.ledger.renormalize(canonical, &external);
        if rekeyed > 0 {
            tracing::info!("Re-keyed {} metadata records against the current canonical host", rekeyed);
        }

        if self.config.crawler.check_externals {
            let externals = self.frontier.requeue_externals()?;
            if externals > 0 {
                tracing::info!("Re-queued {} external URLs for liveness checks", externals);
            }
        }

        let seed = normalize_url(&self.config.site.seed_url, &self.canonical)?;
        if self.frontier.status_of(seed.as_str()).is_none() {
            self.frontier.transition(seed.as_str(), UrlStatus::Pending)?;
            tracing::info!("Queued seed URL {}", seed);
        }

        Ok(())
    }

    /// Runs the main crawl loop
    ///
    /// Exactly one URL is in flight at a time; a configurable delay is
    /// awaited between fetches so the target site sees a polite request
    /// rate. Both persisted files are flushed after every iteration.
    pub async fn run(&mut self) -> Result<(), PagewalkError> {
        self.reconcile()?;
        self.flush()?;

        let mut pages_crawled: u64 = 0;
        let start_time = std::time::Instant::now();
        let delay = Duration::from_millis(self.config.crawler.request_delay_ms);

        while let Some(url) = self.frontier.next_pending() {
            if pages_crawled > 0 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            tracing::debug!("Processing URL: {}", url);
            if let Err(e) = self.process_url(&url).await {
                tracing::error!("Error processing {}: {}", url, e);
            }

            self.flush()?;
            pages_crawled += 1;

            if pages_crawled % 10 == 0 {
                let elapsed = start_time.elapsed();
                let rate = pages_crawled as f64 / elapsed.as_secs_f64();
                tracing::info!(
                    "Progress: {} pages crawled, {} pending, {:.2} pages/sec",
                    pages_crawled,
                    self.frontier.pending_len(),
                    rate
                );
            }
        }

        self.flush()?;
        self.state_writer.wait_idle().await;
        self.metadata_writer.wait_idle().await;

        tracing::info!(
            "Crawl completed: {} pages crawled in {:?}, {} URLs known",
            pages_crawled,
            start_time.elapsed(),
            self.frontier.known_len()
        );

        Ok(())
    }

    /// Read access to the frontier, for reporting after a run
    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    /// Read access to the metadata ledger, for reporting after a run
    pub fn ledger(&self) -> &MetadataLedger {
        &self.ledger
    }

    /// Hands both writers the current in-memory state
    fn flush(&self) -> Result<(), StorageError> {
        self.state_writer.save(&self.frontier.snapshot())?;
        self.metadata_writer.save(self.ledger.records())?;
        Ok(())
    }

    /// Processes a single URL popped from the pending queue
    async fn process_url(&mut self, url: &str) -> Result<(), PagewalkError> {
        // The URL itself may classify external: either it was re-queued by
        // the check-externals sweep, or classification drifted between
        // enqueue and dequeue. Such URLs get a liveness check only.
        let liveness_only = is_external(url, &self.config).unwrap_or(false);

        let outcome = match navigate_with_retry(
            &self.client,
            url,
            &self.policy,
            self.config.crawler.max_redirects,
        )
        .await
        {
            Ok(outcome) => outcome,
            Err(FetchError::NavigationFailed {
                last_error,
                redirect_chain,
                ..
            }) => {
                tracing::warn!("Navigation failed for {}: {}", url, last_error);
                self.frontier.transition(url, UrlStatus::Unreachable)?;
                for member in &redirect_chain {
                    let member = self.canonical_form(member);
                    self.frontier.transition(&member, UrlStatus::Unreachable)?;
                }
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        // Requested URL and every chain member are now visited
        self.frontier.transition(url, UrlStatus::Visited)?;
        let mut chain_canonical = Vec::new();
        for member in &outcome.redirect_chain {
            let member = self.canonical_form(member);
            self.frontier.transition(&member, UrlStatus::Visited)?;
            chain_canonical.push(member);
        }

        let final_canonical = self.canonical_form(&outcome.final_url);
        let final_external = is_external(&outcome.final_url, &self.config).unwrap_or(true);

        if liveness_only {
            // Reachability confirmed; externals are never scraped for links
            self.frontier.transition(&final_canonical, UrlStatus::Visited)?;
            return Ok(());
        }

        if final_external {
            // The redirect chain crossed out of the configured origins
            match self.config.crawler.cross_origin_redirects {
                CrossOriginRedirects::Follow => {
                    self.frontier.transition(&final_canonical, UrlStatus::Visited)?;
                }
                CrossOriginRedirects::External => {
                    if self.frontier.status_of(&final_canonical).is_none() {
                        self.frontier.transition(&final_canonical, UrlStatus::External)?;
                    }
                }
            }
            return Ok(());
        }

        self.frontier.transition(&final_canonical, UrlStatus::Visited)?;

        let base = Url::parse(&outcome.final_url)?;
        let extracted = extract_page(&outcome.html, &base);
        let anchors = self.handle_discovered_anchors(&extracted, &final_canonical)?;

        if self.config.metadata.enabled {
            let extract = self.build_extract(extracted, anchors, &outcome.html);
            self.ledger
                .merge_visit(&final_canonical, extract, &chain_canonical);
        }

        Ok(())
    }

    /// Classifies and enqueues every anchor extracted from a page
    ///
    /// Returns the page's anchor list deduplicated by canonical form, in
    /// document order, for the metadata record. Malformed anchors are
    /// skipped with a debug log and never enter any frontier set.
    fn handle_discovered_anchors(
        &mut self,
        extracted: &ExtractedPage,
        page_url: &str,
    ) -> Result<Vec<String>, PagewalkError> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut anchors = Vec::new();

        for raw in &extracted.anchors {
            match is_external(raw, &self.config) {
                Err(e) => {
                    tracing::debug!("Skipping malformed anchor '{}' on {}: {}", raw, page_url, e);
                    continue;
                }
                Ok(true) => {
                    let canonical = normalize_external_url(raw)
                        .map(|u| u.to_string())
                        .unwrap_or_else(|_| raw.clone());
                    if !seen.insert(canonical) {
                        continue;
                    }
                    anchors.push(raw.clone());

                    // External URLs are stored raw; nothing is known about
                    // a third-party site's canonicalization. In
                    // check-externals mode they queue straight up for a
                    // liveness check.
                    if self.frontier.status_of(raw).is_none() {
                        let status = if self.config.crawler.check_externals {
                            UrlStatus::Pending
                        } else {
                            UrlStatus::External
                        };
                        self.frontier.transition(raw, status)?;
                    }
                }
                Ok(false) => {
                    let normalized = match normalize_url(raw, &self.canonical) {
                        Ok(u) => u.to_string(),
                        Err(e) => {
                            tracing::debug!(
                                "Skipping unnormalizable anchor '{}' on {}: {}",
                                raw,
                                page_url,
                                e
                            );
                            continue;
                        }
                    };
                    if !seen.insert(normalized.clone()) {
                        continue;
                    }
                    anchors.push(raw.clone());

                    if self.frontier.status_of(&normalized).is_none() {
                        self.frontier.transition(&normalized, UrlStatus::Pending)?;
                    }
                }
            }
        }

        Ok(anchors)
    }

    /// Assembles the metadata extract for one visit, honoring the
    /// configured field selection
    fn build_extract(
        &self,
        extracted: ExtractedPage,
        anchors: Vec<String>,
        html: &str,
    ) -> PageExtract {
        let metadata = &self.config.metadata;

        let hash = if metadata.collects("hash") {
            let mut hasher = Sha256::new();
            hasher.update(html.as_bytes());
            Some(hex::encode(hasher.finalize()))
        } else {
            None
        };

        PageExtract {
            title: metadata.collects("title").then_some(extracted.title).flatten(),
            description: metadata
                .collects("description")
                .then_some(extracted.description)
                .flatten(),
            social: if metadata.collects("social") {
                extracted.social
            } else {
                Default::default()
            },
            anchors,
            hash,
            resources: (metadata.collects("resources") && !extracted.resources.is_empty())
                .then_some(extracted.resources),
        }
    }

    /// Maps a raw URL to the identity the frontier keys it by
    ///
    /// Internal URLs normalize against the canonical host; external URLs
    /// keep their raw form. A URL that fails to parse is kept verbatim so
    /// failure bookkeeping never drops it.
    fn canonical_form(&self, raw: &str) -> String {
        match is_external(raw, &self.config) {
            Ok(false) => normalize_url(raw, &self.canonical)
                .map(|u| u.to_string())
                .unwrap_or_else(|_| raw.to_string()),
            _ => raw.to_string(),
        }
    }
}

/// Runs the main crawl operation
///
/// Orchestrates the entire crawl process:
///
/// 1. Restore persisted state (or start fresh)
/// 2. Run the startup reconciliation sweeps
/// 3. Main crawl loop:
///    a. Pop one pending URL
///    b. Fetch it under the retry policy
///    c. Resolve the redirect chain and update the frontier
///    d. Classify discovered anchors
///    e. Merge metadata and flush both persisted files
/// 4. Drain the snapshot writers
pub async fn run_crawl(config: Config, fresh: bool) -> Result<(), PagewalkError> {
    let mut coordinator = Coordinator::new(config, fresh)?;
    coordinator.run().await
}
