//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use pagewalk::config::{
    Config, CrawlerConfig, MetadataConfig, OutputConfig, RetryConfig, SiteConfig, UserAgentConfig,
};
use pagewalk::crawler::Coordinator;
use pagewalk::storage::{load_metadata, load_snapshot};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointed at a mock server
///
/// Delays are dropped to near-zero so tests run fast.
fn create_test_config(seed_url: &str, dir: &TempDir) -> Config {
    Config {
        site: SiteConfig {
            seed_url: seed_url.to_string(),
            alias_urls: vec![],
            include_paths: vec![],
            exclude_paths: vec![],
        },
        crawler: CrawlerConfig {
            request_delay_ms: 0,
            ..Default::default()
        },
        retry: RetryConfig {
            max_attempts: 3,
            base_delay_ms: 1,
            backoff_factor: 1.5,
        },
        metadata: MetadataConfig::default(),
        user_agent: UserAgentConfig {
            crawler_name: "TestWalker".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        output: OutputConfig {
            state_path: dir
                .path()
                .join("state.json")
                .to_string_lossy()
                .into_owned(),
            metadata_path: dir
                .path()
                .join("metadata.json")
                .to_string_lossy()
                .into_owned(),
        },
    }
}

fn html_page(title: &str, body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!(
            "<html><head><title>{}</title></head><body>{}</body></html>",
            title, body
        ))
        .insert_header("content-type", "text/html")
}

#[tokio::test]
async fn test_full_crawl_classifies_discovered_links() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    // Seed page links to an internal page, an external site, and a
    // fragment-carrying internal page
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(
            "Home",
            r#"<a href="/a">A</a>
               <a href="https://other.example.org/x">Elsewhere</a>
               <a href="/b#section">B</a>"#,
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(html_page("Page A", "Content A"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(html_page("Page B", "Content B"))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&format!("{}/", base_url), &dir);
    let state_path = config.output.state_path.clone();
    let metadata_path = config.output.metadata_path.clone();

    let mut coordinator = Coordinator::new(config, true).expect("Failed to create coordinator");
    coordinator.run().await.expect("Crawl failed");

    let snapshot = load_snapshot(std::path::Path::new(&state_path))
        .expect("Failed to load state")
        .expect("State file missing");

    assert_eq!(
        snapshot.visited_urls,
        vec![
            format!("{}/", base_url),
            format!("{}/a", base_url),
            format!("{}/b", base_url),
        ]
    );
    assert!(snapshot.pending_urls.is_empty());
    assert_eq!(
        snapshot.external_urls,
        vec!["https://other.example.org/x".to_string()]
    );
    assert!(snapshot.unreachable_urls.is_empty());

    // Metadata records exist for all three pages, keyed canonically
    let records = load_metadata(std::path::Path::new(&metadata_path))
        .expect("Failed to load metadata")
        .expect("Metadata file missing");
    assert_eq!(records.len(), 3);

    let home = &records[&format!("{}/", base_url)];
    assert_eq!(home.title.as_deref(), Some("Home"));
    assert_eq!(home.anchors.len(), 3);
    assert!(home.last_visited.is_some());
    assert!(home.hash.is_some());
}

#[tokio::test]
async fn test_redirect_chain_keys_metadata_under_final_url() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page("Home", r#"<a href="/old">Old</a>"#))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/new"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(html_page("New Home", "Moved here"))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&format!("{}/", base_url), &dir);
    let state_path = config.output.state_path.clone();
    let metadata_path = config.output.metadata_path.clone();

    let mut coordinator = Coordinator::new(config, true).expect("Failed to create coordinator");
    coordinator.run().await.expect("Crawl failed");

    let snapshot = load_snapshot(std::path::Path::new(&state_path))
        .unwrap()
        .unwrap();

    // Both ends of the chain count as visited
    assert!(snapshot.visited_urls.contains(&format!("{}/old", base_url)));
    assert!(snapshot.visited_urls.contains(&format!("{}/new", base_url)));

    // The record lives under the final URL only and carries the lineage
    let records = load_metadata(std::path::Path::new(&metadata_path))
        .unwrap()
        .unwrap();
    assert!(!records.contains_key(&format!("{}/old", base_url)));
    let new_record = &records[&format!("{}/new", base_url)];
    assert_eq!(
        new_record.redirected_from,
        vec![format!("{}/old", base_url)]
    );
    assert_eq!(new_record.title.as_deref(), Some("New Home"));
}

#[tokio::test]
async fn test_404_is_terminal_and_never_retried() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page("Home", r#"<a href="/missing">Missing</a>"#))
        .mount(&mock_server)
        .await;

    // Exactly one request despite a 3-attempt retry budget
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&format!("{}/", base_url), &dir);
    let state_path = config.output.state_path.clone();

    let mut coordinator = Coordinator::new(config, true).expect("Failed to create coordinator");
    coordinator.run().await.expect("Crawl failed");

    let snapshot = load_snapshot(std::path::Path::new(&state_path))
        .unwrap()
        .unwrap();
    assert_eq!(
        snapshot.unreachable_urls,
        vec![format!("{}/missing", base_url)]
    );
}

#[tokio::test]
async fn test_server_errors_exhaust_the_retry_budget() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page("Home", r#"<a href="/flaky">Flaky</a>"#))
        .mount(&mock_server)
        .await;

    // A 500 is transient: all three attempts get spent
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&format!("{}/", base_url), &dir);
    let state_path = config.output.state_path.clone();

    let mut coordinator = Coordinator::new(config, true).expect("Failed to create coordinator");
    coordinator.run().await.expect("Crawl failed");

    let snapshot = load_snapshot(std::path::Path::new(&state_path))
        .unwrap()
        .unwrap();
    assert_eq!(
        snapshot.unreachable_urls,
        vec![format!("{}/flaky", base_url)]
    );
}

#[tokio::test]
async fn test_resume_picks_up_pending_urls_without_refetching_visited() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    // The seed was already visited in the interrupted run; it must not be
    // fetched again
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page("Home", ""))
        .expect(0)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(html_page("Page A", "Content A"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&format!("{}/", base_url), &dir);
    let state_path = config.output.state_path.clone();

    // Persisted state from the interrupted run
    std::fs::write(
        &state_path,
        format!(
            r#"{{"visitedUrls":["{base}/"],"pendingUrls":["{base}/a"],"externalUrls":[],"unreachableUrls":[]}}"#,
            base = base_url
        ),
    )
    .unwrap();
    std::fs::write(
        &config.output.metadata_path,
        format!(
            r#"{{"{base}/":{{"title":"Home","redirectedFrom":[],"anchors":["{base}/a"],"lastVisited":"2026-01-01T00:00:00Z"}}}}"#,
            base = base_url
        ),
    )
    .unwrap();

    let mut coordinator = Coordinator::new(config, false).expect("Failed to create coordinator");
    coordinator.run().await.expect("Crawl failed");

    let snapshot = load_snapshot(std::path::Path::new(&state_path))
        .unwrap()
        .unwrap();
    assert!(snapshot.visited_urls.contains(&format!("{}/a", base_url)));
    assert!(snapshot.pending_urls.is_empty());
}

#[tokio::test]
async fn test_restart_retries_previously_unreachable_urls() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    // The URL was down last run; it answers now
    Mock::given(method("GET"))
        .and(path("/recovered"))
        .respond_with(html_page("Recovered", "Back up"))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page("Home", ""))
        .expect(0)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&format!("{}/", base_url), &dir);
    let state_path = config.output.state_path.clone();

    std::fs::write(
        &state_path,
        format!(
            r#"{{"visitedUrls":["{base}/"],"pendingUrls":[],"externalUrls":[],"unreachableUrls":["{base}/recovered"]}}"#,
            base = base_url
        ),
    )
    .unwrap();
    std::fs::write(
        &config.output.metadata_path,
        format!(
            r#"{{"{base}/":{{"title":"Home","redirectedFrom":[],"anchors":[],"lastVisited":"2026-01-01T00:00:00Z"}}}}"#,
            base = base_url
        ),
    )
    .unwrap();

    let mut coordinator = Coordinator::new(config, false).expect("Failed to create coordinator");
    coordinator.run().await.expect("Crawl failed");

    let snapshot = load_snapshot(std::path::Path::new(&state_path))
        .unwrap()
        .unwrap();
    assert!(snapshot.unreachable_urls.is_empty());
    assert!(snapshot
        .visited_urls
        .contains(&format!("{}/recovered", base_url)));
}

#[tokio::test]
async fn test_exclude_paths_keep_urls_out_of_the_crawl() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(
            "Home",
            r#"<a href="/docs/guide">Guide</a><a href="/private/secret">Secret</a>"#,
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/docs/guide"))
        .respond_with(html_page("Guide", "Docs"))
        .mount(&mock_server)
        .await;

    // Excluded paths are treated as external and never fetched
    Mock::given(method("GET"))
        .and(path("/private/secret"))
        .respond_with(html_page("Secret", "Hidden"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&format!("{}/", base_url), &dir);
    config.site.exclude_paths = vec!["/private/**".to_string()];
    let state_path = config.output.state_path.clone();

    let mut coordinator = Coordinator::new(config, true).expect("Failed to create coordinator");
    coordinator.run().await.expect("Crawl failed");

    let snapshot = load_snapshot(std::path::Path::new(&state_path))
        .unwrap()
        .unwrap();
    assert!(snapshot
        .visited_urls
        .contains(&format!("{}/docs/guide", base_url)));
    assert_eq!(
        snapshot.external_urls,
        vec![format!("{}/private/secret", base_url)]
    );
}

#[tokio::test]
async fn test_check_externals_fetches_without_scraping() {
    let external_server = MockServer::start().await;
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(
            "Home",
            &format!(r#"<a href="{}/landing">Away</a>"#, external_server.uri()),
        ))
        .mount(&mock_server)
        .await;

    // The external page links further; those links must never be followed
    Mock::given(method("GET"))
        .and(path("/landing"))
        .respond_with(html_page(
            "Landing",
            r#"<a href="/deeper">Deeper</a>"#,
        ))
        .expect(1)
        .mount(&external_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/deeper"))
        .respond_with(html_page("Deeper", ""))
        .expect(0)
        .mount(&external_server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&format!("{}/", base_url), &dir);
    config.crawler.check_externals = true;
    let state_path = config.output.state_path.clone();

    let mut coordinator = Coordinator::new(config, true).expect("Failed to create coordinator");
    coordinator.run().await.expect("Crawl failed");

    let snapshot = load_snapshot(std::path::Path::new(&state_path))
        .unwrap()
        .unwrap();
    // The external URL was fetched and proved reachable
    assert!(snapshot
        .visited_urls
        .contains(&format!("{}/landing", external_server.uri())));
    // Its outbound links never entered the frontier
    assert_eq!(
        snapshot.status_of(&format!("{}/deeper", external_server.uri())),
        None
    );
}
