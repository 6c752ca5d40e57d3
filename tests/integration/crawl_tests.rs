//! Integration tests for the crawler
//!
//! These tests use wiremock to serve a fake job board and drive the real
//! HTTP browser session and JSON storage through full crawls.

use chrono::NaiveDate;
use std::path::Path;
use tempfile::TempDir;
use vacancy_crawler::browser::HttpSession;
use vacancy_crawler::config::{parse_config, Config, SiteVariant};
use vacancy_crawler::crawler::{Crawler, StartMode};
use vacancy_crawler::{CrawlError, CrawlOutcome, CrawlState, JsonStorage, TodayPattern};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const HOME: &str = r#"<html><body>
    <button aria-label="Menu">Menu</button>
    <ul class="wsite-menu-default">
        <li class="wsite-menu-item-wrap"><a class="wsite-menu-item" href="/">Home</a></li>
        <li class="wsite-menu-item-wrap"><a class="wsite-menu-item" href="/latest-govpage-updates">Latest Govpage Updates</a></li>
    </ul>
</body></html>"#;

const INDEX: &str = r#"<html><body>
    <div class="blog-post">
        <h2 class="blog-title"><a class="blog-title-link blog-link" href="/vacancy-updates-05-april">Vacancy Updates - 05 April 2024</a></h2>
    </div>
    <div class="blog-post">
        <h2 class="blog-title"><a class="blog-title-link blog-link" href="/vacancy-updates-04-april">Vacancy Updates - 04 April 2024</a></h2>
    </div>
</body></html>"#;

const TODAY: &str = r#"<html><body>
    <div id="blog-post-123" class="blog-post">
        <div class="blog-content">
            <a href="/vacancy-updates-05-april">Vacancy Updates - 05 April 2024</a>
            <a href="/health">Department of Health</a>
            <a href="/health">Read More</a>
            <a href="https://example.com/jobs">Elsewhere</a>
            <a href="/saps">SAPS</a>
            <a href="/private-sector">Private Sector Vacancies</a>
        </div>
    </div>
</body></html>"#;

const HEALTH_POST: &str = r#"<html><body>
    <div class="blog-post">
        <h2 class="blog-title"><a class="blog-title-link blog-link" href="/health">Health Vacancies</a></h2>
        <p class="blog-date"><span class="date-text">5/4/2024</span></p>
        <div class="blog-content">
            <img alt="Picture" src="/uploads/health.png">
            <div class="paragraph">Post: Professional Nurse</div>
            <div class="paragraph">Closing date: 19 April 2024</div>
        </div>
    </div>
</body></html>"#;

const SAPS_POST: &str = r#"<html><body>
    <div class="blog-post">
        <h2 class="blog-title"><a class="blog-title-link blog-link" href="/saps">SAPS Vacancies</a></h2>
        <p class="blog-date"><span class="date-text">5/4/2024</span></p>
        <div class="blog-content">
            <iframe src="https://www.youtube.com/embed/abc"></iframe>
            <iframe src="https://drive.google.com/file/d/abc/preview"></iframe>
        </div>
    </div>
</body></html>"#;

const PRIVATE_SECTOR: &str = r#"<html><body>
    <div id="blog-post-9" class="blog-post">
        <a href="/acme">Acme Mining</a>
        <a href="/acme">Read more</a>
    </div>
</body></html>"#;

const ACME_POST: &str = r#"<html><body>
    <div class="blog-post">
        <h2 class="blog-title"><a class="blog-title-link blog-link" href="/acme">Acme Mining Vacancies</a></h2>
        <p class="blog-date"><span class="date-text">5/4/2024</span></p>
        <div class="blog-content"><div class="paragraph">Artisan wanted</div></div>
    </div>
</body></html>"#;

/// Mounts an HTML page at `route`
async fn mount_page(server: &MockServer, route: &str, html: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(html))
        .mount(server)
        .await;
}

/// Mounts every page of the fake job board
async fn mount_site(server: &MockServer) {
    mount_page(server, "/", HOME).await;
    mount_page(server, "/latest-govpage-updates", INDEX).await;
    mount_page(server, "/vacancy-updates-05-april", TODAY).await;
    mount_page(server, "/health", HEALTH_POST).await;
    mount_page(server, "/saps", SAPS_POST).await;
    mount_page(server, "/private-sector", PRIVATE_SECTOR).await;
    mount_page(server, "/acme", ACME_POST).await;
}

/// Creates a test configuration pointing at the mock server
fn create_test_config(base_url: &str, dir: &Path) -> Config {
    let toml = format!(
        r#"
[site]
origin = "{base}"
home-url = "{base}/"
updates-url = "{base}/latest-govpage-updates"
menu-keyword = "govpage"

[browser]
navigation-timeout-secs = 5
wait-timeout-secs = 1
poll-interval-ms = 50
settle-delay-secs = 0

[[variant]]
kind = "public"
name = "govpage-public-sector"
output-path = "{dir}/public/govpage-public-sector.json"
progress-path = "{dir}/progress.json"

[[variant]]
kind = "private"
name = "govpage-private-sector"
output-path = "{dir}/public/govpage-private-sector.json"
progress-path = "{dir}/state.json"
"#,
        base = base_url,
        dir = dir.display()
    );
    parse_config(&toml).expect("Failed to parse test config")
}

fn friday() -> TodayPattern {
    TodayPattern::for_date(NaiveDate::from_ymd_opt(2024, 4, 5).unwrap())
}

fn create_crawler(
    config: &Config,
    kind: SiteVariant,
    today: TodayPattern,
) -> Crawler<HttpSession, JsonStorage> {
    let variant = config
        .variants
        .iter()
        .find(|v| v.kind == kind)
        .expect("variant configured");
    let session = HttpSession::new(&config.browser).expect("Failed to build session");
    Crawler::new(config, variant, session, JsonStorage::for_variant(variant)).with_today(today)
}

fn read_json(path: &Path) -> serde_json::Value {
    let content = std::fs::read_to_string(path).expect("file written");
    serde_json::from_str(&content).expect("valid JSON")
}

#[tokio::test]
async fn test_full_public_crawl() {
    let mock_server = MockServer::start().await;
    mount_site(&mock_server).await;
    let base_url = mock_server.uri();

    let temp_dir = TempDir::new().unwrap();
    let config = create_test_config(&base_url, temp_dir.path());
    let mut crawler = create_crawler(&config, SiteVariant::Public, friday());

    let outcome = crawler.run(StartMode::Resume).await.expect("crawl succeeds");

    assert_eq!(
        outcome,
        CrawlOutcome::Completed {
            targets: 2,
            posts_extracted: 2,
            resumed: false
        }
    );
    assert_eq!(crawler.state(), CrawlState::Done);
    assert!(crawler.session().is_closed());

    let output_path = temp_dir.path().join("public/govpage-public-sector.json");
    let raw = std::fs::read_to_string(&output_path).unwrap();
    let health = raw.find("\"department of health\"").expect("health target");
    let saps = raw.find("\"saps\"").expect("saps target");
    assert!(health < saps, "targets keep discovery order");

    let output = read_json(&output_path);
    assert_eq!(output["title"], "govpage-public-sector");
    assert_eq!(output["departments"].as_object().unwrap().len(), 2);
    assert_eq!(
        output["departments"]["department of health"],
        format!("{}/health", base_url)
    );

    let posts = output["blogPosts"].as_array().unwrap();
    assert_eq!(posts.len(), 2);

    assert_eq!(posts[0]["title"], "Health Vacancies");
    assert_eq!(posts[0]["href"], format!("{}/health", base_url));
    assert_eq!(posts[0]["postedDate"], "5/4/2024");
    assert_eq!(posts[0]["imgSrc"], format!("{}/uploads/health.png", base_url));
    assert_eq!(
        posts[0]["content"],
        serde_json::json!(["Post: Professional Nurse", "Closing date: 19 April 2024"])
    );
    assert!(posts[0].get("iframe").is_none());
    assert!(posts[0]["uuid"].as_str().unwrap().starts_with('p'));

    assert_eq!(posts[1]["title"], "SAPS Vacancies");
    assert!(posts[1].get("imgSrc").is_none());
    assert_eq!(posts[1]["content"], serde_json::json!([]));
    assert_eq!(
        posts[1]["iframe"],
        "https://drive.google.com/file/d/abc/preview"
    );

    let progress = read_json(&temp_dir.path().join("progress.json"));
    assert_eq!(progress, serde_json::json!({ "lastCompletedIndex": 2 }));
}

#[tokio::test]
async fn test_resume_after_failed_post() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    mount_page(&mock_server, "/", HOME).await;
    mount_page(&mock_server, "/latest-govpage-updates", INDEX).await;
    mount_page(&mock_server, "/vacancy-updates-05-april", TODAY).await;
    mount_page(&mock_server, "/health", HEALTH_POST).await;
    Mock::given(method("GET"))
        .and(path("/saps"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let config = create_test_config(&base_url, temp_dir.path());

    // First run dies on the second post
    let mut crawler = create_crawler(&config, SiteVariant::Public, friday());
    let result = crawler.run(StartMode::Resume).await;
    assert!(matches!(result, Err(CrawlError::Navigation { .. })));
    assert_eq!(crawler.state(), CrawlState::Aborted);
    assert!(crawler.session().is_closed());

    let output_path = temp_dir.path().join("public/govpage-public-sector.json");
    assert_eq!(read_json(&output_path)["blogPosts"].as_array().unwrap().len(), 1);
    assert_eq!(
        read_json(&temp_dir.path().join("progress.json"))["lastCompletedIndex"],
        1
    );

    // Second run resumes straight at the failed post
    mock_server.reset().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(HOME))
        .expect(0)
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/saps", SAPS_POST).await;

    let mut crawler = create_crawler(&config, SiteVariant::Public, friday());
    let outcome = crawler.run(StartMode::Resume).await.expect("resume succeeds");

    assert_eq!(
        outcome,
        CrawlOutcome::Completed {
            targets: 2,
            posts_extracted: 1,
            resumed: true
        }
    );

    let output = read_json(&output_path);
    let titles: Vec<_> = output["blogPosts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["title"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(titles, vec!["Health Vacancies", "SAPS Vacancies"]);
    assert_eq!(
        read_json(&temp_dir.path().join("progress.json"))["lastCompletedIndex"],
        2
    );
}

#[tokio::test]
async fn test_no_updates_today() {
    let mock_server = MockServer::start().await;
    mount_site(&mock_server).await;

    let temp_dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), temp_dir.path());

    // Saturday 06 April 2024 has no index entry
    let saturday = TodayPattern::for_date(NaiveDate::from_ymd_opt(2024, 4, 6).unwrap());
    let mut crawler = create_crawler(&config, SiteVariant::Public, saturday);

    let outcome = crawler.run(StartMode::Resume).await.expect("crawl succeeds");

    assert_eq!(outcome, CrawlOutcome::NoUpdatesToday);
    assert_eq!(crawler.state(), CrawlState::Done);
    assert!(!temp_dir
        .path()
        .join("public/govpage-public-sector.json")
        .exists());
    assert!(!temp_dir.path().join("progress.json").exists());
}

#[tokio::test]
async fn test_private_crawl_embeds_collection_in_progress() {
    let mock_server = MockServer::start().await;
    mount_site(&mock_server).await;
    let base_url = mock_server.uri();

    let temp_dir = TempDir::new().unwrap();
    let config = create_test_config(&base_url, temp_dir.path());
    let mut crawler = create_crawler(&config, SiteVariant::Private, friday());

    let outcome = crawler.run(StartMode::Resume).await.expect("crawl succeeds");

    assert_eq!(
        outcome,
        CrawlOutcome::Completed {
            targets: 1,
            posts_extracted: 1,
            resumed: false
        }
    );

    let output = read_json(&temp_dir.path().join("public/govpage-private-sector.json"));
    assert_eq!(
        output["businesses"],
        serde_json::json!({ "acme mining": format!("{}/acme", base_url) })
    );
    assert!(output.get("departments").is_none());
    let post = &output["blogPosts"][0];
    assert_eq!(post["title"], "Acme Mining Vacancies");
    assert!(post["uuid"].as_str().unwrap().starts_with("gov-"));

    let progress = read_json(&temp_dir.path().join("state.json"));
    assert_eq!(progress["lastCompletedIndex"], 1);
    assert_eq!(progress["collection"]["title"], "govpage-private-sector");
    assert_eq!(
        progress["collection"]["blogPosts"].as_array().unwrap().len(),
        1
    );
}

#[tokio::test]
async fn test_missing_post_container_aborts() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/", HOME).await;
    mount_page(&mock_server, "/latest-govpage-updates", INDEX).await;
    mount_page(&mock_server, "/vacancy-updates-05-april", TODAY).await;
    mount_page(&mock_server, "/health", "<html><body><p>Moved</p></body></html>").await;

    let temp_dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), temp_dir.path());
    let mut crawler = create_crawler(&config, SiteVariant::Public, friday());

    let result = crawler.run(StartMode::Resume).await;

    match result {
        Err(CrawlError::ElementNotFound { selector, .. }) => assert_eq!(selector, ".blog-post"),
        other => panic!("expected ElementNotFound, got {:?}", other),
    }
    assert_eq!(crawler.state(), CrawlState::Aborted);

    // Targets were saved before extraction started
    let output = read_json(&temp_dir.path().join("public/govpage-public-sector.json"));
    assert_eq!(output["departments"].as_object().unwrap().len(), 2);
    assert_eq!(output["blogPosts"], serde_json::json!([]));
    assert_eq!(
        read_json(&temp_dir.path().join("progress.json"))["lastCompletedIndex"],
        0
    );
}

#[tokio::test]
async fn test_fresh_start_discards_progress() {
    let mock_server = MockServer::start().await;
    mount_site(&mock_server).await;

    let temp_dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), temp_dir.path());
    std::fs::write(
        temp_dir.path().join("progress.json"),
        r#"{"lastCompletedIndex": 7}"#,
    )
    .unwrap();

    let mut crawler = create_crawler(&config, SiteVariant::Public, friday());
    let outcome = crawler.run(StartMode::Fresh).await.expect("crawl succeeds");

    assert!(matches!(
        outcome,
        CrawlOutcome::Completed {
            posts_extracted: 2,
            resumed: false,
            ..
        }
    ));
    assert_eq!(
        read_json(&temp_dir.path().join("progress.json"))["lastCompletedIndex"],
        2
    );
}

#[tokio::test]
async fn test_failed_fresh_run_is_not_resumed() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let config = create_test_config(&base_url, temp_dir.path());

    // An earlier run stopped after one of its two posts
    let output_path = temp_dir.path().join("public/govpage-public-sector.json");
    std::fs::create_dir_all(output_path.parent().unwrap()).unwrap();
    let stale = serde_json::json!({
        "title": "govpage-public-sector",
        "departments": {
            "old department": format!("{}/old-department", base_url),
            "old agency": format!("{}/old-agency", base_url)
        },
        "blogPosts": [{
            "uuid": "pstale",
            "title": "Old Vacancies",
            "href": format!("{}/old-department", base_url),
            "postedDate": "4/4/2024",
            "content": []
        }]
    });
    std::fs::write(&output_path, stale.to_string()).unwrap();
    std::fs::write(
        temp_dir.path().join("progress.json"),
        r#"{"lastCompletedIndex": 1}"#,
    )
    .unwrap();

    let mut crawler = create_crawler(&config, SiteVariant::Public, friday());
    let result = crawler.run(StartMode::Fresh).await;
    assert!(matches!(result, Err(CrawlError::Navigation { .. })));

    let output = read_json(&output_path);
    assert_eq!(output["departments"], serde_json::json!({}));
    assert_eq!(output["blogPosts"], serde_json::json!([]));

    // The next default run navigates from the home page again
    mock_server.reset().await;
    mount_site(&mock_server).await;

    let mut crawler = create_crawler(&config, SiteVariant::Public, friday());
    let outcome = crawler.run(StartMode::Resume).await.expect("crawl succeeds");

    assert_eq!(
        outcome,
        CrawlOutcome::Completed {
            targets: 2,
            posts_extracted: 2,
            resumed: false
        }
    );
    let titles: Vec<_> = read_json(&output_path)["blogPosts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["title"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(titles, vec!["Health Vacancies", "SAPS Vacancies"]);
}
