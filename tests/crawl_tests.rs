//! Integration tests for the crawler
//!
//! These tests use wiremock to serve listing and detail pages and the
//! in-memory search backend to observe what gets provisioned and stored.

use physician_indexer::config::{parse_config, Config};
use physician_indexer::crawler::{Coordinator, SkipReason};
use physician_indexer::state::RunPhase;
use physician_indexer::storage::{IndexSchema, MemoryBackend, SearchBackend, TermBucket};
use physician_indexer::CrawlError;
use std::sync::Arc;
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration crawling `listing_url`
fn create_test_config(listing_url: &str, workers: u32) -> Config {
    parse_config(&format!(
        r#"
[crawler]
listing-url = "{listing_url}"
link-selector = "ul.doctors li a"
request-delay-ms = 100
workers = {workers}
max-retries = 0
timeout-secs = 5

[search]
url = "http://127.0.0.1:1"
index = "physicians"

[selectors]
overview = ".overview"
full-name = "h1.name"
years-of-practice = ".years"
language = ".language"
office-location = ".office"
hospital-affiliation = ".hospital"
specialties = ".specialties"
education-and-medical-training = ".education"
certification-and-licensure = ".certification"
"#
    ))
    .expect("test config is valid")
}

fn listing_page(paths: &[&str]) -> String {
    let items: String = paths
        .iter()
        .map(|p| format!(r#"<li><a href="{}">Doctor</a></li>"#, p))
        .collect();
    format!(
        r#"<html><body>
        <nav><a href="/about">About</a></nav>
        <ul class="doctors">{}</ul>
        </body></html>"#,
        items
    )
}

fn full_detail_page(name: &str, office: &str) -> String {
    format!(
        r#"<html><body>
        <div class="overview">Board certified internist.</div>
        <h1 class="name"> {name} </h1>
        <p class="years">12 years</p>
        <p class="language">English, Spanish</p>
        <p class="office">{office}</p>
        <p class="hospital">Saint Mary Hospital</p>
        <p class="specialties">Internal Medicine</p>
        <p class="education">Rutgers "NJMS"</p>
        <p class="certification">ABIM</p>
        </body></html>"#
    )
}

async fn mount_page(server: &MockServer, route: &str, status: u16, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(status)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

fn coordinator(server: &MockServer, workers: u32, backend: &Arc<MemoryBackend>) -> Coordinator {
    let config = create_test_config(&format!("{}/listing", server.uri()), workers);
    Coordinator::with_backend(config, backend.clone()).expect("coordinator builds")
}

#[tokio::test]
async fn test_full_record_and_missing_page() {
    let server = MockServer::start().await;
    mount_page(&server, "/listing", 200, listing_page(&["/doctors/u1", "/doctors/u2"])).await;
    mount_page(&server, "/doctors/u1", 200, full_detail_page("Jane Doe", "Newark, NJ")).await;
    mount_page(&server, "/doctors/u2", 404, String::new()).await;

    let backend = Arc::new(MemoryBackend::new());
    let mut coordinator = coordinator(&server, 1, &backend);
    let report = coordinator.run().await.unwrap();

    assert_eq!(coordinator.phase(), RunPhase::Done);
    assert_eq!(report.links_found, 2);
    assert_eq!(report.indexed, 1);
    assert_eq!(report.skipped_count(), 1);
    assert!(matches!(report.skipped[0].reason, SkipReason::Fetch(_)));
    assert!(report.skipped[0].url.ends_with("/doctors/u2"));

    let documents = backend.documents("physicians");
    assert_eq!(documents.len(), 1);
    let doc = &documents[0];
    assert_eq!(doc["full_name"], "Jane Doe");
    assert_eq!(doc["overview"], "Board certified internist.");
    assert_eq!(doc["years_of_practice"], "12 years");
    assert_eq!(doc["language"], "English, Spanish");
    assert_eq!(doc["office_location"], "Newark, NJ");
    assert_eq!(doc["hospital_affiliation"], "Saint Mary Hospital");
    assert_eq!(doc["specialties"], "Internal Medicine");
    assert_eq!(doc["education_and_medical_training"], "Rutgers NJMS");
    assert_eq!(doc["certification_and_licensure"], "ABIM");
}

#[tokio::test]
async fn test_partial_page_stores_absent_fields_as_null() {
    let server = MockServer::start().await;
    mount_page(&server, "/listing", 200, listing_page(&["/doctors/u1"])).await;
    mount_page(
        &server,
        "/doctors/u1",
        200,
        r#"<html><body><h1 class="name">John Roe</h1></body></html>"#.to_string(),
    )
    .await;

    let backend = Arc::new(MemoryBackend::new());
    let report = coordinator(&server, 1, &backend).run().await.unwrap();

    assert_eq!(report.indexed, 1);
    let doc = &backend.documents("physicians")[0];
    assert_eq!(doc["full_name"], "John Roe");
    for field in [
        "overview",
        "years_of_practice",
        "language",
        "office_location",
        "hospital_affiliation",
        "specialties",
        "education_and_medical_training",
        "certification_and_licensure",
    ] {
        assert!(doc[field].is_null(), "{} should be null", field);
    }
}

#[tokio::test]
async fn test_existing_index_is_not_recreated() {
    let server = MockServer::start().await;
    mount_page(&server, "/listing", 200, listing_page(&["/doctors/u1", "/doctors/u2"])).await;
    mount_page(&server, "/doctors/u1", 200, full_detail_page("Jane Doe", "Newark, NJ")).await;
    mount_page(&server, "/doctors/u2", 200, full_detail_page("John Roe", "Trenton, NJ")).await;

    let backend = Arc::new(MemoryBackend::new());
    backend
        .create_index("physicians", &IndexSchema::physicians(1, 0))
        .await
        .unwrap();

    let report = coordinator(&server, 1, &backend).run().await.unwrap();

    assert_eq!(report.indexed, 2);
    assert_eq!(backend.create_calls(), 1);
    assert_eq!(backend.document_count("physicians"), 2);
}

#[tokio::test]
async fn test_post_run_aggregation_counts_names() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/listing",
        200,
        listing_page(&["/doctors/a", "/doctors/b", "/doctors/c"]),
    )
    .await;
    mount_page(&server, "/doctors/a", 200, full_detail_page("Jane Doe", "Newark, NJ")).await;
    mount_page(&server, "/doctors/b", 200, full_detail_page("John Roe", "Newark, NJ")).await;
    mount_page(&server, "/doctors/c", 200, full_detail_page("Jane Doe", "Camden, NJ")).await;

    let backend = Arc::new(MemoryBackend::new());
    let report = coordinator(&server, 1, &backend).run().await.unwrap();

    assert_eq!(
        report.aggregation,
        Some(vec![
            TermBucket {
                key: "Jane Doe".to_string(),
                doc_count: 2
            },
            TermBucket {
                key: "John Roe".to_string(),
                doc_count: 1
            },
        ])
    );
}

#[tokio::test]
async fn test_zero_links_touches_nothing() {
    let server = MockServer::start().await;
    mount_page(&server, "/listing", 200, listing_page(&[])).await;

    let backend = Arc::new(MemoryBackend::new());
    let mut coordinator = coordinator(&server, 1, &backend);
    let report = coordinator.run().await.unwrap();

    assert_eq!(coordinator.phase(), RunPhase::Done);
    assert_eq!(report.links_found, 0);
    assert_eq!(report.provision, None);
    assert_eq!(backend.create_calls(), 0);
    assert_eq!(backend.write_calls(), 0);
}

#[tokio::test]
async fn test_store_failure_is_isolated() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/listing",
        200,
        listing_page(&["/doctors/a", "/doctors/b", "/doctors/c"]),
    )
    .await;
    mount_page(&server, "/doctors/a", 200, full_detail_page("Jane Doe", "Newark, NJ")).await;
    mount_page(&server, "/doctors/b", 200, full_detail_page("John Roe", "Newark, NJ")).await;
    mount_page(&server, "/doctors/c", 200, full_detail_page("Ann Poe", "Camden, NJ")).await;

    let backend = Arc::new(MemoryBackend::new());
    backend.fail_writes_for("John Roe");

    let report = coordinator(&server, 1, &backend).run().await.unwrap();

    assert_eq!(report.indexed, 2);
    assert_eq!(report.skipped_count(), 1);
    assert_eq!(report.skipped[0].reason, SkipReason::Store);
    assert_eq!(backend.document_count("physicians"), 2);
}

#[tokio::test]
async fn test_provision_failure_retried_on_next_link() {
    let server = MockServer::start().await;
    mount_page(&server, "/listing", 200, listing_page(&["/doctors/a", "/doctors/b"])).await;
    mount_page(&server, "/doctors/a", 200, full_detail_page("Jane Doe", "Newark, NJ")).await;
    mount_page(&server, "/doctors/b", 200, full_detail_page("John Roe", "Newark, NJ")).await;

    let backend = Arc::new(MemoryBackend::new());
    backend.fail_next_creates(1);

    let report = coordinator(&server, 1, &backend).run().await.unwrap();

    assert_eq!(report.indexed, 1);
    assert_eq!(report.skipped_count(), 1);
    assert_eq!(report.skipped[0].reason, SkipReason::Provision);
    assert_eq!(backend.create_calls(), 2);
    assert_eq!(backend.document_count("physicians"), 1);
}

#[tokio::test]
async fn test_listing_failure_ends_run() {
    let server = MockServer::start().await;
    mount_page(&server, "/listing", 500, String::new()).await;

    let backend = Arc::new(MemoryBackend::new());
    let mut coordinator = coordinator(&server, 1, &backend);
    let report = coordinator.run().await.unwrap();

    assert!(report.listing_failed);
    assert_eq!(report.links_found, 0);
    assert_eq!(coordinator.phase(), RunPhase::Done);
    assert_eq!(backend.create_calls(), 0);
}

#[tokio::test]
async fn test_unhealthy_backend_fails_before_fetching() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let backend = Arc::new(MemoryBackend::new());
    backend.set_unhealthy(true);

    let result = coordinator(&server, 1, &backend).run().await;
    assert!(matches!(result, Err(CrawlError::Search(_))));
}

#[tokio::test]
async fn test_concurrent_workers_index_every_link() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/listing",
        200,
        listing_page(&["/doctors/a", "/doctors/b", "/doctors/c", "/doctors/d"]),
    )
    .await;
    mount_page(&server, "/doctors/a", 200, full_detail_page("Jane Doe", "Newark, NJ")).await;
    mount_page(&server, "/doctors/b", 200, full_detail_page("John Roe", "Newark, NJ")).await;
    mount_page(&server, "/doctors/c", 200, full_detail_page("Ann Poe", "Camden, NJ")).await;
    mount_page(&server, "/doctors/d", 404, String::new()).await;

    let backend = Arc::new(MemoryBackend::new());
    let report = coordinator(&server, 3, &backend).run().await.unwrap();

    assert_eq!(report.indexed, 3);
    assert_eq!(report.skipped_count(), 1);
    assert_eq!(backend.create_calls(), 1);
    assert_eq!(backend.document_count("physicians"), 3);
}

#[tokio::test]
async fn test_cancelled_run_starts_no_links() {
    let server = MockServer::start().await;
    mount_page(&server, "/listing", 200, listing_page(&["/doctors/a", "/doctors/b"])).await;
    Mock::given(method("GET"))
        .and(path("/doctors/a"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let backend = Arc::new(MemoryBackend::new());
    let mut coordinator = coordinator(&server, 1, &backend);
    coordinator.cancellation_token().cancel();

    let report = coordinator.run().await.unwrap();

    assert_eq!(report.links_found, 2);
    assert_eq!(report.cancelled, 2);
    assert_eq!(report.indexed, 0);
    assert_eq!(backend.write_calls(), 0);
}

#[tokio::test]
async fn test_rerun_overwrites_documents() {
    let server = MockServer::start().await;
    mount_page(&server, "/listing", 200, listing_page(&["/doctors/a", "/doctors/b"])).await;
    mount_page(&server, "/doctors/a", 200, full_detail_page("Jane Doe", "Newark, NJ")).await;
    mount_page(&server, "/doctors/b", 200, full_detail_page("John Roe", "Newark, NJ")).await;

    let backend = Arc::new(MemoryBackend::new());
    let mut coordinator = coordinator(&server, 1, &backend);

    coordinator.run().await.unwrap();
    let report = coordinator.run().await.unwrap();

    assert_eq!(report.indexed, 2);
    assert_eq!(backend.write_calls(), 4);
    assert_eq!(backend.document_count("physicians"), 2);
}

#[tokio::test]
async fn test_nameless_pages_at_same_office_are_kept_apart() {
    let server = MockServer::start().await;
    mount_page(&server, "/listing", 200, listing_page(&["/doctors/a", "/doctors/b"])).await;
    mount_page(
        &server,
        "/doctors/a",
        200,
        r#"<html><body><p class="office">Newark Clinic</p>
        <p class="specialties">Cardiology</p></body></html>"#
            .to_string(),
    )
    .await;
    mount_page(
        &server,
        "/doctors/b",
        200,
        r#"<html><body><p class="office">Newark Clinic</p>
        <p class="specialties">Dermatology</p></body></html>"#
            .to_string(),
    )
    .await;

    let backend = Arc::new(MemoryBackend::new());
    let report = coordinator(&server, 1, &backend).run().await.unwrap();

    assert_eq!(report.indexed, 2);
    assert_eq!(backend.document_count("physicians"), 2);

    let mut specialties: Vec<String> = backend
        .documents("physicians")
        .iter()
        .map(|doc| doc["specialties"].as_str().unwrap().to_string())
        .collect();
    specialties.sort();
    assert_eq!(specialties, vec!["Cardiology", "Dermatology"]);
}

#[tokio::test]
async fn test_requests_are_spaced_by_configured_delay() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/listing",
        200,
        listing_page(&["/doctors/a", "/doctors/b", "/doctors/c"]),
    )
    .await;
    mount_page(&server, "/doctors/a", 200, full_detail_page("Jane Doe", "Newark, NJ")).await;
    mount_page(&server, "/doctors/b", 200, full_detail_page("John Roe", "Newark, NJ")).await;
    mount_page(&server, "/doctors/c", 200, full_detail_page("Ann Poe", "Camden, NJ")).await;

    let backend = Arc::new(MemoryBackend::new());
    let mut coordinator = coordinator(&server, 1, &backend);

    let start = Instant::now();
    let report = coordinator.run().await.unwrap();
    let elapsed = start.elapsed();

    // Listing plus three detail requests: three full intervals of 100ms
    assert_eq!(report.indexed, 3);
    assert!(
        elapsed >= Duration::from_millis(300),
        "four requests finished in {:?}",
        elapsed
    );
}
