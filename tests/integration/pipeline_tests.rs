//! Integration tests for the scrape pipeline
//!
//! These tests use wiremock to serve a seed page and its listing pages and
//! run the full discover, fetch, extract and append cycle end-to-end.

use shelf_scraper::config::{CategoryConfig, Config, FetcherConfig, ScraperConfig, SelectorConfig};
use shelf_scraper::crawler::{run_scrape, Coordinator, RunOptions};
use shelf_scraper::state::PipelineState;
use shelf_scraper::storage::{EndpointLoad, EndpointStore};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const RECORD_HEADER: &str =
    "Product ID,Manufacturer,Name,Rating,Review Count,Description,Availability,Price,createdAt";

/// Creates a test configuration with a single category under `dir`
fn create_test_config(seed_url: String, dir: &Path) -> Config {
    Config {
        scraper: ScraperConfig {
            max_concurrent_fetches: 2,
            ..ScraperConfig::default()
        },
        fetcher: FetcherConfig {
            retries: 2,
            navigation_timeout_ms: 2_000,
            settle_timeout_ms: 1_000,
            retry_delay_ms: 10, // Very short for testing
            max_retry_delay_ms: 10,
            ..FetcherConfig::default()
        },
        selectors: SelectorConfig::default(),
        categories: vec![CategoryConfig {
            name: "electric-guitars".to_string(),
            seed_url,
            endpoints_path: dir
                .join("endpoints/electric_guitars.csv")
                .display()
                .to_string(),
            records_path: dir
                .join("records/electric_guitars.csv")
                .display()
                .to_string(),
            run_scraper: None,
            depth: None,
        }],
    }
}

/// Listing page with `count` products
fn listing_page(page: u32, count: u32) -> String {
    let products: String = (1..=count)
        .map(|n| {
            format!(
                r#"<div class="fx-product-list-entry" id="{page}{n:02}">
                    <div class="product__title fx-text">
                        <span class="title__manufacturer">Harley Benton</span>
                        <span class="title__name">Model {page}-{n}</span>
                    </div>
                    <div class="fx-rating-stars__filler" style="width:90%;"></div>
                    <div class="fx-rating-stars__description">42</div>
                    <li class="product__description-item fx-list__item fx-list__item--circle">Basswood body</li>
                    <li class="product__description-item fx-list__item fx-list__item--circle">Rosewood fretboard</li>
                    <span class="fx-availability">Available immediately</span>
                    <span class="fx-typography-price-primary fx-price-group__primary product__price-primary">£ 99</span>
                </div>"#
            )
        })
        .collect();

    format!("<html><body><div class=\"fx-product-list\">{}</div></body></html>", products)
}

async fn mount_page(server: &MockServer, page: u32, count: u32) {
    Mock::given(method("GET"))
        .and(path("/electric-guitars.html"))
        .and(query_param("pg", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(page, count)))
        .mount(server)
        .await;
}

/// Mounted last so the page mocks take precedence for `?pg=` requests
async fn mount_seed(server: &MockServer, body: &str, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path("/electric-guitars.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body.to_string()))
        .expect(expected_calls)
        .mount(server)
        .await;
}

fn lines(path: &str) -> Vec<String> {
    fs::read_to_string(path)
        .expect("file should exist")
        .lines()
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn test_full_scrape_discovers_and_appends() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(&mock_server, 1, 25).await;
    mount_page(&mock_server, 2, 25).await;
    mount_page(&mock_server, 3, 10).await;
    mount_seed(
        &mock_server,
        r#"<html><script>window.__DATA__ = {"result_count":60,"page":1};</script></html>"#,
        1,
    )
    .await;

    let seed = format!("{}/electric-guitars.html?ls=100", mock_server.uri());
    let config = create_test_config(seed, dir.path());
    let category = config.categories[0].clone();

    let summary = run_scrape(config, RunOptions::default())
        .await
        .expect("scrape should start");

    assert!(summary.is_success());
    let outcome = &summary.outcomes[0];
    assert_eq!(outcome.state, PipelineState::Done);
    assert_eq!(outcome.report.endpoints_scheduled, 3);
    assert_eq!(outcome.report.endpoints_fetched, 3);
    assert_eq!(outcome.report.records_written, 60);

    // Endpoint file: header plus one row per page, in page order
    let endpoint_lines = lines(&category.endpoints_path);
    assert_eq!(endpoint_lines.len(), 4);
    assert_eq!(endpoint_lines[0], "endpoint");
    for (i, line) in endpoint_lines[1..].iter().enumerate() {
        assert!(line.ends_with(&format!("/electric-guitars.html?ls=25&pg={}", i + 1)));
    }

    // Record file: exactly one header, one row per product
    let record_lines = lines(&category.records_path);
    assert_eq!(record_lines[0], RECORD_HEADER);
    assert_eq!(record_lines.len(), 61);
    assert_eq!(
        record_lines.iter().filter(|l| l.as_str() == RECORD_HEADER).count(),
        1
    );

    let row = record_lines
        .iter()
        .find(|l| l.starts_with("101,"))
        .expect("first product of page 1");
    assert!(row.starts_with(
        "101,Harley Benton,Model 1-1,4.5,42,Basswood body; Rosewood fretboard,Available immediately,£ 99,"
    ));
}

#[tokio::test]
async fn test_second_run_reuses_endpoints_and_appends() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(&mock_server, 1, 25).await;
    mount_page(&mock_server, 2, 5).await;
    // Discovery happens only once; the second run reads the endpoint file
    mount_seed(&mock_server, r#"{"resultCount":30}"#, 1).await;

    let seed = format!("{}/electric-guitars.html", mock_server.uri());
    let config = create_test_config(seed, dir.path());
    let category = config.categories[0].clone();
    let coordinator = Arc::new(Coordinator::new(config).unwrap());

    let first = coordinator
        .clone()
        .run_all(RunOptions::default())
        .await
        .unwrap();
    let second = coordinator.run_all(RunOptions::default()).await.unwrap();

    assert_eq!(first[0].report.records_written, 30);
    assert_eq!(second[0].report.records_written, 30);

    let record_lines = lines(&category.records_path);
    assert_eq!(record_lines.len(), 61);
    assert_eq!(
        record_lines.iter().filter(|l| l.as_str() == RECORD_HEADER).count(),
        1
    );

    let store = EndpointStore::new(&category.endpoints_path, 100);
    match store.load().unwrap() {
        EndpointLoad::Loaded(endpoints) => assert_eq!(endpoints.len(), 2),
        EndpointLoad::EmptyOrMissing => panic!("endpoints should be stored"),
    }
}

#[tokio::test]
async fn test_failing_page_is_retried_then_skipped() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(&mock_server, 1, 25).await;
    Mock::given(method("GET"))
        .and(path("/electric-guitars.html"))
        .and(query_param("pg", "2"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, 3, 1).await;
    mount_seed(&mock_server, r#"{"cumulativeResultCount":51}"#, 1).await;

    let seed = format!("{}/electric-guitars.html", mock_server.uri());
    let config = create_test_config(seed, dir.path());
    let category = config.categories[0].clone();

    let summary = run_scrape(config, RunOptions::default()).await.unwrap();
    let outcome = &summary.outcomes[0];

    assert_eq!(outcome.state, PipelineState::Done);
    assert_eq!(outcome.report.endpoints_failed, 1);
    assert_eq!(outcome.report.endpoints_fetched, 2);
    assert_eq!(outcome.report.records_written, 26);
    assert_eq!(lines(&category.records_path).len(), 27);
}

#[tokio::test]
async fn test_missing_count_fails_category() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_seed(&mock_server, "<html><body>No metadata</body></html>", 1).await;

    let seed = format!("{}/electric-guitars.html", mock_server.uri());
    let config = create_test_config(seed, dir.path());
    let category = config.categories[0].clone();

    let summary = run_scrape(config, RunOptions::default()).await.unwrap();

    assert!(!summary.is_success());
    assert_eq!(summary.outcomes[0].state, PipelineState::Failed);
    assert!(summary.outcomes[0].failure.is_some());
    assert!(!Path::new(&category.endpoints_path).exists());
    assert!(!Path::new(&category.records_path).exists());
}

#[tokio::test]
async fn test_unknown_category_is_an_error() {
    let dir = TempDir::new().unwrap();
    let config = create_test_config("https://shop.example/a.html".to_string(), dir.path());

    let result = run_scrape(
        config,
        RunOptions {
            fresh: false,
            only: vec!["synthesizers".to_string()],
        },
    )
    .await;

    assert!(result.is_err());
}
