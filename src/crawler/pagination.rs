//! Pagination discovery
//!
//! A listing's seed page embeds the total number of products in its page
//! metadata. Discovery reads that count and derives every page URL from it.

use crate::crawler::fetcher::{FetchResult, RenderedPageFetcher};
use crate::model::Endpoint;
use crate::storage::EndpointStore;
use crate::url::{page_url, seed_base, validate_url};
use crate::{ConfigError, ConfigResult, ScrapeError};
use regex::Regex;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Errors that abort discovery for a category
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Seed page {url} could not be fetched: {reason}")]
    SeedUnavailable { url: String, reason: String },

    #[error("Could not find the product count in seed page {url}")]
    CountNotFound { url: String },

    #[error("No valid endpoints found in {path}")]
    NoValidEndpoints { path: PathBuf },

    #[error("Seed page {url} reports {total_items} items, more than {max_pages} pages")]
    TooManyPages {
        url: String,
        total_items: u64,
        max_pages: u32,
    },
}

/// Upper bound on the pages generated for one listing
pub const MAX_PAGES: u32 = 100_000;

/// One way of reading the total item count out of a page
pub trait CountStrategy: Send + Sync {
    /// Human-readable description for logs
    fn describe(&self) -> &str;

    /// Returns the count if this strategy recognises it in `html`
    fn extract(&self, html: &str) -> Option<u64>;
}

/// Matches `"<field>":<digits>` in embedded JSON
#[derive(Debug, Clone)]
pub struct JsonFieldCount {
    field: String,
    pattern: Regex,
}

impl JsonFieldCount {
    pub fn new(field: &str) -> ConfigResult<Self> {
        let pattern = Regex::new(&format!(r#""{}"\s*:\s*(\d+)"#, regex::escape(field))).map_err(
            |e| ConfigError::InvalidCountField {
                field: field.to_string(),
                message: e.to_string(),
            },
        )?;

        Ok(Self {
            field: field.to_string(),
            pattern,
        })
    }
}

impl CountStrategy for JsonFieldCount {
    fn describe(&self) -> &str {
        &self.field
    }

    fn extract(&self, html: &str) -> Option<u64> {
        self.pattern
            .captures_iter(html)
            .find_map(|captures| captures.get(1)?.as_str().parse().ok())
    }
}

/// Builds the ordered strategy list from configured field names
pub fn count_strategies(fields: &[String]) -> ConfigResult<Vec<Box<dyn CountStrategy>>> {
    fields
        .iter()
        .map(|field| JsonFieldCount::new(field).map(|s| Box::new(s) as Box<dyn CountStrategy>))
        .collect()
}

/// Tries each strategy in order; the first match wins
pub fn extract_total_count(html: &str, strategies: &[Box<dyn CountStrategy>]) -> Option<u64> {
    strategies.iter().find_map(|strategy| {
        let count = strategy.extract(html)?;
        tracing::info!(
            "Total products found: {} using field '{}'",
            count,
            strategy.describe()
        );
        Some(count)
    })
}

/// Number of pages needed for `total_items`
pub fn total_pages(total_items: u64, items_per_page: u32) -> u64 {
    total_items.div_ceil(u64::from(items_per_page.max(1)))
}

/// Generates the ordered page endpoints of a listing
///
/// # Returns
///
/// * `Ok(Vec<Endpoint>)` - One endpoint per page, in page order
/// * `Err(DiscoveryError::TooManyPages)` - The count needs more than
///   [`MAX_PAGES`] pages
///
/// # Examples
///
/// ```
/// use shelf_scraper::crawler::generate_endpoints;
///
/// let endpoints = generate_endpoints("https://shop.example/guitars.html?sort=new", 51, 25).unwrap();
/// assert_eq!(endpoints.len(), 3);
/// assert_eq!(endpoints[2].url, "https://shop.example/guitars.html?ls=25&pg=3");
/// ```
pub fn generate_endpoints(
    seed_url: &str,
    total_items: u64,
    items_per_page: u32,
) -> Result<Vec<Endpoint>, DiscoveryError> {
    let base = seed_base(seed_url);
    let pages = u32::try_from(total_pages(total_items, items_per_page))
        .ok()
        .filter(|pages| *pages <= MAX_PAGES)
        .ok_or_else(|| DiscoveryError::TooManyPages {
            url: seed_url.to_string(),
            total_items,
            max_pages: MAX_PAGES,
        })?;

    tracing::info!(
        "Generating endpoints with base_url={}, total_products={}, products_per_page={}",
        base,
        total_items,
        items_per_page
    );

    Ok((1..=pages)
        .map(|page| Endpoint::new(page_url(base, items_per_page, page), page))
        .collect())
}

/// Discovers and persists the endpoints of a listing
pub struct PaginationDiscoverer {
    fetcher: Arc<RenderedPageFetcher>,
    strategies: Vec<Box<dyn CountStrategy>>,
    items_per_page: u32,
}

impl PaginationDiscoverer {
    pub fn new(
        fetcher: Arc<RenderedPageFetcher>,
        strategies: Vec<Box<dyn CountStrategy>>,
        items_per_page: u32,
    ) -> Self {
        Self {
            fetcher,
            strategies,
            items_per_page,
        }
    }

    /// Runs discovery for a seed URL and saves the result
    ///
    /// # Steps
    ///
    /// 1. Fetch the seed page (same retry policy as any page)
    /// 2. Read the total item count via the ordered strategies
    /// 3. Compute `ceil(total / items_per_page)` pages
    /// 4. Generate one endpoint per page, in page order
    /// 5. Append them to `store`
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<Endpoint>)` - The endpoints; empty when the listing has no items
    /// * `Err(ScrapeError)` - Seed unavailable, count missing, or the store
    ///   could not be written
    pub async fn discover(
        &self,
        seed_url: &str,
        store: &EndpointStore,
    ) -> Result<Vec<Endpoint>, ScrapeError> {
        validate_url(seed_url)?;

        let html = match self.fetcher.fetch(seed_url).await {
            FetchResult::Success(html) => html,
            FetchResult::Failure(reason) => {
                return Err(DiscoveryError::SeedUnavailable {
                    url: seed_url.to_string(),
                    reason,
                }
                .into())
            }
        };

        let total_items = extract_total_count(&html, &self.strategies).ok_or_else(|| {
            DiscoveryError::CountNotFound {
                url: seed_url.to_string(),
            }
        })?;

        let endpoints = generate_endpoints(seed_url, total_items, self.items_per_page)?;
        store.save(&endpoints)?;

        if endpoints.is_empty() {
            tracing::info!("Seed page {} lists no products", seed_url);
        } else {
            tracing::info!(
                "Total number of endpoints collected: {} (saved to {})",
                endpoints.len(),
                store.path().display()
            );
        }

        Ok(endpoints)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::fetcher::FetchPolicy;
    use crate::crawler::render::{PageRenderer, RenderError};
    use crate::storage::EndpointLoad;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::time::Duration;
    use tempfile::TempDir;

    struct StaticPage(String);

    #[async_trait]
    impl PageRenderer for StaticPage {
        async fn render(&self, _: &str, _: Duration, _: Duration) -> Result<String, RenderError> {
            Ok(self.0.clone())
        }
    }

    fn default_strategies() -> Vec<Box<dyn CountStrategy>> {
        let fields: Vec<String> = [
            "result_count",
            "cumulative_result_count",
            "resultCount",
            "cumulativeResultCount",
        ]
        .iter()
        .map(|f| f.to_string())
        .collect();
        count_strategies(&fields).unwrap()
    }

    fn discoverer(page: &str) -> PaginationDiscoverer {
        let policy = FetchPolicy {
            retries: 1,
            ..FetchPolicy::default()
        };
        let fetcher = RenderedPageFetcher::new(Arc::new(StaticPage(page.to_string())), policy);
        PaginationDiscoverer::new(Arc::new(fetcher), default_strategies(), 25)
    }

    #[test]
    fn test_page_count_matches_ceiling() {
        for total in [0u64, 1, 24, 25, 26, 49, 50, 51, 1234] {
            let endpoints = generate_endpoints("https://shop.example/a.html", total, 25).unwrap();
            assert_eq!(endpoints.len() as u64, (total + 24) / 25, "total={}", total);

            for (i, endpoint) in endpoints.iter().enumerate() {
                assert_eq!(endpoint.page, i as u32 + 1);
                assert_eq!(
                    endpoint.url,
                    format!("https://shop.example/a.html?ls=25&pg={}", i + 1)
                );
            }

            let unique: HashSet<_> = endpoints.iter().map(|e| &e.url).collect();
            assert_eq!(unique.len(), endpoints.len());
        }
    }

    #[test]
    fn test_total_pages_at_the_limits() {
        assert_eq!(total_pages(u64::MAX, 25), u64::MAX / 25 + 1);
        assert_eq!(total_pages(u64::MAX, 1), u64::MAX);
        assert_eq!(total_pages(0, 25), 0);
    }

    #[test]
    fn test_huge_count_is_rejected() {
        let html = r#"{"result_count":18446744073709551615}"#;
        let total = extract_total_count(html, &default_strategies()).unwrap();

        let err = generate_endpoints("https://shop.example/a.html", total, 25).unwrap_err();
        assert!(matches!(err, DiscoveryError::TooManyPages { .. }));

        let just_over = u64::from(MAX_PAGES) * 25 + 1;
        assert!(generate_endpoints("https://shop.example/a.html", just_over, 25).is_err());
        assert_eq!(
            generate_endpoints("https://shop.example/a.html", just_over - 1, 25)
                .unwrap()
                .len(),
            MAX_PAGES as usize
        );
    }

    #[tokio::test]
    async fn test_discover_rejects_huge_count() {
        let dir = TempDir::new().unwrap();
        let store = EndpointStore::new(dir.path().join("endpoints.csv"), 100);

        let err = discoverer(r#"{"resultCount":9000000000000}"#)
            .discover("https://shop.example/a.html", &store)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ScrapeError::Discovery(DiscoveryError::TooManyPages { .. })
        ));
        assert!(!store.path().exists());
    }

    #[test]
    fn test_first_matching_strategy_wins() {
        let html = r#"{"resultCount":80,"result_count":30}"#;
        assert_eq!(extract_total_count(html, &default_strategies()), Some(30));
    }

    #[test]
    fn test_later_strategies_are_tried() {
        let html = r#"<script>window.data = {"cumulativeResultCount": 412};</script>"#;
        assert_eq!(extract_total_count(html, &default_strategies()), Some(412));
    }

    #[test]
    fn test_field_names_are_matched_exactly() {
        let html = r#"{"cumulative_result_count":7}"#;
        let only_plain = count_strategies(&["result_count".to_string()]).unwrap();
        assert_eq!(extract_total_count(html, &only_plain), None);
    }

    #[tokio::test]
    async fn test_discover_persists_endpoints() {
        let dir = TempDir::new().unwrap();
        let store = EndpointStore::new(dir.path().join("endpoints.csv"), 100);

        let endpoints = discoverer(r#"<html><script>{"result_count":60}</script></html>"#)
            .discover("https://shop.example/a.html?ls=100", &store)
            .await
            .unwrap();

        assert_eq!(endpoints.len(), 3);
        assert_eq!(store.load().unwrap(), EndpointLoad::Loaded(endpoints));
    }

    #[tokio::test]
    async fn test_zero_items_is_empty_success() {
        let dir = TempDir::new().unwrap();
        let store = EndpointStore::new(dir.path().join("endpoints.csv"), 100);

        let endpoints = discoverer(r#"{"resultCount":0}"#)
            .discover("https://shop.example/a.html", &store)
            .await
            .unwrap();

        assert!(endpoints.is_empty());
        assert_eq!(store.load().unwrap(), EndpointLoad::EmptyOrMissing);
    }

    #[tokio::test]
    async fn test_missing_count_fails() {
        let dir = TempDir::new().unwrap();
        let store = EndpointStore::new(dir.path().join("endpoints.csv"), 100);

        let err = discoverer("<html>no metadata here</html>")
            .discover("https://shop.example/a.html", &store)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ScrapeError::Discovery(DiscoveryError::CountNotFound { .. })
        ));
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_unfetchable_seed_fails() {
        let dir = TempDir::new().unwrap();
        let store = EndpointStore::new(dir.path().join("endpoints.csv"), 100);

        let err = discoverer("")
            .discover("https://shop.example/a.html", &store)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ScrapeError::Discovery(DiscoveryError::SeedUnavailable { .. })
        ));
    }
}
