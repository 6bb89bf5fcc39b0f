use serde::Deserialize;

/// Main configuration structure for Shelf-Scraper
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub selectors: SelectorConfig,
    #[serde(rename = "category", default)]
    pub categories: Vec<CategoryConfig>,
}

/// Run-wide scraping behaviour
#[derive(Debug, Clone, Deserialize)]
pub struct ScraperConfig {
    /// Whether categories run at all unless overridden
    #[serde(rename = "run-scraper", default = "default_true")]
    pub run_scraper: bool,

    /// Process only the first N endpoints (absent or 0 = all)
    #[serde(default)]
    pub depth: Option<usize>,

    /// Ceiling on fetch tasks in flight per category
    #[serde(rename = "max-concurrent-fetches", default = "default_max_concurrent")]
    pub max_concurrent_fetches: usize,

    /// Listing page size used to compute the page count
    #[serde(rename = "items-per-page", default = "default_items_per_page")]
    pub items_per_page: u32,

    /// Records per flushed chunk
    #[serde(rename = "chunk-size", default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Embedded JSON fields holding the total item count, tried in order
    #[serde(rename = "count-fields", default = "default_count_fields")]
    pub count_fields: Vec<String>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            run_scraper: true,
            depth: None,
            max_concurrent_fetches: default_max_concurrent(),
            items_per_page: default_items_per_page(),
            chunk_size: default_chunk_size(),
            count_fields: default_count_fields(),
        }
    }
}

/// Page fetching and retry behaviour
#[derive(Debug, Clone, Deserialize)]
pub struct FetcherConfig {
    /// Total attempts per page
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Timeout for getting a response (milliseconds)
    #[serde(rename = "navigation-timeout-ms", default = "default_navigation_timeout")]
    pub navigation_timeout_ms: u64,

    /// Timeout for the page content to finish arriving (milliseconds)
    #[serde(rename = "settle-timeout-ms", default = "default_settle_timeout")]
    pub settle_timeout_ms: u64,

    /// Delay before the second attempt (milliseconds)
    #[serde(rename = "retry-delay-ms", default = "default_retry_delay")]
    pub retry_delay_ms: u64,

    /// Growth of the delay per further attempt; 1.0 keeps it fixed
    #[serde(rename = "backoff-factor", default = "default_backoff_factor")]
    pub backoff_factor: f64,

    /// Upper bound on any single delay (milliseconds)
    #[serde(rename = "max-retry-delay-ms", default = "default_max_retry_delay")]
    pub max_retry_delay_ms: u64,

    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            retries: default_retries(),
            navigation_timeout_ms: default_navigation_timeout(),
            settle_timeout_ms: default_settle_timeout(),
            retry_delay_ms: default_retry_delay(),
            backoff_factor: default_backoff_factor(),
            max_retry_delay_ms: default_max_retry_delay(),
            user_agent: default_user_agent(),
        }
    }
}

/// CSS selectors locating product fields on a listing page
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// One product block
    pub product: String,
    /// Container holding manufacturer and name
    pub title: String,
    pub manufacturer: String,
    pub name: String,
    /// Element whose `style` carries the rating as `width:NN%`
    #[serde(rename = "rating-filler")]
    pub rating_filler: String,
    #[serde(rename = "review-count")]
    pub review_count: String,
    #[serde(rename = "description-item")]
    pub description_item: String,
    pub availability: String,
    pub price: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            product: "div.fx-product-list-entry".to_string(),
            title: "div.product__title.fx-text".to_string(),
            manufacturer: "span.title__manufacturer".to_string(),
            name: "span.title__name".to_string(),
            rating_filler: "div.fx-rating-stars__filler".to_string(),
            review_count: "div.fx-rating-stars__description".to_string(),
            description_item: "li.product__description-item.fx-list__item.fx-list__item--circle"
                .to_string(),
            availability: "span.fx-availability".to_string(),
            price: "span.fx-typography-price-primary.fx-price-group__primary.product__price-primary"
                .to_string(),
        }
    }
}

/// One named scraping target
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryConfig {
    pub name: String,

    /// First, unpaginated listing URL
    #[serde(rename = "seed-url")]
    pub seed_url: String,

    #[serde(rename = "endpoints-path")]
    pub endpoints_path: String,

    #[serde(rename = "records-path")]
    pub records_path: String,

    /// Overrides `scraper.run-scraper` for this category
    #[serde(rename = "run-scraper", default)]
    pub run_scraper: Option<bool>,

    /// Overrides `scraper.depth` for this category
    #[serde(default)]
    pub depth: Option<usize>,
}

impl CategoryConfig {
    /// Run flag after applying the category override
    pub fn should_run(&self, scraper: &ScraperConfig) -> bool {
        self.run_scraper.unwrap_or(scraper.run_scraper)
    }

    /// Endpoint limit after applying the category override; `None` = all
    pub fn depth_limit(&self, scraper: &ScraperConfig) -> Option<usize> {
        self.depth.or(scraper.depth).filter(|depth| *depth > 0)
    }
}

fn default_true() -> bool {
    true
}

fn default_max_concurrent() -> usize {
    10
}

fn default_items_per_page() -> u32 {
    25
}

fn default_chunk_size() -> usize {
    crate::storage::DEFAULT_CHUNK_SIZE
}

fn default_count_fields() -> Vec<String> {
    [
        "result_count",
        "cumulative_result_count",
        "resultCount",
        "cumulativeResultCount",
    ]
    .iter()
    .map(|field| field.to_string())
    .collect()
}

fn default_retries() -> u32 {
    3
}

fn default_navigation_timeout() -> u64 {
    60_000
}

fn default_settle_timeout() -> u64 {
    10_000
}

fn default_retry_delay() -> u64 {
    5_000
}

fn default_backoff_factor() -> f64 {
    1.0
}

fn default_max_retry_delay() -> u64 {
    30_000
}

fn default_user_agent() -> String {
    format!("shelf-scraper/{}", env!("CARGO_PKG_VERSION"))
}
