//! Crawler module for listing discovery, page fetching and extraction
//!
//! This module contains the core scraping logic, including:
//! - Page rendering behind the `PageRenderer` trait
//! - Fetching with retries, timeouts and pacing
//! - Pagination discovery from the seed page's product count
//! - Product record extraction
//! - Admission control and per-category coordination

mod coordinator;
mod fetcher;
mod pagination;
mod parser;
mod render;
mod scheduler;

pub use coordinator::{run_scrape, select_categories, Coordinator, RunOptions};
pub use fetcher::{FetchPolicy, FetchResult, RenderedPageFetcher};
pub use pagination::{
    count_strategies, extract_total_count, generate_endpoints, total_pages, CountStrategy,
    DiscoveryError, JsonFieldCount, PaginationDiscoverer,
};
pub use parser::{parse_rating_style, ExtractError, ProductSelectors, RecordExtractor};
pub use render::{build_http_client, HttpRenderer, PageRenderer, RenderError};
pub use scheduler::{select_endpoints, AdmissionGate, GatePermit};
