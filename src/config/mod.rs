//! Configuration module for Shelf-Scraper
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use shelf_scraper::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("scraper.toml")).unwrap();
//! println!("Fetch ceiling per category: {}", config.scraper.max_concurrent_fetches);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{CategoryConfig, Config, FetcherConfig, ScraperConfig, SelectorConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
