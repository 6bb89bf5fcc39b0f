use crate::config::types::{CategoryConfig, Config, FetcherConfig, ScraperConfig};
use crate::crawler::{count_strategies, ProductSelectors};
use crate::url::validate_url;
use crate::ConfigError;
use std::collections::HashSet;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_scraper_config(&config.scraper)?;
    validate_fetcher_config(&config.fetcher)?;
    ProductSelectors::compile(&config.selectors)?;
    validate_categories(&config.categories)?;
    Ok(())
}

/// Validates run-wide scraping settings
fn validate_scraper_config(config: &ScraperConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_fetches < 1 || config.max_concurrent_fetches > 100 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_fetches must be between 1 and 100, got {}",
            config.max_concurrent_fetches
        )));
    }

    if config.items_per_page < 1 {
        return Err(ConfigError::Validation(
            "items_per_page must be >= 1".to_string(),
        ));
    }

    if config.chunk_size < 1 {
        return Err(ConfigError::Validation(
            "chunk_size must be >= 1".to_string(),
        ));
    }

    if config.count_fields.is_empty() {
        return Err(ConfigError::Validation(
            "count_fields must name at least one field".to_string(),
        ));
    }
    count_strategies(&config.count_fields)?;

    Ok(())
}

/// Validates fetch timing and retry settings
fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    if config.retries < 1 {
        return Err(ConfigError::Validation(format!(
            "retries must be >= 1, got {}",
            config.retries
        )));
    }

    if config.navigation_timeout_ms == 0 || config.settle_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "navigation and settle timeouts must be > 0ms".to_string(),
        ));
    }

    if config.settle_timeout_ms > config.navigation_timeout_ms {
        return Err(ConfigError::Validation(format!(
            "settle_timeout_ms ({}) must not exceed navigation_timeout_ms ({})",
            config.settle_timeout_ms, config.navigation_timeout_ms
        )));
    }

    if !config.backoff_factor.is_finite() || config.backoff_factor < 1.0 {
        return Err(ConfigError::Validation(format!(
            "backoff_factor must be a finite number >= 1.0, got {}",
            config.backoff_factor
        )));
    }

    if config.max_retry_delay_ms < config.retry_delay_ms {
        return Err(ConfigError::Validation(format!(
            "max_retry_delay_ms ({}) must be >= retry_delay_ms ({})",
            config.max_retry_delay_ms, config.retry_delay_ms
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates dataset categories
fn validate_categories(categories: &[CategoryConfig]) -> Result<(), ConfigError> {
    if categories.is_empty() {
        return Err(ConfigError::Validation(
            "At least one [[category]] must be configured".to_string(),
        ));
    }

    let mut names = HashSet::new();
    let mut paths = HashSet::new();

    for category in categories {
        if category.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "Category name cannot be empty".to_string(),
            ));
        }

        if !names.insert(category.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "Duplicate category name '{}'",
                category.name
            )));
        }

        validate_url(&category.seed_url).map_err(|e| {
            ConfigError::InvalidUrl(format!(
                "Invalid seed URL '{}' for category '{}': {}",
                category.seed_url, category.name, e
            ))
        })?;

        for path in [&category.endpoints_path, &category.records_path] {
            if path.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "Category '{}' has an empty file path",
                    category.name
                )));
            }

            if !paths.insert(path.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "File path '{}' is used more than once",
                    path
                )));
            }
        }
    }

    Ok(())
}
