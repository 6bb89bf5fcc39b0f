//! Page fetcher with retry logic
//!
//! This module wraps a [`PageRenderer`] with:
//! - Separate navigation and content-settle timeouts
//! - A bounded retry budget shared by timeouts and other failures
//! - A non-decreasing, capped delay between attempts
//! - Treating empty HTML as a failed attempt

use crate::config::FetcherConfig;
use crate::crawler::render::PageRenderer;
use std::sync::Arc;
use std::time::Duration;

/// Result of a fetch operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResult {
    /// Final HTML of the page
    Success(String),

    /// Every attempt failed; carries the last reason
    Failure(String),
}

impl FetchResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Timeouts and retry pacing for one fetch
#[derive(Debug, Clone, PartialEq)]
pub struct FetchPolicy {
    /// Total attempts (at least one is always made)
    pub retries: u32,
    pub navigation_timeout: Duration,
    pub settle_timeout: Duration,
    /// Delay before the second attempt
    pub retry_delay: Duration,
    /// Multiplier applied per further attempt; 1.0 keeps the delay fixed
    pub backoff_factor: f64,
    pub max_retry_delay: Duration,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self::from(&FetcherConfig::default())
    }
}

impl From<&FetcherConfig> for FetchPolicy {
    fn from(config: &FetcherConfig) -> Self {
        Self {
            retries: config.retries,
            navigation_timeout: Duration::from_millis(config.navigation_timeout_ms),
            settle_timeout: Duration::from_millis(config.settle_timeout_ms),
            retry_delay: Duration::from_millis(config.retry_delay_ms),
            backoff_factor: config.backoff_factor,
            max_retry_delay: Duration::from_millis(config.max_retry_delay_ms),
        }
    }
}

impl FetchPolicy {
    /// Number of attempts actually made
    pub fn attempts(&self) -> u32 {
        self.retries.max(1)
    }

    /// Delay to wait after the given failed attempt (1-based)
    ///
    /// Never decreases with `attempt` and never exceeds `max_retry_delay`.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let factor = self.backoff_factor.max(1.0).powi(exponent);
        let millis = self.retry_delay.as_millis() as f64 * factor;
        let cap = self.max_retry_delay.as_millis() as f64;
        Duration::from_millis(millis.min(cap) as u64)
    }
}

/// Fetches rendered pages with retries
pub struct RenderedPageFetcher {
    renderer: Arc<dyn PageRenderer>,
    policy: FetchPolicy,
}

impl RenderedPageFetcher {
    pub fn new(renderer: Arc<dyn PageRenderer>, policy: FetchPolicy) -> Self {
        Self { renderer, policy }
    }

    pub fn policy(&self) -> &FetchPolicy {
        &self.policy
    }

    /// Fetches a URL, retrying until the budget is spent
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | Non-empty HTML | Return `Success` |
    /// | Empty HTML | Warn, retry |
    /// | Navigation/settle timeout | Warn, retry |
    /// | Any other render error | Warn, retry |
    /// | Budget exhausted | Return `Failure` |
    ///
    /// This never panics and never returns an error; callers treat
    /// `Failure` as "skip this page".
    pub async fn fetch(&self, url: &str) -> FetchResult {
        tracing::info!("Fetching content from {}", url);

        let attempts = self.policy.attempts();
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            match self
                .renderer
                .render(
                    url,
                    self.policy.navigation_timeout,
                    self.policy.settle_timeout,
                )
                .await
            {
                Ok(html) if !html.trim().is_empty() => {
                    tracing::debug!("Fetched {} bytes from {}", html.len(), url);
                    return FetchResult::Success(html);
                }
                Ok(_) => {
                    tracing::warn!(
                        "Empty page content from {} on attempt {}/{}",
                        url,
                        attempt,
                        attempts
                    );
                    last_error = "empty page content".to_string();
                }
                Err(e) if e.is_timeout() => {
                    tracing::warn!(
                        "Timeout fetching {} on attempt {}/{}: {}",
                        url,
                        attempt,
                        attempts,
                        e
                    );
                    last_error = e.to_string();
                }
                Err(e) => {
                    tracing::warn!(
                        "Error fetching {} on attempt {}/{}: {}",
                        url,
                        attempt,
                        attempts,
                        e
                    );
                    last_error = e.to_string();
                }
            }

            if attempt < attempts {
                let delay = self.policy.delay_after(attempt);
                tracing::info!("Retrying {} in {:?}", url, delay);
                tokio::time::sleep(delay).await;
            }
        }

        tracing::warn!("Max retries reached for {}, skipping", url);
        FetchResult::Failure(last_error)
    }
}
