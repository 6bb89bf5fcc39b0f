//! Page rendering capability
//!
//! A [`PageRenderer`] turns a URL into the final HTML of the page. The
//! fetcher only depends on this trait; the bundled [`HttpRenderer`] loads the
//! page over HTTP with `reqwest`, treating the response headers as
//! "navigation" and the complete body as "content settled".

use crate::config::FetcherConfig;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

/// Why a single render attempt failed
#[derive(Debug, Clone, Error)]
pub enum RenderError {
    #[error("Navigation to {url} timed out after {timeout:?}")]
    NavigationTimeout { url: String, timeout: Duration },

    #[error("Content of {url} did not settle within {timeout:?}")]
    SettleTimeout { url: String, timeout: Duration },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Render failed for {url}: {message}")]
    Render { url: String, message: String },
}

impl RenderError {
    /// Returns true for either timeout variant
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::NavigationTimeout { .. } | Self::SettleTimeout { .. }
        )
    }
}

/// Loads a page and returns its final HTML
///
/// Implementations acquire whatever resource they need per call and must
/// release it on every exit path, including timeouts.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// Renders `url`
    ///
    /// # Arguments
    ///
    /// * `url` - Page to load
    /// * `navigation_timeout` - Limit for reaching the page
    /// * `settle_timeout` - Limit for the content to finish loading once reached
    async fn render(
        &self,
        url: &str,
        navigation_timeout: Duration,
        settle_timeout: Duration,
    ) -> Result<String, RenderError>;
}

/// Builds the HTTP client used by [`HttpRenderer`]
///
/// # Arguments
///
/// * `config` - The fetcher configuration (user agent)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &FetcherConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Renderer that fetches raw HTML over HTTP
#[derive(Debug, Clone)]
pub struct HttpRenderer {
    client: Client,
}

impl HttpRenderer {
    pub fn new(config: &FetcherConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::with_client(build_http_client(config)?))
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageRenderer for HttpRenderer {
    async fn render(
        &self,
        url: &str,
        navigation_timeout: Duration,
        settle_timeout: Duration,
    ) -> Result<String, RenderError> {
        let response = self
            .client
            .get(url)
            .timeout(navigation_timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RenderError::NavigationTimeout {
                        url: url.to_string(),
                        timeout: navigation_timeout,
                    }
                } else {
                    RenderError::Render {
                        url: url.to_string(),
                        message: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RenderError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        match tokio::time::timeout(settle_timeout, response.text()).await {
            Ok(Ok(body)) => Ok(body),
            Ok(Err(e)) if e.is_timeout() => Err(RenderError::NavigationTimeout {
                url: url.to_string(),
                timeout: navigation_timeout,
            }),
            Ok(Err(e)) => Err(RenderError::Render {
                url: url.to_string(),
                message: e.to_string(),
            }),
            Err(_) => Err(RenderError::SettleTimeout {
                url: url.to_string(),
                timeout: settle_timeout,
            }),
        }
    }
}
