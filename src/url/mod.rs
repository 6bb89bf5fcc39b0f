//! URL handling module for Shelf-Scraper
//!
//! This module provides syntactic URL validation and the helpers used to
//! derive paginated listing URLs from a seed URL.

mod paging;

pub use paging::{page_number, page_url, seed_base};

use crate::{UrlError, UrlResult};
use url::Url;

/// Parses and validates a URL for fetching
///
/// A valid URL parses, uses the `http` or `https` scheme and has a host.
///
/// # Arguments
///
/// * `url_str` - The URL string to validate
///
/// # Returns
///
/// * `Ok(Url)` - The parsed URL
/// * `Err(UrlError)` - Why the URL was rejected
///
/// # Examples
///
/// ```
/// use shelf_scraper::url::validate_url;
///
/// assert!(validate_url("https://shop.example/list.html?pg=2").is_ok());
/// assert!(validate_url("mailto:someone@shop.example").is_err());
/// ```
pub fn validate_url(url_str: &str) -> UrlResult<Url> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(UrlError::MissingHost(url_str.to_string())),
    }
}

/// Returns true if the URL passes [`validate_url`]
pub fn is_valid_url(url_str: &str) -> bool {
    validate_url(url_str).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_http_and_https() {
        assert!(is_valid_url("https://shop.example/list.html"));
        assert!(is_valid_url("http://127.0.0.1:8080/list.html?ls=25&pg=1"));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(!is_valid_url(""));
        assert!(!is_valid_url("not a url"));
        assert!(!is_valid_url("/relative/path"));
    }

    #[test]
    fn test_rejects_other_schemes() {
        assert!(matches!(
            validate_url("ftp://shop.example/file"),
            Err(UrlError::InvalidScheme(_))
        ));
        assert!(!is_valid_url("javascript:void(0)"));
    }

    #[test]
    fn test_trims_surrounding_whitespace() {
        assert!(is_valid_url("  https://shop.example/list.html  "));
    }
}
