use url::Url;

/// Strips the query string and fragment from a seed URL
///
/// # Examples
///
/// ```
/// use shelf_scraper::url::seed_base;
///
/// assert_eq!(
///     seed_base("https://shop.example/guitars.html?ls=100&order=price#top"),
///     "https://shop.example/guitars.html"
/// );
/// ```
pub fn seed_base(seed_url: &str) -> &str {
    seed_url
        .split(|c: char| c == '?' || c == '#')
        .next()
        .unwrap_or(seed_url)
}

/// Builds the URL of one listing page
pub fn page_url(base: &str, items_per_page: u32, page: u32) -> String {
    format!("{}?ls={}&pg={}", base, items_per_page, page)
}

/// Reads the `pg` query parameter of a listing URL
pub fn page_number(url_str: &str) -> Option<u32> {
    let url = Url::parse(url_str.trim()).ok()?;
    let (_, value) = url.query_pairs().find(|(key, _)| key == "pg")?;
    value.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_base_without_query() {
        assert_eq!(
            seed_base("https://shop.example/guitars.html"),
            "https://shop.example/guitars.html"
        );
    }

    #[test]
    fn test_page_url_format() {
        assert_eq!(
            page_url("https://shop.example/guitars.html", 25, 3),
            "https://shop.example/guitars.html?ls=25&pg=3"
        );
    }

    #[test]
    fn test_page_number() {
        assert_eq!(page_number("https://shop.example/a.html?ls=25&pg=12"), Some(12));
        assert_eq!(page_number("https://shop.example/a.html?ls=25"), None);
        assert_eq!(page_number("https://shop.example/a.html?pg=abc"), None);
        assert_eq!(page_number("garbage"), None);
    }
}
