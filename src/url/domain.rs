use url::Url;

/// Extracts the lowercase host from a URL string
///
/// Used to group requests per site in metrics. Returns `None` when the
/// string does not parse or has no host.
///
/// # Examples
///
/// ```
/// use trawler::url::extract_domain;
///
/// assert_eq!(extract_domain("https://EXAMPLE.com/path"), Some("example.com".to_string()));
/// assert_eq!(extract_domain("not a url"), None);
/// ```
pub fn extract_domain(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()?
        .host_str()
        .filter(|h| !h.is_empty())
        .map(|h| h.to_lowercase())
}
