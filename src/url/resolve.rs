use url::Url;

/// Resolves an `href`/`src` attribute to an absolute URL
///
/// Returns None if the reference should be skipped:
/// - empty values and fragment-only anchors
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - references that do not resolve to HTTP(S)
pub fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    let absolute_url = base_url.join(href).ok()?;
    match absolute_url.scheme() {
        "http" | "https" => Some(absolute_url.to_string()),
        _ => None,
    }
}
