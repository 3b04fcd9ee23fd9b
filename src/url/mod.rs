//! URL handling module for Trawler
//!
//! This module validates request URLs before they reach the network and
//! resolves links found in documents against the page they came from.

mod domain;
mod resolve;

pub use domain::extract_domain;
pub use resolve::resolve_link;

use thiserror::Error;
use url::Url;

/// URL-specific errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Parses an absolute HTTP(S) URL suitable for fetching
///
/// # Arguments
///
/// * `raw` - The URL string as supplied by the caller
///
/// # Returns
///
/// * `Ok(Url)` - A parsed URL with an http/https scheme and a host
/// * `Err(UrlError)` - The string is relative, malformed, or not HTTP(S)
///
/// # Examples
///
/// ```
/// use trawler::url::parse_absolute;
///
/// assert!(parse_absolute("https://example.com/a").is_ok());
/// assert!(parse_absolute("/relative/path").is_err());
/// assert!(parse_absolute("ftp://example.com/").is_err());
/// ```
pub fn parse_absolute(raw: &str) -> Result<Url, UrlError> {
    let url = Url::parse(raw.trim()).map_err(|e| UrlError::Parse(format!("{}: {}", raw, e)))?;

    match url.scheme() {
        "http" | "https" => {}
        other => return Err(UrlError::InvalidScheme(other.to_string())),
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost);
    }

    Ok(url)
}

/// Returns true when `raw` would be accepted by [`parse_absolute`]
pub fn validate_url(raw: &str) -> bool {
    parse_absolute(raw).is_ok()
}
