//! Text cleanup helpers for extractors

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref CONTROL_CHARS: Regex = Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F\x7F]").unwrap();
    static ref PRICE: Regex = Regex::new(r"\d+(?:\.\d+)?").unwrap();
    static ref EMAIL: Regex =
        Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap();
}

/// Collapses runs of whitespace to single spaces and strips control characters
///
/// # Examples
///
/// ```
/// use trawler::extract::clean_text;
///
/// assert_eq!(clean_text("  Hello \n\t world  "), "Hello world");
/// ```
pub fn clean_text(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    CONTROL_CHARS.replace_all(&collapsed, "").trim().to_string()
}

/// Pulls the first number out of a price label
///
/// Thousands separators are ignored, so `"$1,299.99"` gives `1299.99`.
/// Returns None when no digits are present.
pub fn parse_price(text: &str) -> Option<f64> {
    let without_separators = text.replace(',', "");
    PRICE
        .find(&without_separators)
        .and_then(|m| m.as_str().parse().ok())
}

/// Finds every email address in `text`, in order of appearance
pub fn extract_email_addresses(text: &str) -> Vec<String> {
    EMAIL
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}
