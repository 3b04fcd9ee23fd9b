//! Generic HTML extraction
//!
//! Produces the default field set for any page:
//! - `url` and `status_code` of the response
//! - `title` and `meta_description`
//! - `headings` (levels 1 through 6, grouped by level)
//! - `links` and `images` resolved to absolute URLs
//! - `text_content` with script/style removed, and its `word_count`

use crate::extract::{clean_text, Fields};
use crate::fetcher::FetchResult;
use crate::url::resolve_link;
use scraper::{ElementRef, Html, Selector};
use serde_json::{json, Value};
use url::Url;

/// Elements whose text never counts as page content
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Extracts the default field set from a fetched page
///
/// The output depends only on the response, so identical input always gives
/// identical fields.
pub fn extract_default(result: &FetchResult) -> Fields {
    let document = Html::parse_document(&result.body);
    let base_url = Url::parse(result.final_url.as_deref().unwrap_or(&result.url)).ok();

    let text_content = extract_text(&document);
    let word_count = text_content.split_whitespace().count();

    let mut fields = Fields::new();
    fields.insert("url".to_string(), json!(result.url));
    fields.insert("status_code".to_string(), json!(result.status_code));
    fields.insert(
        "title".to_string(),
        json!(extract_title(&document).unwrap_or_default()),
    );
    fields.insert(
        "meta_description".to_string(),
        json!(extract_meta_description(&document).unwrap_or_default()),
    );
    fields.insert("headings".to_string(), extract_headings(&document));
    fields.insert(
        "links".to_string(),
        extract_links(&document, base_url.as_ref()),
    );
    fields.insert(
        "images".to_string(),
        extract_images(&document, base_url.as_ref()),
    );
    fields.insert("text_content".to_string(), json!(text_content));
    fields.insert("word_count".to_string(), json!(word_count));
    fields
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| clean_text(&element.text().collect::<String>()))
        .filter(|s| !s.is_empty())
}

fn extract_meta_description(document: &Html) -> Option<String> {
    let selector = Selector::parse(r#"meta[name="description"]"#).ok()?;

    document
        .select(&selector)
        .next()
        .and_then(|element| element.value().attr("content"))
        .map(clean_text)
}

fn extract_headings(document: &Html) -> Value {
    let mut headings = Vec::new();
    for level in 1..=6 {
        let Ok(selector) = Selector::parse(&format!("h{}", level)) else {
            continue;
        };
        for element in document.select(&selector) {
            headings.push(json!({
                "level": level,
                "text": element_text(&element),
            }));
        }
    }
    Value::Array(headings)
}

fn extract_links(document: &Html, base_url: Option<&Url>) -> Value {
    let (Ok(selector), Some(base_url)) = (Selector::parse("a[href]"), base_url) else {
        return Value::Array(Vec::new());
    };

    let links = document
        .select(&selector)
        .filter_map(|element| {
            let href = element.value().attr("href")?;
            let url = resolve_link(href, base_url)?;
            Some(json!({
                "url": url,
                "text": element_text(&element),
                "title": element.value().attr("title").unwrap_or_default(),
            }))
        })
        .collect();
    Value::Array(links)
}

fn extract_images(document: &Html, base_url: Option<&Url>) -> Value {
    let (Ok(selector), Some(base_url)) = (Selector::parse("img[src]"), base_url) else {
        return Value::Array(Vec::new());
    };

    let images = document
        .select(&selector)
        .filter_map(|element| {
            let src = element.value().attr("src")?;
            let url = resolve_link(src, base_url)?;
            Some(json!({
                "url": url,
                "alt": element.value().attr("alt").unwrap_or_default(),
                "title": element.value().attr("title").unwrap_or_default(),
            }))
        })
        .collect();
    Value::Array(images)
}

/// Visible text of the whole document, whitespace-collapsed
fn extract_text(document: &Html) -> String {
    let mut raw = String::new();
    for node in document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .map_or(false, |e| HIDDEN_ELEMENTS.contains(&e.name()))
        });
        if !hidden {
            raw.push_str(text);
            raw.push(' ');
        }
    }
    clean_text(&raw)
}

fn element_text(element: &ElementRef) -> String {
    clean_text(&element.text().collect::<String>())
}
