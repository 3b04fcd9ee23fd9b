//! Single-attempt HTTP transport
//!
//! A transport performs exactly one request and classifies any failure.
//! Retrying is the [`Fetcher`](super::Fetcher)'s job, which keeps alternative
//! backends and test doubles down to one method.

use crate::config::ScraperConfig;
use crate::fetcher::{ErrorKind, Request};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::{redirect::Policy, Client};
use std::time::Duration;

/// Raw outcome of one HTTP exchange
#[derive(Debug, Clone)]
pub struct Response {
    /// HTTP status code
    pub status: u16,
    /// Final URL after redirects
    pub final_url: String,
    /// Content-Type header value
    pub content_type: Option<String>,
    /// Decoded body text
    pub body: String,
}

/// One network round-trip for a request
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends the request once
    ///
    /// Non-2xx statuses are returned as `Ok`; only failures that produced no
    /// response at all are `Err`.
    async fn send(&self, request: &Request) -> Result<Response, ErrorKind>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The scraper configuration (timeout and proxy are read)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &ScraperConfig) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

    let timeout = config.timeout();
    let mut builder = Client::builder()
        .default_headers(headers)
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true);

    if let Some(proxy) = &config.http.proxy {
        builder = builder.proxy(reqwest::Proxy::all(proxy.as_str())?);
    }

    builder.build()
}

/// `reqwest`-backed transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Creates a transport with a client built from `config`
    pub fn new(config: &ScraperConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config)?,
        })
    }

    /// Wraps an already configured client
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &Request) -> Result<Response, ErrorKind> {
        let mut builder = self
            .client
            .get(request.url.as_str())
            .timeout(request.timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().await.map_err(classify_error)?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response.text().await.map_err(classify_error)?;

        Ok(Response {
            status,
            final_url,
            content_type,
            body,
        })
    }
}

/// Classifies a reqwest failure into the per-URL taxonomy
///
/// | Condition | Kind |
/// |-----------|------|
/// | Timeout | `Timeout` (retryable) |
/// | DNS lookup failure | `Resolution` |
/// | Connection refused/reset | `Connection` (retryable) |
/// | Body cut off / undecodable | `Connection` (retryable) |
/// | Redirect loop or chain > 10 | `Protocol` |
/// | Invalid request (bad URL, header) | `Protocol` |
fn classify_error(error: reqwest::Error) -> ErrorKind {
    if error.is_timeout() {
        ErrorKind::Timeout
    } else if error.is_connect() {
        if is_dns_failure(&error) {
            ErrorKind::Resolution {
                message: error.to_string(),
            }
        } else {
            ErrorKind::Connection {
                message: error.to_string(),
            }
        }
    } else if error.is_redirect() || error.is_builder() {
        ErrorKind::Protocol {
            message: error.to_string(),
        }
    } else {
        ErrorKind::Connection {
            message: error.to_string(),
        }
    }
}

/// Walks the error source chain looking for a resolver failure
fn is_dns_failure(error: &reqwest::Error) -> bool {
    let mut current: Option<&(dyn std::error::Error + 'static)> = Some(error);
    while let Some(err) = current {
        let text = err.to_string().to_ascii_lowercase();
        if text.contains("dns error")
            || text.contains("failed to lookup address")
            || text.contains("name or service not known")
            || text.contains("no such host")
        {
            return true;
        }
        current = err.source();
    }
    false
}
