//! Page retrieval: raw bytes for a single URL under a fixed timeout.

use askweb_http::{HttpClient, HttpError, RequestOpts};
use async_trait::async_trait;
use std::time::{Duration, Instant};
use thiserror::Error;

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Bytes kept per page; extraction only needs the leading paragraphs.
pub const MAX_PAGE_BYTES: usize = 2 * 1024 * 1024;

const FETCH_UA: &str = "Mozilla/5.0 (compatible; askweb/0.1; +https://github.com/askweb/askweb)";

#[derive(Debug, Error)]
#[error("failed to fetch {url}: {cause}")]
pub struct FetchError {
    pub url: String,
    pub cause: String,
}

#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<Vec<u8>, FetchError>;
}

/// Plain HTTP GET, no retries, redirects followed.
#[derive(Clone)]
pub struct HttpFetcher {
    http: HttpClient,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, HttpError> {
        let http = HttpClient::unanchored(Some(FETCH_UA))?.with_timeout(DEFAULT_FETCH_TIMEOUT);
        Ok(Self { http })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<Vec<u8>, FetchError> {
        let started = Instant::now();
        let opts = RequestOpts {
            timeout: Some(timeout),
            allow_absolute: true,
            max_body: Some(MAX_PAGE_BYTES),
            ..Default::default()
        };
        match self.http.get_bytes(url, opts).await {
            Ok(resp) => {
                tracing::debug!(
                    target: "web.fetch",
                    url = %url,
                    status = %resp.status,
                    bytes = resp.body.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "fetch.success"
                );
                Ok(resp.body)
            }
            Err(e) => {
                tracing::warn!(
                    target: "web.fetch",
                    url = %url,
                    error = %e,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "fetch.error"
                );
                Err(FetchError {
                    url: url.to_string(),
                    cause: e.to_string(),
                })
            }
        }
    }
}
