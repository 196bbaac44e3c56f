//! Keyless search through DuckDuckGo's HTML endpoint.

use super::{SearchError, Searcher, rank_urls};
use askweb_http::{HttpClient, HttpError, RequestOpts};
use async_trait::async_trait;
use scraper::{Html, Selector};
use std::time::Duration;
use url::Url;

pub const DDG_HTML_URL: &str = "https://html.duckduckgo.com/html/";

const BROWSER_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

pub struct DuckDuckGoSearcher {
    http: HttpClient,
    endpoint: String,
}

impl DuckDuckGoSearcher {
    pub fn new() -> Result<Self, HttpError> {
        Self::with_endpoint(DDG_HTML_URL)
    }

    pub fn with_endpoint(endpoint: &str) -> Result<Self, HttpError> {
        let http = HttpClient::unanchored(Some(BROWSER_UA))?.with_timeout(Duration::from_secs(10));
        Ok(Self {
            http,
            endpoint: endpoint.to_string(),
        })
    }
}

#[async_trait]
impl Searcher for DuckDuckGoSearcher {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>, SearchError> {
        tracing::info!(target: "web.ddg", query = %query, limit, "ddg.search.start");
        let resp = self
            .http
            .post_form(&self.endpoint, &[("q", query)], RequestOpts::default())
            .await
            .map_err(|e| {
                tracing::warn!(target: "web.ddg", error = %e, "ddg.search.error");
                SearchError::Unavailable {
                    provider: self.name(),
                    cause: e.to_string(),
                }
            })?;

        let html = String::from_utf8_lossy(&resp.body);
        let urls = rank_urls(parse_result_links(&html), limit);
        tracing::info!(target: "web.ddg", hit_count = urls.len(), "ddg.search.success");
        Ok(urls)
    }

    fn name(&self) -> &'static str {
        "duckduckgo"
    }
}

/// Result anchors carry `class="result__a"`; ads are tagged `result--ad`.
fn parse_result_links(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let (Ok(results), Ok(anchor)) = (
        Selector::parse("div.result:not(.result--ad)"),
        Selector::parse("a.result__a"),
    ) else {
        return Vec::new();
    };

    document
        .select(&results)
        .filter_map(|block| block.select(&anchor).next())
        .filter_map(|a| a.value().attr("href"))
        .filter_map(unwrap_redirect)
        .collect()
}

/// DDG links look like `//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com&rut=...`.
fn unwrap_redirect(href: &str) -> Option<String> {
    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href.to_string());
    }
    let absolute = if href.starts_with("//") {
        format!("https:{href}")
    } else {
        format!("https://duckduckgo.com{href}")
    };
    let parsed = Url::parse(&absolute).ok()?;
    parsed
        .query_pairs()
        .find(|(k, _)| k == "uddg")
        .map(|(_, v)| v.into_owned())
}
