//! Minimal client for the Brave Search API (web vertical).

use super::{SearchError, Searcher, rank_urls};
use askweb_http::{Auth, HttpClient, HttpError, RequestOpts};
use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue};
use serde::Deserialize;
use std::time::{Duration, Instant};

pub const BRAVE_API_BASE: &str = "https://api.search.brave.com";
const BRAVE_MAX_COUNT: usize = 20;

#[derive(Debug, Clone, Deserialize)]
pub struct WebSearchApiResponse {
    #[serde(default)]
    pub mixed: Option<MixedResponse>,
    #[serde(default)]
    pub web: Option<WebResults>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MixedResponse {
    #[serde(default)]
    pub main: Vec<MixedEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MixedEntry {
    #[serde(rename = "type")]
    pub kind: MixedKind,
    #[serde(default)]
    pub index: usize,
    #[serde(default)]
    pub all: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MixedKind {
    Web,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebResults {
    #[serde(default)]
    pub results: Vec<WebResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebResult {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub cluster: Option<Vec<ClusterItem>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClusterItem {
    pub url: String,
}

#[derive(Clone)]
pub struct BraveSearcher {
    http: HttpClient,
    token: String,
}

impl BraveSearcher {
    pub fn new(subscription_token: String) -> Result<Self, HttpError> {
        Self::with_base(BRAVE_API_BASE, subscription_token)
    }

    pub fn with_base(base: &str, subscription_token: String) -> Result<Self, HttpError> {
        let http = HttpClient::new(base)?.with_timeout(Duration::from_secs(10));
        Ok(Self {
            http,
            token: subscription_token,
        })
    }

    async fn query(&self, query: &str, count: usize) -> Result<WebSearchApiResponse, HttpError> {
        let token = HeaderValue::from_str(&self.token).map_err(|e| HttpError::Build(e.to_string()))?;
        let params = vec![
            ("q", query.to_string().into()),
            ("count", count.clamp(1, BRAVE_MAX_COUNT).to_string().into()),
            ("result_filter", "web".into()),
            ("safesearch", "moderate".into()),
        ];
        self.http
            .get_json(
                "res/v1/web/search",
                RequestOpts {
                    auth: Some(Auth::Header {
                        name: HeaderName::from_static("x-subscription-token"),
                        value: token,
                    }),
                    query: Some(params),
                    ..Default::default()
                },
            )
            .await
    }
}

#[async_trait]
impl Searcher for BraveSearcher {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>, SearchError> {
        let started = Instant::now();
        tracing::info!(target: "web.brave", query = %query, limit, "brave.search.start");

        let resp = self.query(query, limit).await.map_err(|e| {
            tracing::warn!(
                target: "web.brave",
                elapsed_ms = started.elapsed().as_millis() as u64,
                error = %e,
                "brave.search.error"
            );
            SearchError::Unavailable {
                provider: self.name(),
                cause: e.to_string(),
            }
        })?;

        let urls = rank_urls(collect_urls_in_display_order(&resp), limit);
        tracing::info!(
            target: "web.brave",
            elapsed_ms = started.elapsed().as_millis() as u64,
            hit_count = urls.len(),
            "brave.search.success"
        );
        Ok(urls)
    }

    fn name(&self) -> &'static str {
        "brave"
    }
}

/// Prefer `mixed.main` ordering when present, else the plain web vertical.
fn collect_urls_in_display_order(resp: &WebSearchApiResponse) -> Vec<String> {
    let mut out = Vec::new();
    let web = resp.web.as_ref().map(|w| &w.results);

    if let (Some(mixed), Some(results)) = (resp.mixed.as_ref(), web) {
        for slot in mixed.main.iter().filter(|s| s.kind == MixedKind::Web) {
            if slot.all.unwrap_or(false) {
                results.iter().for_each(|it| push_web_result_urls(&mut out, it));
            } else if let Some(it) = results.get(slot.index) {
                push_web_result_urls(&mut out, it);
            }
        }
    }

    if out.is_empty() {
        if let Some(results) = web {
            results.iter().for_each(|it| push_web_result_urls(&mut out, it));
        }
    }
    out
}

/// A web result is either a plain hit with `url` or a cluster of items.
fn push_web_result_urls(out: &mut Vec<String>, it: &WebResult) {
    if let Some(u) = &it.url {
        out.push(u.clone());
        return;
    }
    if let Some(cluster) = &it.cluster {
        out.extend(cluster.iter().map(|c| c.url.clone()));
    }
}
