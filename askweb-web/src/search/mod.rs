//! Search providers: turn a query into a ranked list of candidate URLs.

pub mod brave;
pub mod duckduckgo;

use async_trait::async_trait;
use std::collections::HashSet;
use thiserror::Error;
use url::Url;

pub use brave::BraveSearcher;
pub use duckduckgo::DuckDuckGoSearcher;

#[derive(Debug, Error)]
pub enum SearchError {
    /// The provider could not be reached or answered with something unusable.
    #[error("search provider {provider} unavailable: {cause}")]
    Unavailable {
        provider: &'static str,
        cause: String,
    },
}

#[async_trait]
pub trait Searcher: Send + Sync {
    /// Return up to `limit` URLs in provider ranking order.
    ///
    /// An empty result set is `Ok(vec![])`; only transport and provider
    /// failures are errors.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>, SearchError>;

    fn name(&self) -> &'static str;
}

/// Keep http(s) URLs, drop duplicates (first occurrence wins), cap at `limit`.
pub(crate) fn rank_urls<I>(candidates: I, limit: usize) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter_map(|raw| Url::parse(raw.trim()).ok())
        .filter(|u| matches!(u.scheme(), "http" | "https"))
        .filter(|u| seen.insert(url_key(u)))
        .map(String::from)
        .take(limit)
        .collect()
}

// Dedupe key: drop fragment, trim trailing slash.
fn url_key(u: &Url) -> String {
    let mut clone = u.clone();
    clone.set_fragment(None);
    clone.as_str().trim_end_matches('/').to_string()
}
