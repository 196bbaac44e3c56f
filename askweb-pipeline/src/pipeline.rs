//! Search, then per-URL fetch/extract/summarize, then synthesis.
//!
//! One run is strictly sequential and never retries. Per-URL failures are
//! folded into [`PageSummary::error`] entries; only the search and synthesis
//! stages can abort a run.

use crate::model::{FinalAnswer, PageSummary, PipelineError, PipelineReport, Query, Stage};
use crate::summarize::Summarizer;
use askweb_common::AskwebError;
use askweb_web::{DEFAULT_FETCH_TIMEOUT, DEFAULT_MAX_ARTICLE_CHARS, FetchError, Fetcher, Searcher};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSettings {
    pub max_results: usize,
    pub fetch_timeout: Duration,
    pub max_article_chars: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            max_results: 5,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            max_article_chars: DEFAULT_MAX_ARTICLE_CHARS,
        }
    }
}

/// Why a single URL produced no summary.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("{0}")]
    Fetch(String),
    #[error("summarization failed: {0}")]
    Summarize(#[source] AskwebError),
}

impl From<FetchError> for PageError {
    fn from(e: FetchError) -> Self {
        // The url is already in the surrounding message.
        PageError::Fetch(e.cause)
    }
}

/// Answer a question from the web.
#[async_trait]
pub trait AnswerService: Send + Sync {
    async fn answer(&self, query: &Query) -> Result<FinalAnswer, PipelineError>;
}

pub struct Pipeline {
    searcher: Arc<dyn Searcher>,
    fetcher: Arc<dyn Fetcher>,
    summarizer: Summarizer,
    settings: PipelineSettings,
}

impl Pipeline {
    pub fn new(
        searcher: Arc<dyn Searcher>,
        fetcher: Arc<dyn Fetcher>,
        summarizer: Summarizer,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            searcher,
            fetcher,
            summarizer,
            settings,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub async fn run(&self, query: &Query) -> Result<PipelineReport, PipelineError> {
        let started = Instant::now();
        tracing::info!(
            target: "askweb.pipeline",
            state = "searching",
            provider = self.searcher.name(),
            query = %query,
            limit = self.settings.max_results,
            "pipeline.transition"
        );
        let urls = self
            .searcher
            .search(query.as_str(), self.settings.max_results)
            .await
            .map_err(|e| {
                tracing::error!(target: "askweb.pipeline", state = "failed", stage = %Stage::Search, error = ?e, "pipeline.transition");
                PipelineError {
                    stage: Stage::Search,
                    cause: e.to_string(),
                }
            })?;

        tracing::info!(
            target: "askweb.pipeline",
            state = "summarizing",
            url_count = urls.len(),
            "pipeline.transition"
        );
        let mut summaries = Vec::with_capacity(urls.len());
        for url in &urls {
            let entry = match self.process_url(url).await {
                Ok(summary) => PageSummary::ok(url, summary),
                Err(e) => {
                    tracing::warn!(target: "askweb.pipeline", url = %url, error = ?e, "page.error");
                    PageSummary::error(url, format!("Error processing {url}: {e}"))
                }
            };
            summaries.push(entry);
        }

        tracing::info!(
            target: "askweb.pipeline",
            state = "synthesizing",
            ok = summaries.iter().filter(|s| s.is_ok()).count(),
            failed = summaries.iter().filter(|s| !s.is_ok()).count(),
            model = self.summarizer.model_name(),
            "pipeline.transition"
        );
        let answer_text = self
            .summarizer
            .synthesize_final(query, &summaries)
            .await
            .map_err(|e| {
                tracing::error!(target: "askweb.pipeline", state = "failed", stage = %Stage::Synthesis, error = ?e, "pipeline.transition");
                PipelineError {
                    stage: Stage::Synthesis,
                    cause: e.to_string(),
                }
            })?;

        tracing::info!(
            target: "askweb.pipeline",
            state = "done",
            sources = urls.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "pipeline.transition"
        );
        Ok(PipelineReport {
            summaries,
            answer: FinalAnswer {
                answer_text,
                sources: urls,
            },
        })
    }

    async fn process_url(&self, url: &str) -> Result<String, PageError> {
        let raw = self.fetcher.fetch(url, self.settings.fetch_timeout).await?;
        let article = askweb_web::extract(&raw, self.settings.max_article_chars);
        tracing::debug!(
            target: "askweb.pipeline",
            url = %url,
            bytes = raw.len(),
            chars = article.chars().count(),
            "page.extracted"
        );
        self.summarizer
            .summarize_page(&article)
            .await
            .map_err(PageError::Summarize)
    }
}

#[async_trait]
impl AnswerService for Pipeline {
    async fn answer(&self, query: &Query) -> Result<FinalAnswer, PipelineError> {
        self.run(query).await.map(|report| report.answer)
    }
}
