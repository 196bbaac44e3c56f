use anyhow::{Context, Result};
use askweb_config::{AskwebConfig, SearchProvider};
use askweb_llm::traits::LlmClient;
use askweb_pipeline::{Pipeline, PipelineSettings, Summarizer, SummarizerSettings};
use askweb_web::{BraveSearcher, DuckDuckGoSearcher, HttpFetcher, Searcher};
use std::sync::Arc;

pub fn build_llm_client(cfg: &AskwebConfig) -> Result<Arc<dyn LlmClient + Send + Sync>> {
    askweb_llm::connect(&cfg.llm).context("building language model client")
}

pub fn build_searcher(cfg: &AskwebConfig) -> Result<Arc<dyn Searcher>> {
    match cfg.search.provider {
        SearchProvider::Brave => {
            let token = cfg
                .search
                .api_key
                .clone()
                .context("brave search requires search.api_key")?;
            Ok(Arc::new(BraveSearcher::new(token)?))
        }
        SearchProvider::Duckduckgo => Ok(Arc::new(DuckDuckGoSearcher::new()?)),
    }
}

pub fn pipeline_settings(cfg: &AskwebConfig) -> PipelineSettings {
    PipelineSettings {
        max_results: cfg.search.max_results,
        fetch_timeout: cfg.fetch.timeout,
        max_article_chars: cfg.fetch.max_article_chars,
    }
}

/// Assemble the pipeline once; it is reused for every question.
pub fn build_pipeline(cfg: &AskwebConfig) -> Result<Pipeline> {
    let llm = build_llm_client(cfg)?;
    let summarizer = Summarizer::new(
        llm,
        SummarizerSettings {
            temperature: cfg.tuning.temperature,
            max_tokens: cfg.tuning.max_tokens,
        },
    );
    let searcher = build_searcher(cfg)?;
    let fetcher = Arc::new(HttpFetcher::new()?);
    tracing::info!(
        searcher = searcher.name(),
        model = summarizer.model_name(),
        "pipeline.ready"
    );
    Ok(Pipeline::new(
        searcher,
        fetcher,
        summarizer,
        pipeline_settings(cfg),
    ))
}
