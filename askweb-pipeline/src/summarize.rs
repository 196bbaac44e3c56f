//! Prompt construction for per-page summaries and the final synthesis.

use crate::model::{PageSummary, Query};
use askweb_common::{Result, snippet};
use askweb_llm::traits::LlmClient;
use std::sync::Arc;

pub const INSUFFICIENT_INFO: &str =
    "Insufficient Info. Please refer to the provided sources for more information.";

const PAGE_PROMPT_PREFIX: &str = "Summarize the following article content:\n\n";

/// Sampling options applied to every model call.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SummarizerSettings {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

#[derive(Clone)]
pub struct Summarizer {
    llm: Arc<dyn LlmClient + Send + Sync>,
    settings: SummarizerSettings,
}

impl Summarizer {
    pub fn new(llm: Arc<dyn LlmClient + Send + Sync>, settings: SummarizerSettings) -> Self {
        Self { llm, settings }
    }

    pub fn model_name(&self) -> &str {
        self.llm.model_name()
    }

    /// Condense one article. Empty text is still sent.
    pub async fn summarize_page(&self, article: &str) -> Result<String> {
        let prompt = page_prompt(article);
        tracing::debug!(
            target: "askweb.summarize",
            chars = article.chars().count(),
            preview = %snippet(article, 80),
            "summarize.page.start"
        );
        let resp = self
            .llm
            .generate(&prompt, None, self.settings.max_tokens, self.settings.temperature)
            .await?;
        Ok(resp.text.trim().to_string())
    }

    /// Answer `query` from the collected summaries, error entries included.
    pub async fn synthesize_final(&self, query: &Query, summaries: &[PageSummary]) -> Result<String> {
        let combined = combine_summaries(summaries);
        let prompt = synthesis_prompt(query, &combined);
        tracing::debug!(
            target: "askweb.summarize",
            sources = summaries.len(),
            combined_chars = combined.chars().count(),
            "summarize.final.start"
        );
        let resp = self
            .llm
            .generate(&prompt, None, self.settings.max_tokens, self.settings.temperature)
            .await?;
        Ok(resp.text.trim().to_string())
    }
}

pub(crate) fn page_prompt(article: &str) -> String {
    format!("{PAGE_PROMPT_PREFIX}{article}")
}

pub(crate) fn combine_summaries(summaries: &[PageSummary]) -> String {
    summaries
        .iter()
        .map(|s| format!("Source: {}\n{}", s.url, s.summary))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub(crate) fn synthesis_prompt(query: &Query, combined: &str) -> String {
    format!(
        "Based on the following summaries from several web pages, answer the question below.\n\
         Extract only the key points that are relevant to the question and format them as bullet points.\n\
         If the summaries do not contain enough information to answer, reply exactly with: \
         \"{INSUFFICIENT_INFO}\"\n\n\
         Question: {query}\n\n\
         Summaries:\n{combined}\n\n\
         Answer:"
    )
}
