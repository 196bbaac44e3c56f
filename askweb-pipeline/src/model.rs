//! Values flowing through one question-answering run.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("query is empty")]
    Empty,
}

/// A non-blank user question, trimmed on construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Query(String);

impl Query {
    /// ```
    /// use askweb_pipeline::{Query, QueryError};
    ///
    /// assert_eq!(Query::new("  capital of France? ").unwrap().as_str(), "capital of France?");
    /// assert_eq!(Query::new(" \n\t"), Err(QueryError::Empty));
    /// ```
    pub fn new(text: impl Into<String>) -> Result<Self, QueryError> {
        let text = text.into();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(QueryError::Empty);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Query {
    type Error = QueryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Query> for String {
    fn from(q: Query) -> Self {
        q.0
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "lowercase")]
pub enum PageStatus {
    Ok,
    Error(String),
}

/// Outcome for one URL. Error entries carry the message as their summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSummary {
    pub url: String,
    pub summary: String,
    pub status: PageStatus,
}

impl PageSummary {
    pub fn ok(url: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            summary: summary.into(),
            status: PageStatus::Ok,
        }
    }

    pub fn error(url: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            url: url.into(),
            summary: message.clone(),
            status: PageStatus::Error(message),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self.status, PageStatus::Ok)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalAnswer {
    pub answer_text: String,
    pub sources: Vec<String>,
}

impl FinalAnswer {
    /// Numbered Markdown links, one per source, in search order.
    ///
    /// ```
    /// use askweb_pipeline::FinalAnswer;
    ///
    /// let answer = FinalAnswer {
    ///     answer_text: "- Paris.".into(),
    ///     sources: vec!["https://a.example".into(), "https://b.example".into()],
    /// };
    /// assert_eq!(
    ///     answer.source_lines(),
    ///     vec![
    ///         "1. [https://a.example](https://a.example)",
    ///         "2. [https://b.example](https://b.example)",
    ///     ]
    /// );
    /// ```
    pub fn source_lines(&self) -> Vec<String> {
        self.sources
            .iter()
            .enumerate()
            .map(|(i, url)| format!("{}. [{url}]({url})", i + 1))
            .collect()
    }

    pub fn to_markdown(&self) -> String {
        let mut out = self.answer_text.clone();
        if !self.sources.is_empty() {
            out.push_str("\n\n**Sources:**\n");
            out.push_str(&self.source_lines().join("\n"));
        }
        out
    }
}

/// Everything one run produced; `answer.sources` mirrors `summaries` order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineReport {
    pub summaries: Vec<PageSummary>,
    pub answer: FinalAnswer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Search,
    Synthesis,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Search => f.write_str("search"),
            Stage::Synthesis => f.write_str("synthesis"),
        }
    }
}

/// Fatal failure of a run. The visible text is always one line.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
#[error("Tool failed: {cause}")]
pub struct PipelineError {
    pub stage: Stage,
    pub cause: String,
}
