//! Question answering over web search results.
//!
//! - [`model`]: queries, per-page outcomes, final answers and errors
//! - [`summarize`]: prompts sent to the language model
//! - [`pipeline`]: the sequential search → summarize → synthesize run

pub mod model;
pub mod pipeline;
pub mod summarize;

pub use model::{
    FinalAnswer, PageStatus, PageSummary, PipelineError, PipelineReport, Query, QueryError, Stage,
};
pub use pipeline::{AnswerService, PageError, Pipeline, PipelineSettings};
pub use summarize::{INSUFFICIENT_INFO, Summarizer, SummarizerSettings};
