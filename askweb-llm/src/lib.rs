//! Provider‑agnostic LLM integration for askweb.
//!
//! This crate exposes a common [`traits::LlmClient`] interface and concrete
//! provider implementations for Groq (OpenAI-compatible chat completions) and
//! the OpenAI Responses API, plus [`connect`] to build a shared client from
//! [`LlmSettings`].
//!
//! # Examples
//! ```no_run
//! use askweb_llm::{connect, LlmProvider, LlmSettings};
//!
//! let settings = LlmSettings {
//!     provider: LlmProvider::Groq,
//!     model: askweb_llm::DEFAULT_GROQ_MODEL.to_string(),
//!     api_key: "gsk_...".to_string(),
//!     endpoint: None,
//! };
//! let client = connect(&settings)?;
//! assert_eq!(client.model_name(), "mixtral-8x7b-32768");
//! # Ok::<(), askweb_common::AskwebError>(())
//! ```
pub mod groq;
pub mod openai;
pub mod traits;

use askweb_common::{AskwebError, Result};
use groq::GroqClient;
use openai::OpenAiClient;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use traits::LlmClient;

pub const DEFAULT_GROQ_MODEL: &str = "mixtral-8x7b-32768";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    Groq,
    OpenAi,
}

impl LlmProvider {
    pub fn default_model(self) -> &'static str {
        match self {
            LlmProvider::Groq => DEFAULT_GROQ_MODEL,
            LlmProvider::OpenAi => DEFAULT_OPENAI_MODEL,
        }
    }
}

/// Everything needed to reach a hosted model. Built once at startup.
#[derive(Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    pub provider: LlmProvider,
    pub model: String,
    pub api_key: String,
    pub endpoint: Option<String>,
}

impl std::fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmSettings")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

/// Build the shared client for the configured provider.
pub fn connect(settings: &LlmSettings) -> Result<Arc<dyn LlmClient + Send + Sync + 'static>> {
    if settings.api_key.trim().is_empty() {
        return Err(AskwebError::Config("LLM api key is empty".to_string()));
    }
    let endpoint = settings.endpoint.as_deref();
    tracing::info!(
        provider = ?settings.provider,
        model = %settings.model,
        custom_endpoint = endpoint.is_some(),
        "llm.connect"
    );
    match settings.provider {
        LlmProvider::Groq => Ok(Arc::new(GroqClient::new(
            settings.api_key.clone(),
            settings.model.clone(),
            endpoint,
        )?)),
        LlmProvider::OpenAi => Ok(Arc::new(OpenAiClient::new(
            settings.api_key.clone(),
            settings.model.clone(),
            endpoint,
        )?)),
    }
}
