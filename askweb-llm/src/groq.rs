//! Groq client speaking the OpenAI-compatible `chat/completions` protocol.
//!
//! Any endpoint implementing the same protocol works by overriding the base URL.

use crate::traits::{http_to_askweb, LlmClient, LlmResponse};
use askweb_common::{AskwebError, Result};
use askweb_http::HttpClient;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub const GROQ_API_BASE: &str = "https://api.groq.com/openai/v1/";

pub struct GroqClient {
    client: HttpClient,
    api_key: String,
    model: String,
}

#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
pub struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    pub id: String,
    pub model: String,
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
    #[serde(default)]
    pub usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChoiceMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChatUsage {
    pub total_tokens: u32,
}

impl GroqClient {
    pub fn new(api_key: String, model: String, base_url: Option<&str>) -> Result<Self> {
        let client = HttpClient::new(base_url.unwrap_or(GROQ_API_BASE))
            .map_err(|e| AskwebError::Config(format!("HttpClient init failed: {e}")))?;
        Ok(Self {
            client,
            api_key,
            model,
        })
    }
}

#[async_trait]
impl LlmClient for GroqClient {
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> Result<LlmResponse> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system_prompt {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });

        let req = ChatCompletionRequest {
            model: &self.model,
            messages,
            max_tokens,
            temperature,
        };

        let resp: ChatCompletionResponse = self
            .client
            .post_json("chat/completions", Some(&self.api_key), &req)
            .await
            .map_err(http_to_askweb)?;

        let choice = resp
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AskwebError::Provider("completion returned no choices".into()))?;

        tracing::debug!(
            id = %resp.id,
            finish_reason = ?choice.finish_reason,
            "groq.chat_completion.done"
        );

        Ok(LlmResponse {
            text: choice.message.content.unwrap_or_default(),
            model: Some(resp.model),
            tokens_used: resp.usage.map(|u| u.total_tokens),
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn completion(text: &str) -> serde_json::Value {
        serde_json::json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "model": "mixtral-8x7b-32768",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": text},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 10, "completion_tokens": 4, "total_tokens": 14}
        })
    }

    #[tokio::test]
    async fn sends_system_and_user_messages() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/openai/v1/chat/completions"))
            .and(header("authorization", "Bearer gsk_test"))
            .and(body_partial_json(serde_json::json!({
                "model": "mixtral-8x7b-32768",
                "messages": [
                    {"role": "system", "content": "be brief"},
                    {"role": "user", "content": "capital of France?"}
                ],
                "temperature": 0.2
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("Paris.")))
            .expect(1)
            .mount(&server)
            .await;

        let client = GroqClient::new(
            "gsk_test".into(),
            "mixtral-8x7b-32768".into(),
            Some(&format!("{}/openai/v1/", server.uri())),
        )
        .unwrap();
        let resp = client
            .generate("capital of France?", Some("be brief"), None, Some(0.2))
            .await
            .unwrap();
        assert_eq!(resp.text, "Paris.");
        assert_eq!(resp.tokens_used, Some(14));
        assert_eq!(resp.model.as_deref(), Some("mixtral-8x7b-32768"));
    }

    #[tokio::test]
    async fn api_errors_surface_provider_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": {"message": "Invalid API Key", "type": "invalid_request_error"}
            })))
            .mount(&server)
            .await;

        let client =
            GroqClient::new("gsk_bad".into(), "m".into(), Some(&format!("{}/", server.uri())))
                .unwrap();
        let err = client.generate("hi", None, None, None).await.unwrap_err();
        assert!(err.to_string().contains("Invalid API Key"), "got {err}");
        assert!(!client.health_check().await.unwrap());
    }

    #[tokio::test]
    async fn empty_choices_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "chatcmpl-2",
                "model": "m",
                "choices": []
            })))
            .mount(&server)
            .await;

        let client =
            GroqClient::new("gsk".into(), "m".into(), Some(&format!("{}/", server.uri()))).unwrap();
        assert!(client.generate("hi", None, None, None).await.is_err());
    }
}
