/// OpenAI-compatible chat completion provider
///
/// Calls `{api_url}/chat/completions` with a system/user message pair and
/// returns the first choice's message content verbatim. Any parsing of that
/// content happens in recovery.
use std::time::Duration;

use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{
    config::Config,
    error::{AppError, AppResult},
    models::CompletionPrompt,
    services::providers::CompletionProvider,
};

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

#[derive(Clone)]
pub struct OpenAiProvider {
    http_client: HttpClient,
    api_key: Option<String>,
    api_url: String,
    model: String,
    temperature: f32,
}

impl OpenAiProvider {
    pub fn new(config: &Config) -> AppResult<Self> {
        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            http_client,
            api_key: config.api_key().map(str::to_string),
            api_url: config.openai_api_url.trim_end_matches('/').to_string(),
            model: config.openai_model.clone(),
            temperature: config.temperature,
        })
    }

    /// Pulls the human-readable message out of an error body, if it has one
    fn error_message(body: &str) -> String {
        serde_json::from_str::<ApiErrorResponse>(body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| body.chars().take(300).collect())
    }
}

#[async_trait::async_trait]
impl CompletionProvider for OpenAiProvider {
    #[instrument(skip_all, fields(model = %self.model, max_tokens = prompt.max_tokens))]
    async fn complete(&self, prompt: &CompletionPrompt) -> AppResult<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::Config("API key not configured".to_string()))?;

        let request = ChatCompletionRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            temperature: self.temperature,
            max_tokens: prompt.max_tokens,
        };

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.api_url))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                status = %status,
                upstream_message = %Self::error_message(&body),
                "Completion API returned an error"
            );
            return Err(AppError::ExternalApi(format!(
                "Completion API returned status {}",
                status.as_u16()
            )));
        }

        let completion: ChatCompletionResponse = response.json().await?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| {
                AppError::ExternalApi("Completion API returned no content".to_string())
            })?;

        tracing::debug!(chars = content.len(), "Completion received");

        Ok(content)
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{bearer_token, body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn prompt() -> CompletionPrompt {
        CompletionPrompt {
            system: "system text".to_string(),
            user: "user text".to_string(),
            max_tokens: 950,
        }
    }

    fn provider(api_url: String, api_key: Option<&str>) -> OpenAiProvider {
        let config = Config {
            openai_api_url: api_url,
            openai_api_key: api_key.map(str::to_string),
            temperature: 0.5,
            ..Config::default()
        };
        OpenAiProvider::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_complete_sends_messages_and_returns_content() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(bearer_token("sk-test"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-3.5-turbo",
                "temperature": 0.5,
                "max_tokens": 950,
                "messages": [
                    { "role": "system", "content": "system text" },
                    { "role": "user", "content": "user text" }
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "chatcmpl-1",
                "choices": [{
                    "index": 0,
                    "message": { "role": "assistant", "content": "{\"recommendations\":[]}" },
                    "finish_reason": "stop"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let content = provider(server.uri(), Some("sk-test"))
            .complete(&prompt())
            .await
            .unwrap();
        assert_eq!(content, "{\"recommendations\":[]}");
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_request() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let result = provider(server.uri(), None).complete(&prompt()).await;
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[tokio::test]
    async fn test_upstream_error_status() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": { "message": "Rate limit reached", "type": "requests" }
            })))
            .mount(&server)
            .await;

        let result = provider(server.uri(), Some("sk-test"))
            .complete(&prompt())
            .await;
        match result {
            Err(AppError::ExternalApi(msg)) => assert!(msg.contains("429")),
            other => panic!("expected upstream error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_choices_is_upstream_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "choices": [] })),
            )
            .mount(&server)
            .await;

        let result = provider(server.uri(), Some("sk-test"))
            .complete(&prompt())
            .await;
        assert!(matches!(result, Err(AppError::ExternalApi(_))));
    }

    #[test]
    fn test_error_message_extraction() {
        let body = r#"{"error":{"message":"Invalid key","type":"auth"}}"#;
        assert_eq!(OpenAiProvider::error_message(body), "Invalid key");
        assert_eq!(OpenAiProvider::error_message("plain"), "plain");
    }
}
