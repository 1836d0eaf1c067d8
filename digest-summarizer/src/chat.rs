//! Chat-completion summarization client

use async_trait::async_trait;
use tracing::{debug, instrument};

use digest_news::{RetryingHttpClient, UpstreamError};

use crate::backend::SummaryBackend;
use crate::types::{ChatMessage, ChatRequest, ChatResponse};

const SYSTEM_PROMPT: &str =
    "You are a professional news summarizer. Create a concise summary in 2-3 sentences.";

/// Connection settings for the chat-completion endpoint
#[derive(Debug, Clone)]
pub struct ChatCompletionConfig {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    /// Sent as `HTTP-Referer` to identify the caller
    pub referer: String,
    /// Sent as `X-Title` to identify the caller
    pub app_title: String,
}

impl ChatCompletionConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            endpoint: "https://openrouter.ai/api/v1/chat/completions".to_string(),
            api_key: api_key.into(),
            model: "openai/gpt-3.5-turbo".to_string(),
            referer: "https://aitak.news".to_string(),
            app_title: "AI Tak News".to_string(),
        }
    }
}

/// Chat-completion client producing article summaries
#[derive(Debug, Clone)]
pub struct ChatCompletionClient {
    http: RetryingHttpClient,
    config: ChatCompletionConfig,
}

impl ChatCompletionClient {
    pub fn new(config: ChatCompletionConfig, http: RetryingHttpClient) -> Self {
        Self { http, config }
    }
}

#[async_trait]
impl SummaryBackend for ChatCompletionClient {
    #[instrument(skip(self, text), fields(model = %self.config.model, chars = text.len()))]
    async fn summarize(&self, text: &str) -> Result<String, UpstreamError> {
        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage::system(SYSTEM_PROMPT),
                ChatMessage::user(format!("Please summarize: {}", text)),
            ],
        };

        let request = self
            .http
            .client()
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .header("HTTP-Referer", &self.config.referer)
            .header("X-Title", &self.config.app_title)
            .json(&body)
            .build()
            .map_err(|e| UpstreamError::Config(format!("invalid completion request: {}", e)))?;

        let completion: ChatResponse = self.http.execute_json(request).await?;

        let summary = completion
            .first_content()
            .map(str::trim)
            .filter(|summary| !summary.is_empty())
            .ok_or_else(|| UpstreamError::MalformedResponse("completion has no summary".to_string()))?;

        debug!("Generated summary of {} chars", summary.len());
        Ok(summary.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use digest_news::{FailureKind, RetryPolicy};
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(server: &MockServer) -> ChatCompletionClient {
        let http = RetryingHttpClient::new(
            "summarizer",
            RetryPolicy::single_attempt(),
            Duration::from_secs(5),
        );
        let config = ChatCompletionConfig {
            endpoint: format!("{}/chat/completions", server.uri()),
            ..ChatCompletionConfig::new("test-key")
        };
        ChatCompletionClient::new(config, http)
    }

    #[tokio::test]
    async fn test_summarize_sends_conversation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(header("x-title", "AI Tak News"))
            .and(header("http-referer", "https://aitak.news"))
            .and(body_partial_json(serde_json::json!({
                "model": "openai/gpt-3.5-turbo",
                "messages": [
                    {"role": "system", "content": SYSTEM_PROMPT},
                    {"role": "user", "content": "Please summarize: chips are fast"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": " Chips got faster. "}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let summary = test_client(&server)
            .summarize("chips are fast")
            .await
            .expect("summary should be generated");

        assert_eq!(summary, "Chips got faster.");
    }

    #[tokio::test]
    async fn test_empty_choices_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})),
            )
            .mount(&server)
            .await;

        let error = test_client(&server).summarize("text").await.unwrap_err();
        assert_eq!(error.kind(), FailureKind::MalformedResponse);
    }

    #[tokio::test]
    async fn test_non_json_body_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let error = test_client(&server).summarize("text").await.unwrap_err();
        assert_eq!(error.kind(), FailureKind::MalformedResponse);
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .expect(1)
            .mount(&server)
            .await;

        let error = test_client(&server).summarize("text").await.unwrap_err();
        assert_eq!(error.kind(), FailureKind::UpstreamStatus);
    }
}
