// src/services/openai.rs
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::chat::provider::{ChatProvider, Completion, ProviderError};
use crate::common::config::OpenAIConfig;

const TEMPERATURE: f32 = 0.7;
const MAX_TOKENS: u32 = 2000;

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    total_tokens: i64,
}

/// Chat Completions client for the primary model
#[derive(Debug)]
pub struct OpenAIService {
    config: OpenAIConfig,
    client: Client,
}

impl OpenAIService {
    pub fn new(config: OpenAIConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;

        Ok(Self { config, client })
    }

    pub fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    fn completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.config.base_url)
    }
}

#[async_trait]
impl ChatProvider for OpenAIService {
    async fn complete(&self, message: &str) -> Result<Completion, ProviderError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(ProviderError::NotConfigured)?;

        let request = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: message.to_string(),
            }],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        debug!(model = %self.config.model, "Sending OpenAI chat completion request");

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    error!(timeout_secs = self.config.timeout.as_secs(), "OpenAI request timed out");
                    ProviderError::Timeout
                } else {
                    error!(error = %e, "OpenAI request failed");
                    ProviderError::RequestFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!(status = %status, error = %body, "OpenAI API error");
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed = response
            .json::<ChatCompletionResponse>()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or(ProviderError::EmptyResponse)?;

        let total_tokens = parsed.usage.map(|u| u.total_tokens).unwrap_or(0);

        info!(
            model = %self.config.model,
            tokens_used = total_tokens,
            "OpenAI chat completion succeeded"
        );

        Ok(Completion { text, total_tokens })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> OpenAIConfig {
        OpenAIConfig {
            api_key: Some("sk-test".to_string()),
            base_url: server.uri(),
            model: "gpt-4o".to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn test_complete_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "chatcmpl-1",
                "choices": [{ "message": { "role": "assistant", "content": "Here is your agenda" } }],
                "usage": { "prompt_tokens": 12, "completion_tokens": 30, "total_tokens": 42 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let service = OpenAIService::new(config_for(&server)).unwrap();
        let completion = service.complete("Draft an agenda").await.unwrap();

        assert_eq!(completion.text, "Here is your agenda");
        assert_eq!(completion.total_tokens, 42);

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "Draft an agenda");
        assert_eq!(body["max_tokens"], 2000);
    }

    #[tokio::test]
    async fn test_missing_usage_counts_zero_tokens() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{ "message": { "role": "assistant", "content": "ok" } }]
            })))
            .mount(&server)
            .await;

        let service = OpenAIService::new(config_for(&server)).unwrap();
        let completion = service.complete("hi").await.unwrap();
        assert_eq!(completion.total_tokens, 0);
    }

    #[tokio::test]
    async fn test_upstream_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let service = OpenAIService::new(config_for(&server)).unwrap();
        let err = service.complete("hi").await.unwrap_err();
        match err {
            ProviderError::Status { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let service = OpenAIService::new(config_for(&server)).unwrap();
        let err = service.complete("hi").await.unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_empty_choices() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "choices": [] })),
            )
            .mount(&server)
            .await;

        let service = OpenAIService::new(config_for(&server)).unwrap();
        let err = service.complete("hi").await.unwrap_err();
        assert!(matches!(err, ProviderError::EmptyResponse));
    }

    #[tokio::test]
    async fn test_missing_api_key() {
        let server = MockServer::start().await;
        let config = OpenAIConfig {
            api_key: None,
            ..config_for(&server)
        };

        let service = OpenAIService::new(config).unwrap();
        assert!(!service.is_configured());
        let err = service.complete("hi").await.unwrap_err();
        assert!(matches!(err, ProviderError::NotConfigured));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "choices": [] }))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let config = OpenAIConfig {
            timeout: Duration::from_millis(200),
            ..config_for(&server)
        };
        let service = OpenAIService::new(config).unwrap();
        let err = service.complete("hi").await.unwrap_err();
        assert!(matches!(err, ProviderError::Timeout));
    }
}
