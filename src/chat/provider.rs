//! LLM provider seam and per-model dispatch

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use super::models::ChatModel;

/// Token cost charged for a placeholder reply
pub const PLACEHOLDER_TOKENS: i64 = 100;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("API key not configured")]
    NotConfigured,

    #[error("request timed out")]
    Timeout,

    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("upstream returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("no response from upstream")]
    EmptyResponse,
}

/// Reply text plus the total token usage reported for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    pub total_tokens: i64,
}

#[async_trait]
pub trait ChatProvider: Send + Sync {
    async fn complete(&self, message: &str) -> Result<Completion, ProviderError>;
}

/// Stand-in for models whose upstream integration does not exist yet.
/// The reply always quotes the user's message so it cannot pass for a real answer.
#[derive(Debug, Clone, Copy)]
pub struct PlaceholderProvider {
    model: ChatModel,
}

impl PlaceholderProvider {
    pub fn new(model: ChatModel) -> Self {
        Self { model }
    }
}

#[async_trait]
impl ChatProvider for PlaceholderProvider {
    async fn complete(&self, message: &str) -> Result<Completion, ProviderError> {
        let name = self.model.display_name();
        let text = format!(
            "{} API integration is under development. Returning a test response:\n\n\
             Simulating a {} reply to your question \"{}\".",
            name, name, message
        );
        Ok(Completion {
            text,
            total_tokens: PLACEHOLDER_TOKENS,
        })
    }
}

/// Fixed mapping from [`ChatModel`] to the provider that serves it
#[derive(Clone)]
pub struct ProviderRegistry {
    primary: Arc<dyn ChatProvider>,
    claude: Arc<dyn ChatProvider>,
    gemini: Arc<dyn ChatProvider>,
}

impl ProviderRegistry {
    /// Primary model served by `primary`, the others by placeholders
    pub fn new(primary: Arc<dyn ChatProvider>) -> Self {
        Self {
            primary,
            claude: Arc::new(PlaceholderProvider::new(ChatModel::Claude3)),
            gemini: Arc::new(PlaceholderProvider::new(ChatModel::Gemini)),
        }
    }

    pub fn with_provider(mut self, model: ChatModel, provider: Arc<dyn ChatProvider>) -> Self {
        match model {
            ChatModel::Gpt4o => self.primary = provider,
            ChatModel::Claude3 => self.claude = provider,
            ChatModel::Gemini => self.gemini = provider,
        }
        self
    }

    pub fn provider_for(&self, model: ChatModel) -> &Arc<dyn ChatProvider> {
        match model {
            ChatModel::Gpt4o => &self.primary,
            ChatModel::Claude3 => &self.claude,
            ChatModel::Gemini => &self.gemini,
        }
    }
}
