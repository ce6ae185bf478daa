//! Quota-guarded chat turn
//!
//! One call to [`QuotaGuardedChatService::handle`] runs a whole turn:
//! quota check, provider dispatch, usage recording and history persistence.
//! Quota is consumed only when the provider produced a usable reply.

use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

use super::models::{ChatModel, CompletedTurn};
use super::provider::{ProviderError, ProviderRegistry};
use super::store::ChatStore;
use crate::common::helpers::truncate_with_ellipsis;
use crate::common::ApiError;

/// Maximum session title length, ellipsis included
pub const TITLE_MAX_CHARS: usize = 50;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Daily usage limit reached. Today's limit: {limit} chats")]
    QuotaExceeded { limit: i64 },

    #[error("AI provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Database error: {0}")]
    Store(#[from] sqlx::Error),
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::QuotaExceeded { .. } => ApiError::QuotaExceeded(err.to_string()),
            ChatError::Provider(_) => ApiError::ProviderError(err.to_string()),
            ChatError::Store(e) => ApiError::DatabaseError(e),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub response: String,
    pub model: ChatModel,
    pub tokens: i64,
}

/// Calendar day that usage is counted against (UTC)
pub fn usage_date() -> NaiveDate {
    Utc::now().date_naive()
}

pub fn session_title(message: &str) -> String {
    truncate_with_ellipsis(message, TITLE_MAX_CHARS)
}

pub struct QuotaGuardedChatService {
    store: Arc<dyn ChatStore>,
    providers: ProviderRegistry,
    daily_limit: i64,
}

impl QuotaGuardedChatService {
    pub fn new(store: Arc<dyn ChatStore>, providers: ProviderRegistry, daily_limit: i64) -> Self {
        Self {
            store,
            providers,
            daily_limit,
        }
    }

    pub fn daily_limit(&self) -> i64 {
        self.daily_limit
    }

    /// Run one chat turn for an authenticated user.
    ///
    /// `model_name` is resolved with [`ChatModel::parse`]; unknown names use the primary model.
    pub async fn handle(
        &self,
        user_id: &str,
        message: &str,
        model_name: &str,
    ) -> Result<ChatReply, ChatError> {
        let model = ChatModel::parse(model_name);
        let today = usage_date();

        let usage = self.store.usage_for(user_id, today).await?;
        if usage.chat_count >= self.daily_limit {
            info!(
                user_id = %user_id,
                chat_count = usage.chat_count,
                daily_limit = self.daily_limit,
                "Daily chat quota exhausted"
            );
            return Err(ChatError::QuotaExceeded {
                limit: self.daily_limit,
            });
        }

        let completion = self
            .providers
            .provider_for(model)
            .complete(message)
            .await
            .map_err(|e| {
                warn!(user_id = %user_id, model = %model.as_str(), error = %e, "Provider call failed");
                e
            })?;

        let recorded = match self
            .store
            .record_usage(user_id, today, completion.total_tokens, self.daily_limit)
            .await
        {
            Ok(recorded) => recorded,
            Err(e) => {
                // The provider already answered; keep the reply even though it went uncounted
                error!(
                    user_id = %user_id,
                    tokens = completion.total_tokens,
                    error = %e,
                    "Failed to record usage, reply still returned"
                );
                true
            }
        };
        if !recorded {
            // Another turn took the last slot while this one was waiting on the provider
            warn!(
                user_id = %user_id,
                daily_limit = self.daily_limit,
                "Quota filled by a concurrent turn, discarding reply"
            );
            return Err(ChatError::QuotaExceeded {
                limit: self.daily_limit,
            });
        }

        let turn = CompletedTurn {
            user_id,
            model,
            title: session_title(message),
            user_message: message,
            reply: &completion.text,
            tokens: completion.total_tokens,
        };
        match self.store.save_history(&turn).await {
            Ok(session_id) => info!(
                user_id = %user_id,
                session_id = %session_id,
                model = %model.as_str(),
                tokens = completion.total_tokens,
                "Chat turn completed"
            ),
            Err(e) => error!(
                user_id = %user_id,
                error = %e,
                "Failed to save chat history, reply still returned"
            ),
        }

        Ok(ChatReply {
            response: completion.text,
            model,
            tokens: completion.total_tokens,
        })
    }
}
