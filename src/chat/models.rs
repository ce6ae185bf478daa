//! Chat data models

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Models a user can pick from. Anything else resolves to [`ChatModel::PRIMARY`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatModel {
    #[serde(rename = "gpt-4o")]
    Gpt4o,
    #[serde(rename = "claude-3")]
    Claude3,
    #[serde(rename = "gemini")]
    Gemini,
}

impl ChatModel {
    pub const PRIMARY: ChatModel = ChatModel::Gpt4o;

    /// Resolve a client-supplied model name; unknown names fall back to the primary model
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "gpt-4o" => ChatModel::Gpt4o,
            "claude-3" => ChatModel::Claude3,
            "gemini" => ChatModel::Gemini,
            _ => Self::PRIMARY,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChatModel::Gpt4o => "gpt-4o",
            ChatModel::Claude3 => "claude-3",
            ChatModel::Gemini => "gemini",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ChatModel::Gpt4o => "GPT-4o",
            ChatModel::Claude3 => "Claude 3",
            ChatModel::Gemini => "Gemini 1.5",
        }
    }
}

/// POST /api/chat body
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub model: String,
}

/// POST /api/chat success body
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub model: String,
    pub tokens: i64,
}

/// Today's counters for one user; a missing row reads as zero
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromRow)]
pub struct UsageCounter {
    pub chat_count: i64,
    pub token_count: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UsageSummary {
    pub date: String,
    pub chat_count: i64,
    pub token_count: i64,
    pub daily_limit: i64,
    pub remaining: i64,
}

#[derive(FromRow, Serialize, Deserialize, Debug, Clone)]
pub struct ChatSession {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub model: String,
    pub created_at: Option<String>,
}

#[derive(FromRow, Serialize, Deserialize, Debug, Clone)]
pub struct ChatMessage {
    pub id: String,
    pub session_id: String,
    pub role: String,
    pub content: String,
    pub model: String,
    pub tokens_used: Option<i64>,
    pub position: i64,
    pub created_at: Option<String>,
}

/// One finished turn, ready to be written as a session plus two messages
#[derive(Debug, Clone)]
pub struct CompletedTurn<'a> {
    pub user_id: &'a str,
    pub model: ChatModel,
    pub title: String,
    pub user_message: &'a str,
    pub reply: &'a str,
    pub tokens: i64,
}

#[derive(Debug, Deserialize)]
pub struct SessionListQuery {
    pub limit: Option<i64>,
}
