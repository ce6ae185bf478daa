//! Chat handlers

use axum::{
    extract::{rejection::JsonRejection, Extension, Path, Query},
    Json,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;

use super::models::{
    ChatMessage, ChatRequest, ChatResponse, ChatSession, SessionListQuery, UsageSummary,
};
use super::service::usage_date;
use super::validators::ChatRequestValidator;
use crate::auth::AuthedUser;
use crate::common::{ApiError, AppState, Validator};

const DEFAULT_SESSION_PAGE: i64 = 20;
const MAX_SESSION_PAGE: i64 = 100;

/// POST /api/chat
/// Runs one quota-guarded chat turn
///
/// # Request Body
/// ```json
/// { "message": "Draft an agenda", "model": "gpt-4o" }
/// ```
///
/// # Response
/// ```json
/// { "response": "...", "model": "gpt-4o", "tokens": 123 }
/// ```
pub async fn chat_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| {
        warn!(error = %e, user_id = %authed.id, "Invalid chat request body");
        ApiError::BadRequest("Invalid JSON".to_string())
    })?;

    ChatRequestValidator
        .validate(&request)
        .into_result()
        .map_err(ApiError::from)?;

    let service = state_lock.read().await.chat_service.clone();
    let reply = service
        .handle(&authed.id, &request.message, &request.model)
        .await?;

    Ok(Json(ChatResponse {
        response: reply.response,
        model: reply.model.as_str().to_string(),
        tokens: reply.tokens,
    }))
}

/// GET /api/usage
/// Today's chat and token counters for the caller
pub async fn usage_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Json<UsageSummary>, ApiError> {
    let (store, daily_limit) = {
        let state = state_lock.read().await;
        (state.store.clone(), state.chat_service.daily_limit())
    };

    let today = usage_date();
    let usage = store.usage_for(&authed.id, today).await?;

    Ok(Json(UsageSummary {
        date: today.format("%Y-%m-%d").to_string(),
        chat_count: usage.chat_count,
        token_count: usage.token_count,
        daily_limit,
        remaining: (daily_limit - usage.chat_count).max(0),
    }))
}

/// GET /api/sessions?limit=20
pub async fn list_sessions(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Query(query): Query<SessionListQuery>,
) -> Result<Json<Vec<ChatSession>>, ApiError> {
    let store = state_lock.read().await.store.clone();
    let limit = query
        .limit
        .unwrap_or(DEFAULT_SESSION_PAGE)
        .clamp(1, MAX_SESSION_PAGE);

    let sessions = store.list_sessions(&authed.id, limit).await?;
    Ok(Json(sessions))
}

/// GET /api/sessions/:id/messages
pub async fn session_messages(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(session_id): Path<String>,
) -> Result<Json<Vec<ChatMessage>>, ApiError> {
    let store = state_lock.read().await.store.clone();

    store
        .session_messages(&authed.id, &session_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("session not found".to_string()))
}
