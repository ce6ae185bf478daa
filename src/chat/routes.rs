//! Chat routes

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;

/// Creates and returns the chat router
///
/// # Routes
/// - `POST /api/chat` - Run one chat turn against the daily quota
/// - `GET /api/usage` - Today's usage counters
/// - `GET /api/sessions` - Recent chat sessions
/// - `GET /api/sessions/:id/messages` - Messages of one session
pub fn chat_routes() -> Router {
    Router::new()
        .route("/api/chat", post(handlers::chat_handler))
        .route("/api/usage", get(handlers::usage_handler))
        .route("/api/sessions", get(handlers::list_sessions))
        .route("/api/sessions/:id/messages", get(handlers::session_messages))
}
