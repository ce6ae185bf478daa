//! Authentication routes

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;

/// Creates and returns the authentication router
///
/// # Routes
/// - `GET /auth/google` - Redirect to Google's consent page
/// - `GET /auth/callback` - OAuth redirect target, starts a session
/// - `GET /logout` - Clear the session cookie and redirect home
/// - `POST /api/auth/logout` - Clear the session cookie (JSON)
/// - `GET /api/me` - Get current user information
pub fn auth_routes() -> Router {
    Router::new()
        .route("/auth/google", get(handlers::google_oauth_start))
        .route("/auth/callback", get(handlers::google_oauth_callback))
        .route("/logout", get(handlers::logout_redirect))
        .route("/api/auth/logout", post(handlers::logout_handler))
        .route("/api/me", get(handlers::me_handler))
}
