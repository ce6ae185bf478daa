//! Authentication handlers

use axum::{
    extract::{Extension, Json, Query},
    http::{header::SET_COOKIE, HeaderMap},
    response::{AppendHeaders, IntoResponse, Redirect},
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use super::extractors::AuthedUser;
use super::identity::IdentityError;
use super::models::OAuthCallbackParams;
use super::session::{
    expired_cookie, issue_token, oauth_state_cookie, read_cookie, session_cookie,
    OAUTH_STATE_COOKIE, SESSION_COOKIE,
};
use crate::common::{generate_raw_id, safe_email_log, ApiError, AppState};

const OAUTH_STATE_LENGTH: usize = 24;

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::NotConfigured => {
                ApiError::InternalServer("Google sign-in is not configured".to_string())
            }
            other => ApiError::InternalServer(format!("Google sign-in failed: {}", other)),
        }
    }
}

/// GET /auth/google - Start Google OAuth flow
/// Stores a random state in a short-lived cookie and redirects to the consent page
pub async fn google_oauth_start(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
) -> Result<impl IntoResponse, ApiError> {
    let (identity, secure) = {
        let state = state_lock.read().await;
        (state.identity.clone(), state.config.secure_cookies())
    };

    let oauth_state = generate_raw_id(OAUTH_STATE_LENGTH);
    let auth_url = identity.authorization_url(&oauth_state).map_err(|e| {
        error!(error = %e, "Failed to generate Google OAuth URL");
        ApiError::from(e)
    })?;

    debug!("Redirecting to Google OAuth consent page");
    Ok((
        AppendHeaders([(SET_COOKIE, oauth_state_cookie(&oauth_state, secure))]),
        Redirect::temporary(&auth_url),
    ))
}

/// GET /auth/callback - Handle OAuth callback from Google
/// Verifies state, exchanges the code, upserts the user and starts a session
pub async fn google_oauth_callback(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    headers: HeaderMap,
    Query(params): Query<OAuthCallbackParams>,
) -> Result<impl IntoResponse, ApiError> {
    let state = state_lock.read().await.clone();

    if let Some(oauth_error) = params.error.as_deref() {
        warn!(oauth_error = %oauth_error, "Google OAuth returned error");
        return Err(ApiError::BadRequest(format!(
            "Authorization failed: {}",
            oauth_error
        )));
    }

    let expected_state = read_cookie(&headers, OAUTH_STATE_COOKIE);
    match (params.state.as_deref(), expected_state.as_deref()) {
        (Some(got), Some(expected)) if got == expected => {}
        (got, _) => {
            warn!(state = ?got, "Invalid OAuth state");
            return Err(ApiError::BadRequest("Invalid state".to_string()));
        }
    }

    let code = params.code.as_deref().filter(|c| !c.is_empty()).ok_or_else(|| {
        warn!("No authorization code in OAuth callback");
        ApiError::BadRequest("No authorization code provided".to_string())
    })?;

    let identity = state.identity.verify_code(code).await.map_err(|e| {
        error!(error = %e, "Failed to verify Google authorization code");
        ApiError::from(e)
    })?;

    let user = state.store.upsert_user(&identity).await?;

    let token = issue_token(
        &user.id,
        &state.config.session_secret,
        state.config.session_ttl_hours,
    )
    .map_err(|e| {
        error!(error = %e, user_id = %user.id, "JWT encoding error during login");
        ApiError::InternalServer("jwt error".to_string())
    })?;

    info!(
        user_id = %user.id,
        email = %safe_email_log(&user.email),
        "User logged in via Google OAuth"
    );

    let secure = state.config.secure_cookies();
    Ok((
        AppendHeaders([
            (
                SET_COOKIE,
                session_cookie(&token, state.config.session_ttl_hours, secure),
            ),
            (SET_COOKIE, expired_cookie(OAUTH_STATE_COOKIE, secure)),
        ]),
        Redirect::temporary(&format!("{}/chat", state.config.frontend_url)),
    ))
}

/// GET /logout - Clear the session cookie and go back to the landing page
pub async fn logout_redirect(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
) -> impl IntoResponse {
    let state = state_lock.read().await;
    (
        AppendHeaders([(
            SET_COOKIE,
            expired_cookie(SESSION_COOKIE, state.config.secure_cookies()),
        )]),
        Redirect::temporary(&format!("{}/", state.config.frontend_url)),
    )
}

/// POST /api/auth/logout
/// Clears the session cookie for API clients
///
/// # Response
/// ```json
/// { "message": "Logout successful" }
/// ```
pub async fn logout_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> impl IntoResponse {
    let secure = state_lock.read().await.config.secure_cookies();
    info!(user_id = %authed.id, "User logout successful");
    (
        AppendHeaders([(SET_COOKIE, expired_cookie(SESSION_COOKIE, secure))]),
        Json(serde_json::json!({ "message": "Logout successful" })),
    )
}

/// GET /api/me
/// Returns the current authenticated user's profile and plan
pub async fn me_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let store = state_lock.read().await.store.clone();

    let user = store
        .find_user(&authed.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("user not found".to_string()))?;

    Ok(Json(serde_json::json!({
        "plan": user.plan,
        "user": user,
    })))
}
