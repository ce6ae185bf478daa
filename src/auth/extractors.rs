//! Authentication extractors for Axum

use async_trait::async_trait;
use axum::{
    extract::{Extension, FromRequestParts},
    http::request::Parts,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, warn};

use super::session::{decode_token, extract_token};
use crate::common::{safe_email_log, ApiError, AppState};

/// Authenticated user extractor
///
/// Accepts the session JWT from either the `Authorization` header or the
/// `session` cookie and confirms the user still exists.
#[derive(Debug)]
pub struct AuthedUser {
    pub id: String,
    pub email: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Extension(state_lock): Extension<Arc<RwLock<AppState>>> =
            Extension::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::InternalServer("missing app state".to_string()))?;

        let (store, secret, dev_user) = {
            let app_state = state_lock.read().await;
            (
                app_state.store.clone(),
                app_state.config.session_secret.clone(),
                app_state.dev_user.clone(),
            )
        };

        // DEV MODE: act as the seeded dev user
        if let Some(dev_user) = dev_user {
            debug!(
                user_id = %dev_user.id,
                email = %safe_email_log(&dev_user.email),
                "DEV MODE: Authentication bypassed"
            );
            return Ok(AuthedUser {
                id: dev_user.id,
                email: dev_user.email,
            });
        }

        let token = match extract_token(&parts.headers) {
            Some(t) => t,
            None => {
                debug!("Authentication failed: no session token");
                return Err(ApiError::Unauthorized("missing auth".into()));
            }
        };

        let claims = decode_token(&token, &secret).map_err(|e| {
            warn!(error = %e, "JWT token validation failed");
            ApiError::Unauthorized("invalid token".into())
        })?;

        let user = store.find_user(&claims.sub).await.map_err(|e| {
            error!(
                error = %e,
                user_id = %claims.sub,
                "Database error during user lookup in authentication"
            );
            ApiError::DatabaseError(e)
        })?;

        match user {
            Some(u) => Ok(AuthedUser {
                id: u.id,
                email: u.email,
            }),
            None => {
                warn!(user_id = %claims.sub, "Authentication failed: user not found in database");
                Err(ApiError::Unauthorized("user not found".into()))
            }
        }
    }
}
