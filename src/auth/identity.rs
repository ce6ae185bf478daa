//! Identity provider seam
//!
//! The OAuth authorization-code exchange lives behind [`IdentityVerifier`] so the
//! login callback can be exercised without talking to Google.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Profile returned by the identity provider after a successful code exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedIdentity {
    /// Stable provider subject id (Google `id`)
    pub subject: String,
    pub email: String,
    pub name: String,
    pub picture: Option<String>,
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("OAuth client not configured")]
    NotConfigured,

    #[error("Code exchange failed: {0}")]
    ExchangeFailed(String),

    #[error("Profile lookup failed: {0}")]
    ProfileFailed(String),

    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Consent page URL carrying the given anti-forgery `state`
    fn authorization_url(&self, state: &str) -> Result<String, IdentityError>;

    /// Exchange an authorization code for the user's verified profile
    async fn verify_code(&self, code: &str) -> Result<VerifiedIdentity, IdentityError>;
}
