// src/services/google.rs
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error, info};

use crate::auth::identity::{IdentityError, IdentityVerifier, VerifiedIdentity};
use crate::common::config::GoogleConfig;

const SCOPES: &str = "email profile";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    id: String,
    email: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

/// Google sign-in via the OAuth authorization-code flow
#[derive(Debug)]
pub struct GoogleIdentityVerifier {
    config: GoogleConfig,
    client: Client,
}

impl GoogleIdentityVerifier {
    pub fn new(config: GoogleConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { config, client }
    }

    fn credentials(&self) -> Result<(&str, &str), IdentityError> {
        match (
            self.config.client_id.as_deref(),
            self.config.client_secret.as_deref(),
        ) {
            (Some(id), Some(secret)) => Ok((id, secret)),
            _ => Err(IdentityError::NotConfigured),
        }
    }

    /// Exchange authorization code for an access token
    async fn exchange_code(&self, code: &str) -> Result<String, IdentityError> {
        let (client_id, client_secret) = self.credentials()?;

        let params = [
            ("code", code),
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ];

        debug!("Exchanging authorization code for tokens");

        let response = self
            .client
            .post(&self.config.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| IdentityError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!(status = %status, error = %error_text, "Token exchange failed");
            return Err(IdentityError::ExchangeFailed(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let token = response
            .json::<TokenResponse>()
            .await
            .map_err(|e| IdentityError::InvalidResponse(e.to_string()))?;

        Ok(token.access_token)
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<UserInfo, IdentityError> {
        let response = self
            .client
            .get(&self.config.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| IdentityError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            error!(status = %status, "Failed to get user info");
            return Err(IdentityError::ProfileFailed(format!("HTTP {}", status)));
        }

        response
            .json::<UserInfo>()
            .await
            .map_err(|e| IdentityError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl IdentityVerifier for GoogleIdentityVerifier {
    fn authorization_url(&self, state: &str) -> Result<String, IdentityError> {
        let (client_id, _) = self.credentials()?;

        let auth_url = format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}",
            self.config.auth_url,
            urlencoding::encode(client_id),
            urlencoding::encode(&self.config.redirect_uri),
            urlencoding::encode(SCOPES),
            urlencoding::encode(state)
        );

        Ok(auth_url)
    }

    async fn verify_code(&self, code: &str) -> Result<VerifiedIdentity, IdentityError> {
        let access_token = self.exchange_code(code).await?;
        let profile = self.fetch_profile(&access_token).await?;

        info!(subject = %profile.id, "Verified Google identity");

        let name = profile
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| profile.email.clone());

        Ok(VerifiedIdentity {
            subject: profile.id,
            email: profile.email,
            name,
            picture: profile.picture,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> GoogleConfig {
        GoogleConfig {
            client_id: Some("test_client_id".to_string()),
            client_secret: Some("test_secret".to_string()),
            redirect_uri: "http://localhost:8080/auth/callback".to_string(),
            auth_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_url: format!("{}/token", server.uri()),
            userinfo_url: format!("{}/userinfo", server.uri()),
        }
    }

    #[test]
    fn test_not_configured() {
        let verifier = GoogleIdentityVerifier::new(GoogleConfig::default());
        let result = verifier.authorization_url("abc");
        assert!(matches!(result.unwrap_err(), IdentityError::NotConfigured));
    }

    #[tokio::test]
    async fn test_get_authorization_url() {
        let server = MockServer::start().await;
        let verifier = GoogleIdentityVerifier::new(config_for(&server));

        let auth_url = verifier.authorization_url("state123").unwrap();

        assert!(auth_url.contains("accounts.google.com/o/oauth2/v2/auth"));
        assert!(auth_url.contains("client_id=test_client_id"));
        assert!(auth_url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A8080%2Fauth%2Fcallback"));
        assert!(auth_url.contains("scope=email%20profile"));
        assert!(auth_url.contains("state=state123"));
    }

    #[tokio::test]
    async fn test_verify_code() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("code=auth-code"))
            .and(body_string_contains("grant_type=authorization_code"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "ya29.token",
                "expires_in": 3599,
                "token_type": "Bearer"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/userinfo"))
            .and(header("authorization", "Bearer ya29.token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "1098",
                "email": "ada@example.com",
                "name": "Ada Lovelace",
                "picture": "https://example.com/ada.png"
            })))
            .mount(&server)
            .await;

        let verifier = GoogleIdentityVerifier::new(config_for(&server));
        let identity = verifier.verify_code("auth-code").await.unwrap();

        assert_eq!(identity.subject, "1098");
        assert_eq!(identity.email, "ada@example.com");
        assert_eq!(identity.name, "Ada Lovelace");
        assert_eq!(identity.picture.as_deref(), Some("https://example.com/ada.png"));
    }

    #[tokio::test]
    async fn test_verify_code_name_falls_back_to_email() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "access_token": "t" })),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/userinfo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "7",
                "email": "noname@example.com"
            })))
            .mount(&server)
            .await;

        let verifier = GoogleIdentityVerifier::new(config_for(&server));
        let identity = verifier.verify_code("c").await.unwrap();
        assert_eq!(identity.name, "noname@example.com");
        assert!(identity.picture.is_none());
    }

    #[tokio::test]
    async fn test_exchange_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_string("invalid_grant"))
            .mount(&server)
            .await;

        let verifier = GoogleIdentityVerifier::new(config_for(&server));
        let err = verifier.verify_code("bad").await.unwrap_err();
        assert!(matches!(err, IdentityError::ExchangeFailed(msg) if msg.contains("invalid_grant")));
    }
}
