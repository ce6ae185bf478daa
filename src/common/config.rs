// src/common/config.rs
//! Runtime configuration loaded from environment variables

use std::env;
use std::time::Duration;
use tracing::warn;

/// Chats a user may complete per calendar day unless `DAILY_CHAT_LIMIT` overrides it
pub const DEFAULT_DAILY_CHAT_LIMIT: i64 = 50;

const DEFAULT_SESSION_SECRET: &str = "replace_with_strong_secret";

#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com".to_string(),
            model: "gpt-4o".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub redirect_uri: String,
    pub auth_url: String,
    pub token_url: String,
    pub userinfo_url: String,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            redirect_uri: "http://localhost:8080/auth/callback".to_string(),
            auth_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            userinfo_url: "https://www.googleapis.com/oauth2/v2/userinfo".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub port: u16,
    pub base_url: String,
    pub frontend_url: String,
    pub session_secret: String,
    pub session_ttl_hours: i64,
    pub daily_chat_limit: i64,
    pub cors_origins: Vec<String>,
    pub reset_db: bool,
    pub log_http_bodies: bool,
    pub openai: OpenAIConfig,
    pub google: GoogleConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://chat_api.db".to_string(),
            port: 8080,
            base_url: "http://localhost:8080".to_string(),
            frontend_url: "http://localhost:8080".to_string(),
            session_secret: DEFAULT_SESSION_SECRET.to_string(),
            session_ttl_hours: 24,
            daily_chat_limit: DEFAULT_DAILY_CHAT_LIMIT,
            cors_origins: Vec::new(),
            reset_db: false,
            log_http_bodies: false,
            openai: OpenAIConfig::default(),
            google: GoogleConfig::default(),
        }
    }
}

impl AppConfig {
    /// Build the configuration from the process environment.
    /// Missing provider credentials are not an error here; they surface when first used.
    pub fn from_env() -> Self {
        let base_url = env::var("BASE_URL")
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| "http://localhost:8080".to_string());
        let frontend_url = env::var("FRONTEND_URL")
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| base_url.clone());

        let session_secret = env::var("SESSION_SECRET").unwrap_or_else(|_| {
            warn!("SESSION_SECRET not set, falling back to an insecure default");
            DEFAULT_SESSION_SECRET.to_string()
        });

        let openai = OpenAIConfig {
            api_key: non_empty_var("OPENAI_API_KEY"),
            base_url: env::var("OPENAI_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| OpenAIConfig::default().base_url),
            model: env::var("OPENAI_MODEL").unwrap_or_else(|_| OpenAIConfig::default().model),
            timeout: Duration::from_secs(parse_var("OPENAI_TIMEOUT_SECS", 30)),
        };

        let google = GoogleConfig {
            client_id: non_empty_var("GOOGLE_CLIENT_ID"),
            client_secret: non_empty_var("GOOGLE_CLIENT_SECRET"),
            redirect_uri: format!("{}/auth/callback", base_url),
            ..GoogleConfig::default()
        };

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000,http://localhost:5173".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://chat_api.db".to_string()),
            port: parse_var("PORT", 8080),
            base_url,
            frontend_url,
            session_secret,
            session_ttl_hours: parse_var("SESSION_TTL_HOURS", 24),
            daily_chat_limit: parse_var("DAILY_CHAT_LIMIT", DEFAULT_DAILY_CHAT_LIMIT),
            cors_origins,
            reset_db: flag_var("RESET_DB"),
            log_http_bodies: flag_var("LOG_HTTP_BODIES"),
            openai,
            google,
        }
    }

    /// Cookies get the `Secure` attribute when the app is served over HTTPS
    pub fn secure_cookies(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn flag_var(key: &str) -> bool {
    env::var(key)
        .map(|v| v.to_lowercase() == "true")
        .unwrap_or(false)
}

fn parse_var<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => match raw.trim().parse::<T>() {
            Ok(val) => val,
            Err(_) => {
                warn!(key = %key, value = %raw, "Ignoring unparsable environment value");
                default
            }
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_var_falls_back_on_garbage() {
        env::set_var("CHAT_API_TEST_PARSE", "not-a-number");
        assert_eq!(parse_var("CHAT_API_TEST_PARSE", 42u16), 42);
        env::set_var("CHAT_API_TEST_PARSE", " 7 ");
        assert_eq!(parse_var("CHAT_API_TEST_PARSE", 42u16), 7);
        env::remove_var("CHAT_API_TEST_PARSE");
    }

    #[test]
    fn test_defaults() {
        let openai = OpenAIConfig::default();
        assert_eq!(openai.model, "gpt-4o");
        assert_eq!(openai.timeout, Duration::from_secs(30));
        assert_eq!(DEFAULT_DAILY_CHAT_LIMIT, 50);

        let google = GoogleConfig::default();
        assert!(google.client_id.is_none());
        assert!(google.token_url.starts_with("https://oauth2.googleapis.com"));
    }
}
