// src/test_support.rs
//! Shared fixtures for unit tests: in-memory database, stub collaborators and app wiring

use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::auth::identity::{IdentityError, IdentityVerifier, VerifiedIdentity};
use crate::auth::session::issue_token;
use crate::chat::provider::{ChatProvider, Completion, ProviderError};
use crate::chat::{ChatStore, ProviderRegistry, QuotaGuardedChatService, SqliteChatStore};
use crate::common::{AppConfig, AppState};

pub const TEST_SECRET: &str = "test-secret";

/// Single-connection in-memory pool with the schema applied
pub async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    crate::common::migrations::run_migrations(&pool, false)
        .await
        .unwrap();
    pool
}

pub fn identity(subject: &str, email: &str) -> VerifiedIdentity {
    VerifiedIdentity {
        subject: subject.to_string(),
        email: email.to_string(),
        name: email.split('@').next().unwrap_or(email).to_string(),
        picture: None,
    }
}

/// Provider returning a canned reply, or failing, and counting calls
pub struct StubProvider {
    reply: Option<String>,
    tokens: i64,
    calls: AtomicUsize,
}

impl StubProvider {
    pub fn replying(reply: &str, tokens: i64) -> Arc<Self> {
        Arc::new(Self {
            reply: Some(reply.to_string()),
            tokens,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            reply: None,
            tokens: 0,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatProvider for StubProvider {
    async fn complete(&self, _message: &str) -> Result<Completion, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        // Let concurrent turns interleave between the quota check and the usage write
        tokio::task::yield_now().await;

        match &self.reply {
            Some(text) => Ok(Completion {
                text: text.clone(),
                total_tokens: self.tokens,
            }),
            None => Err(ProviderError::Status {
                status: 503,
                body: "upstream unavailable".to_string(),
            }),
        }
    }
}

/// Identity provider accepting the code `good-code` only
pub struct StubIdentity {
    pub identity: VerifiedIdentity,
}

pub const GOOD_CODE: &str = "good-code";

#[async_trait]
impl IdentityVerifier for StubIdentity {
    fn authorization_url(&self, state: &str) -> Result<String, IdentityError> {
        Ok(format!("https://accounts.example.test/auth?state={}", state))
    }

    async fn verify_code(&self, code: &str) -> Result<VerifiedIdentity, IdentityError> {
        if code == GOOD_CODE {
            Ok(self.identity.clone())
        } else {
            Err(IdentityError::ExchangeFailed("HTTP 400: invalid_grant".to_string()))
        }
    }
}

pub struct TestApp {
    pub state: AppState,
    pub store: Arc<SqliteChatStore>,
}

/// App state over a fresh database, with `provider` serving the primary model
pub async fn test_app(provider: Arc<dyn ChatProvider>, daily_limit: i64) -> TestApp {
    let store = Arc::new(SqliteChatStore::new(memory_pool().await));
    let dyn_store: Arc<dyn ChatStore> = store.clone();

    let config = AppConfig {
        session_secret: TEST_SECRET.to_string(),
        frontend_url: "http://app.test".to_string(),
        daily_chat_limit: daily_limit,
        ..AppConfig::default()
    };

    let chat_service = Arc::new(QuotaGuardedChatService::new(
        dyn_store.clone(),
        ProviderRegistry::new(provider),
        daily_limit,
    ));

    let state = AppState {
        config: Arc::new(config),
        store: dyn_store,
        identity: Arc::new(StubIdentity {
            identity: identity("google-42", "ada@example.com"),
        }),
        chat_service,
        dev_user: None,
    };

    TestApp { state, store }
}

pub fn bearer(user_id: &str) -> String {
    format!("Bearer {}", issue_token(user_id, TEST_SECRET, 1).unwrap())
}
