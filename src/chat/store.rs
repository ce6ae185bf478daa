//! Persistence for users, chat history and daily usage counters

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::SqlitePool;
use tracing::{debug, error};

use super::models::{ChatMessage, ChatSession, CompletedTurn, UsageCounter};
use crate::auth::identity::VerifiedIdentity;
use crate::auth::models::User;
use crate::common::{generate_message_id, generate_session_id, generate_user_id};

#[async_trait]
pub trait ChatStore: Send + Sync {
    /// Insert or refresh the user keyed by provider subject id
    async fn upsert_user(&self, identity: &VerifiedIdentity) -> Result<User, sqlx::Error>;

    async fn find_user(&self, user_id: &str) -> Result<Option<User>, sqlx::Error>;

    /// Counters for `(user, date)`; zero when no row exists yet
    async fn usage_for(&self, user_id: &str, date: NaiveDate) -> Result<UsageCounter, sqlx::Error>;

    /// Add one chat and `tokens` to the day's counter in a single statement.
    /// Returns `false` without writing when the counter already reached `limit`.
    async fn record_usage(
        &self,
        user_id: &str,
        date: NaiveDate,
        tokens: i64,
        limit: i64,
    ) -> Result<bool, sqlx::Error>;

    /// Write a session with its user and assistant messages; returns the session id
    async fn save_history(&self, turn: &CompletedTurn<'_>) -> Result<String, sqlx::Error>;

    async fn list_sessions(&self, user_id: &str, limit: i64) -> Result<Vec<ChatSession>, sqlx::Error>;

    /// Messages of a session, or `None` when the session does not belong to the user
    async fn session_messages(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<Option<Vec<ChatMessage>>, sqlx::Error>;
}

pub struct SqliteChatStore {
    db: SqlitePool,
}

impl SqliteChatStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[async_trait]
impl ChatStore for SqliteChatStore {
    async fn upsert_user(&self, identity: &VerifiedIdentity) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, google_id, email, name, picture, plan)
            VALUES (?, ?, ?, ?, ?, 'trial')
            ON CONFLICT(google_id) DO UPDATE SET
                name = excluded.name,
                picture = excluded.picture,
                updated_at = datetime('now')
            RETURNING id, google_id, email, name, picture, plan, created_at, updated_at
            "#,
        )
        .bind(generate_user_id())
        .bind(&identity.subject)
        .bind(&identity.email)
        .bind(&identity.name)
        .bind(identity.picture.as_deref())
        .fetch_one(&self.db)
        .await
        .map_err(|e| {
            error!(error = %e, provider_id = %identity.subject, "Database error upserting user");
            e
        })
    }

    async fn find_user(&self, user_id: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "SELECT id, google_id, email, name, picture, plan, created_at, updated_at FROM users WHERE id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await
    }

    async fn usage_for(&self, user_id: &str, date: NaiveDate) -> Result<UsageCounter, sqlx::Error> {
        let row = sqlx::query_as::<_, UsageCounter>(
            "SELECT chat_count, token_count FROM user_usage WHERE user_id = ? AND date = ?",
        )
        .bind(user_id)
        .bind(date_key(date))
        .fetch_optional(&self.db)
        .await?;

        Ok(row.unwrap_or_default())
    }

    async fn record_usage(
        &self,
        user_id: &str,
        date: NaiveDate,
        tokens: i64,
        limit: i64,
    ) -> Result<bool, sqlx::Error> {
        if limit <= 0 {
            return Ok(false);
        }

        // The WHERE on the update arm makes the limit check and the increment one
        // atomic step, so concurrent turns cannot push chat_count past `limit`.
        let result = sqlx::query(
            r#"
            INSERT INTO user_usage (user_id, date, chat_count, token_count)
            VALUES (?, ?, 1, ?)
            ON CONFLICT(user_id, date) DO UPDATE SET
                chat_count = user_usage.chat_count + 1,
                token_count = user_usage.token_count + excluded.token_count
            WHERE user_usage.chat_count < ?
            "#,
        )
        .bind(user_id)
        .bind(date_key(date))
        .bind(tokens)
        .bind(limit)
        .execute(&self.db)
        .await?;

        let recorded = result.rows_affected() > 0;
        debug!(user_id = %user_id, tokens = tokens, recorded = recorded, "Usage upsert executed");
        Ok(recorded)
    }

    async fn save_history(&self, turn: &CompletedTurn<'_>) -> Result<String, sqlx::Error> {
        let session_id = generate_session_id();
        let model = turn.model.as_str();
        let mut tx = self.db.begin().await?;

        sqlx::query("INSERT INTO chat_sessions (id, user_id, title, model) VALUES (?, ?, ?, ?)")
            .bind(&session_id)
            .bind(turn.user_id)
            .bind(&turn.title)
            .bind(model)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO chat_messages (id, session_id, role, content, model, position) VALUES (?, ?, 'user', ?, ?, 0)",
        )
        .bind(generate_message_id())
        .bind(&session_id)
        .bind(turn.user_message)
        .bind(model)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO chat_messages (id, session_id, role, content, model, tokens_used, position) VALUES (?, ?, 'assistant', ?, ?, ?, 1)",
        )
        .bind(generate_message_id())
        .bind(&session_id)
        .bind(turn.reply)
        .bind(model)
        .bind(turn.tokens)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(session_id)
    }

    async fn list_sessions(&self, user_id: &str, limit: i64) -> Result<Vec<ChatSession>, sqlx::Error> {
        sqlx::query_as::<_, ChatSession>(
            r#"
            SELECT id, user_id, title, model, created_at
            FROM chat_sessions
            WHERE user_id = ?
            ORDER BY datetime(created_at) DESC, rowid DESC
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.db)
        .await
    }

    async fn session_messages(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<Option<Vec<ChatMessage>>, sqlx::Error> {
        let owned: Option<(String,)> =
            sqlx::query_as("SELECT id FROM chat_sessions WHERE id = ? AND user_id = ?")
                .bind(session_id)
                .bind(user_id)
                .fetch_optional(&self.db)
                .await?;

        if owned.is_none() {
            return Ok(None);
        }

        let messages = sqlx::query_as::<_, ChatMessage>(
            r#"
            SELECT id, session_id, role, content, model, tokens_used, position, created_at
            FROM chat_messages
            WHERE session_id = ?
            ORDER BY position ASC
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.db)
        .await?;

        Ok(Some(messages))
    }
}
