use anyhow::{Context, Result};
use chrono::{DateTime, Duration, TimeZone, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use uuid::Uuid;

use shared::domain::{SessionId, TokenBundle};

/// Session-keyed store for provider credentials.
///
/// Lookups apply the expiry check: a session past its `expires_at` reads as
/// absent even before `purge_expired` removes the row.
#[derive(Clone)]
pub struct CredentialStore {
    pool: Pool<Sqlite>,
}

#[derive(Debug, Clone)]
pub struct StoredSession {
    pub session_id: SessionId,
    pub tokens: TokenBundle,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CredentialStore {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        // Every connection to an in-memory database sees its own empty schema,
        // so the single connection must never be recycled.
        let pool_options = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };
        let pool = pool_options.connect_with(connect_options).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    /// Stores `tokens` under a freshly generated session id.
    pub async fn create_session(&self, tokens: &TokenBundle, ttl: Duration) -> Result<SessionId> {
        let session_id = SessionId(Uuid::new_v4().simple().to_string());
        self.set(&session_id, tokens, Utc::now() + ttl).await?;
        Ok(session_id)
    }

    pub async fn set(
        &self,
        session_id: &SessionId,
        tokens: &TokenBundle,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        let tokens_json =
            serde_json::to_string(tokens).context("failed to serialize token bundle")?;
        sqlx::query(
            "INSERT INTO sessions (id, tokens_json, created_at, expires_at)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET tokens_json=excluded.tokens_json, expires_at=excluded.expires_at",
        )
        .bind(session_id.as_str())
        .bind(tokens_json)
        .bind(Utc::now().timestamp())
        .bind(expires_at.timestamp())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get(&self, session_id: &SessionId) -> Result<Option<StoredSession>> {
        self.get_at(session_id, Utc::now()).await
    }

    pub async fn get_at(
        &self,
        session_id: &SessionId,
        now: DateTime<Utc>,
    ) -> Result<Option<StoredSession>> {
        let row = sqlx::query(
            "SELECT tokens_json, created_at, expires_at FROM sessions WHERE id = ? AND expires_at > ?",
        )
        .bind(session_id.as_str())
        .bind(now.timestamp())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let tokens: TokenBundle = serde_json::from_str(&row.get::<String, _>(0))
            .with_context(|| format!("corrupt token bundle for session {session_id}"))?;
        Ok(Some(StoredSession {
            session_id: session_id.clone(),
            tokens,
            created_at: from_timestamp(row.get::<i64, _>(1))?,
            expires_at: from_timestamp(row.get::<i64, _>(2))?,
        }))
    }

    /// Returns whether a session row was removed.
    pub async fn clear(&self, session_id: &SessionId) -> Result<bool> {
        let removed = sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(session_id.as_str())
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(removed > 0)
    }

    pub async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let removed = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(now.timestamp())
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(removed)
    }
}

fn from_timestamp(seconds: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_opt(seconds, 0)
        .single()
        .with_context(|| format!("invalid stored timestamp {seconds}"))
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.contains(":memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
