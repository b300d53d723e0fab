//! Server-side login sessions
//!
//! Only the SHA-256 hash of the cookie token is stored.

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};

use super::sqlite_helpers::{datetime_to_str, now_iso8601};

#[derive(Debug, Clone, FromRow)]
#[sqlx(rename_all = "camelCase")]
pub struct SessionRecord {
    pub token_hash: String,
    pub user_id: i64,
    pub expires_at: String,
    pub created_at: String,
}

pub struct SessionRepository {
    pool: SqlitePool,
}

impl SessionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        token_hash: &str,
        user_id: i64,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO sessions ("tokenHash", "userId", "expiresAt", "createdAt") VALUES (?, ?, ?, ?)"#,
        )
        .bind(token_hash)
        .bind(user_id)
        .bind(datetime_to_str(expires_at))
        .bind(now_iso8601())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Session for a token hash, if it exists and has not expired
    pub async fn get_valid(&self, token_hash: &str) -> Result<Option<SessionRecord>> {
        let record = sqlx::query_as::<_, SessionRecord>(
            r#"
            SELECT "tokenHash", "userId", "expiresAt", "createdAt"
            FROM sessions
            WHERE "tokenHash" = ? AND "expiresAt" > ?
            "#,
        )
        .bind(token_hash)
        .bind(now_iso8601())
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    pub async fn delete(&self, token_hash: &str) -> Result<bool> {
        let result = sqlx::query(r#"DELETE FROM sessions WHERE "tokenHash" = ?"#)
            .bind(token_hash)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove expired sessions, returning how many were removed
    pub async fn delete_expired(&self) -> Result<u64> {
        let result = sqlx::query(r#"DELETE FROM sessions WHERE "expiresAt" <= ?"#)
            .bind(now_iso8601())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
