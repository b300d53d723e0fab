//! Users repository

use anyhow::Result;
use sqlx::{FromRow, SqlitePool};

use super::sqlite_helpers::now_iso8601;

const USER_COLUMNS: &str =
    r#""id", "email", "firstName", "lastName", "password", "nationality", "createdAt", "updatedAt""#;

#[derive(Debug, Clone, FromRow)]
#[sqlx(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// bcrypt hash
    pub password: String,
    pub nationality: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct CreateUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub nationality: Option<String>,
}

pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new user
    ///
    /// Fails with a unique violation when the email is taken.
    pub async fn create(&self, user: CreateUser) -> Result<UserRecord> {
        let now = now_iso8601();

        let id = sqlx::query(
            r#"
            INSERT INTO users ("email", "firstName", "lastName", "password", "nationality", "createdAt", "updatedAt")
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.password_hash)
        .bind(&user.nationality)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        self.get_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to create user"))
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i64) -> Result<Option<UserRecord>> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {} FROM users WHERE \"id\" = ?",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Get user by email (case-insensitive)
    pub async fn get_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {} FROM users WHERE \"email\" = ? COLLATE NOCASE",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Users by ID, for batch lookups
    pub async fn list_by_ids(&self, ids: &[i64]) -> Result<Vec<UserRecord>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT {} FROM users WHERE \"id\" IN ({}) ORDER BY \"id\"",
            USER_COLUMNS, placeholders
        );

        let mut query = sqlx::query_as::<_, UserRecord>(&sql);
        for id in ids {
            query = query.bind(id);
        }

        Ok(query.fetch_all(&self.pool).await?)
    }
}

/// True when the error is a UNIQUE constraint violation.
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<sqlx::Error>(),
        Some(sqlx::Error::Database(db_err)) if db_err.is_unique_violation()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support;

    #[tokio::test]
    async fn test_create_and_lookup() {
        let db = test_support::database().await;
        let repo = db.users();

        let created = repo.create(test_support::user("ada@example.com")).await.unwrap();
        assert_eq!(created.email, "ada@example.com");
        assert!(created.nationality.is_none());

        let by_email = repo.get_by_email("ADA@example.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, created.id);

        assert!(repo.get_by_id(created.id + 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_unique_violation() {
        let db = test_support::database().await;
        let repo = db.users();

        repo.create(test_support::user("ada@example.com")).await.unwrap();
        let err = repo
            .create(test_support::user("Ada@Example.com"))
            .await
            .unwrap_err();

        assert!(is_unique_violation(&err));
    }

    #[tokio::test]
    async fn test_list_by_ids() {
        let db = test_support::database().await;
        let repo = db.users();

        let a = repo.create(test_support::user("a@example.com")).await.unwrap();
        let b = repo.create(test_support::user("b@example.com")).await.unwrap();

        let users = repo.list_by_ids(&[b.id, a.id]).await.unwrap();
        assert_eq!(users.iter().map(|u| u.id).collect::<Vec<_>>(), vec![a.id, b.id]);
        assert!(repo.list_by_ids(&[]).await.unwrap().is_empty());
    }
}
