//! Authors repository

use anyhow::Result;
use sqlx::{FromRow, SqliteConnection, SqlitePool};

use super::sqlite_helpers::now_iso8601;

#[derive(Debug, Clone, FromRow)]
#[sqlx(rename_all = "camelCase")]
pub struct AuthorRecord {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub created_at: String,
    pub updated_at: String,
}

/// An author joined with one of their books
#[derive(Debug, Clone, FromRow)]
#[sqlx(rename_all = "camelCase")]
pub struct BookAuthorRecord {
    pub book_id: i64,
    #[sqlx(flatten)]
    pub author: AuthorRecord,
}

pub struct AuthorRepository {
    pool: SqlitePool,
}

impl AuthorRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Return the author's ID, inserting the author if unknown
    pub async fn get_or_create(&self, first_name: &str, last_name: &str) -> Result<i64> {
        let mut conn = self.pool.acquire().await?;
        get_or_create_on(&mut conn, first_name, last_name).await
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<AuthorRecord>> {
        let record = sqlx::query_as::<_, AuthorRecord>(
            r#"SELECT "id", "firstName", "lastName", "createdAt", "updatedAt" FROM authors WHERE "id" = ?"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Authors of several books in one query, by book then last and first name
    pub async fn list_for_books(&self, book_ids: &[i64]) -> Result<Vec<BookAuthorRecord>> {
        if book_ids.is_empty() {
            return Ok(vec![]);
        }

        let placeholders = vec!["?"; book_ids.len()].join(", ");
        let sql = format!(
            r#"
            SELECT ba."bookId", a."id", a."firstName", a."lastName", a."createdAt", a."updatedAt"
            FROM authors a
            JOIN book_authors ba ON ba."authorId" = a."id"
            WHERE ba."bookId" IN ({})
            ORDER BY ba."bookId", a."lastName", a."firstName"
            "#,
            placeholders
        );

        let mut query = sqlx::query_as::<_, BookAuthorRecord>(&sql);
        for id in book_ids {
            query = query.bind(id);
        }

        Ok(query.fetch_all(&self.pool).await?)
    }
}

/// Connection-level variant so book creation can run it inside its transaction.
pub(crate) async fn get_or_create_on(
    conn: &mut SqliteConnection,
    first_name: &str,
    last_name: &str,
) -> Result<i64> {
    let now = now_iso8601();

    sqlx::query(
        r#"
        INSERT INTO authors ("firstName", "lastName", "createdAt", "updatedAt")
        VALUES (?, ?, ?, ?)
        ON CONFLICT ("firstName", "lastName") DO NOTHING
        "#,
    )
    .bind(first_name)
    .bind(last_name)
    .bind(&now)
    .bind(&now)
    .execute(&mut *conn)
    .await?;

    let id: i64 =
        sqlx::query_scalar(r#"SELECT "id" FROM authors WHERE "firstName" = ? AND "lastName" = ?"#)
            .bind(first_name)
            .bind(last_name)
            .fetch_one(&mut *conn)
            .await?;

    Ok(id)
}
