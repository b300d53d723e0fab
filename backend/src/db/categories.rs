//! Categories repository

use anyhow::Result;
use sqlx::{FromRow, SqlitePool};

use super::sqlite_helpers::now_iso8601;

#[derive(Debug, Clone, FromRow)]
#[sqlx(rename_all = "camelCase")]
pub struct CategoryRecord {
    pub id: i64,
    pub category_name: String,
    pub created_at: String,
    pub updated_at: String,
}

pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, name: &str) -> Result<CategoryRecord> {
        let now = now_iso8601();

        let id = sqlx::query(
            r#"INSERT INTO categories ("categoryName", "createdAt", "updatedAt") VALUES (?, ?, ?)"#,
        )
        .bind(name)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        self.get_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to create category"))
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<CategoryRecord>> {
        let record = sqlx::query_as::<_, CategoryRecord>(
            r#"SELECT "id", "categoryName", "createdAt", "updatedAt" FROM categories WHERE "id" = ?"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    pub async fn list_by_ids(&self, ids: &[i64]) -> Result<Vec<CategoryRecord>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            r#"SELECT "id", "categoryName", "createdAt", "updatedAt" FROM categories WHERE "id" IN ({}) ORDER BY "id""#,
            placeholders
        );

        let mut query = sqlx::query_as::<_, CategoryRecord>(&sql);
        for id in ids {
            query = query.bind(id);
        }

        Ok(query.fetch_all(&self.pool).await?)
    }

    /// All categories by name
    pub async fn list(&self) -> Result<Vec<CategoryRecord>> {
        let records = sqlx::query_as::<_, CategoryRecord>(
            r#"SELECT "id", "categoryName", "createdAt", "updatedAt" FROM categories ORDER BY "categoryName""#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}
