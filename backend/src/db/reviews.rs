//! Reviews repository
//!
//! A review is keyed by (book, reviewer); a user has at most one review per book.

use std::collections::HashMap;

use anyhow::Result;
use sqlx::{FromRow, SqlitePool};

use super::sqlite_helpers::now_iso8601;

const REVIEW_COLUMNS: &str =
    r#""reviewItemId", "reviewedById", "rating", "text", "createdAt", "updatedAt""#;

#[derive(Debug, Clone, FromRow)]
#[sqlx(rename_all = "camelCase")]
pub struct ReviewRecord {
    /// Reviewed book
    pub review_item_id: i64,
    /// Reviewing user
    pub reviewed_by_id: i64,
    pub rating: f64,
    pub text: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct CreateReview {
    pub book_id: i64,
    pub user_id: i64,
    pub rating: f64,
    pub text: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UpdateReview {
    pub rating: f64,
    pub text: Option<String>,
}

pub struct ReviewRepository {
    pool: SqlitePool,
}

impl ReviewRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a review; fails if the user already reviewed the book
    pub async fn create(&self, review: CreateReview) -> Result<ReviewRecord> {
        let now = now_iso8601();

        sqlx::query(
            r#"
            INSERT INTO reviews ("reviewItemId", "reviewedById", "rating", "text", "createdAt", "updatedAt")
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(review.book_id)
        .bind(review.user_id)
        .bind(review.rating)
        .bind(&review.text)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.get(review.book_id, review.user_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to create review"))
    }

    /// Update the user's review of a book; None when there is none
    pub async fn update(
        &self,
        book_id: i64,
        user_id: i64,
        update: UpdateReview,
    ) -> Result<Option<ReviewRecord>> {
        let result = sqlx::query(
            r#"
            UPDATE reviews SET "rating" = ?, "text" = ?, "updatedAt" = ?
            WHERE "reviewItemId" = ? AND "reviewedById" = ?
            "#,
        )
        .bind(update.rating)
        .bind(&update.text)
        .bind(now_iso8601())
        .bind(book_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get(book_id, user_id).await
    }

    /// Delete the user's review of a book. Returns whether a row was removed.
    pub async fn delete(&self, book_id: i64, user_id: i64) -> Result<bool> {
        let result =
            sqlx::query(r#"DELETE FROM reviews WHERE "reviewItemId" = ? AND "reviewedById" = ?"#)
                .bind(book_id)
                .bind(user_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn get(&self, book_id: i64, user_id: i64) -> Result<Option<ReviewRecord>> {
        let record = sqlx::query_as::<_, ReviewRecord>(&format!(
            r#"SELECT {} FROM reviews WHERE "reviewItemId" = ? AND "reviewedById" = ?"#,
            REVIEW_COLUMNS
        ))
        .bind(book_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Reviews written by a user, newest first
    pub async fn list_for_user(&self, user_id: i64) -> Result<Vec<ReviewRecord>> {
        let records = sqlx::query_as::<_, ReviewRecord>(&format!(
            r#"SELECT {} FROM reviews WHERE "reviewedById" = ? ORDER BY "createdAt" DESC, "reviewItemId""#,
            REVIEW_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Every review, with the total count
    pub async fn list_all(&self) -> Result<(Vec<ReviewRecord>, i64)> {
        let records = sqlx::query_as::<_, ReviewRecord>(&format!(
            r#"SELECT {} FROM reviews ORDER BY "createdAt" DESC, "reviewItemId", "reviewedById""#,
            REVIEW_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        let total = self.count().await?;
        Ok((records, total))
    }

    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reviews")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Reviews of several books in one query, grouped by book then newest first
    pub async fn list_for_books(&self, book_ids: &[i64]) -> Result<Vec<ReviewRecord>> {
        if book_ids.is_empty() {
            return Ok(vec![]);
        }

        let placeholders = vec!["?"; book_ids.len()].join(", ");
        let sql = format!(
            r#"SELECT {} FROM reviews WHERE "reviewItemId" IN ({}) ORDER BY "reviewItemId", "createdAt" DESC, "reviewedById""#,
            REVIEW_COLUMNS, placeholders
        );

        let mut query = sqlx::query_as::<_, ReviewRecord>(&sql);
        for id in book_ids {
            query = query.bind(id);
        }

        Ok(query.fetch_all(&self.pool).await?)
    }

    /// One user's reviews among the given books
    pub async fn list_for_user_books(&self, user_id: i64, book_ids: &[i64]) -> Result<Vec<ReviewRecord>> {
        if book_ids.is_empty() {
            return Ok(vec![]);
        }

        let placeholders = vec!["?"; book_ids.len()].join(", ");
        let sql = format!(
            r#"SELECT {} FROM reviews WHERE "reviewedById" = ? AND "reviewItemId" IN ({})"#,
            REVIEW_COLUMNS, placeholders
        );

        let mut query = sqlx::query_as::<_, ReviewRecord>(&sql).bind(user_id);
        for id in book_ids {
            query = query.bind(id);
        }

        Ok(query.fetch_all(&self.pool).await?)
    }

    /// Mean rating per book; books without reviews are absent
    pub async fn average_ratings(&self, book_ids: &[i64]) -> Result<HashMap<i64, f64>> {
        if book_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let placeholders = vec!["?"; book_ids.len()].join(", ");
        let sql = format!(
            r#"SELECT "reviewItemId", AVG("rating") FROM reviews WHERE "reviewItemId" IN ({}) GROUP BY "reviewItemId""#,
            placeholders
        );

        let mut query = sqlx::query_as::<_, (i64, f64)>(&sql);
        for id in book_ids {
            query = query.bind(id);
        }

        Ok(query.fetch_all(&self.pool).await?.into_iter().collect())
    }
}
