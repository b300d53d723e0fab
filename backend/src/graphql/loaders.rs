//! GraphQL DataLoaders for batching database queries
//!
//! List resolvers touch relations per row (a page of books asks for each
//! book's authors, reviews, category and rating). These loaders collect the
//! keys requested in one tick and fetch them with a single `IN (...)` query.

use std::collections::HashMap;
use std::sync::Arc;

use async_graphql::dataloader::Loader;

use crate::db::Database;

use super::helpers::{to_book, to_review, to_user};
use super::types::{Author, Book, Category, Review, User};

pub struct BookLoader {
    db: Database,
}

impl BookLoader {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl Loader<i64> for BookLoader {
    type Value = Book;
    type Error = Arc<anyhow::Error>;

    async fn load(&self, keys: &[i64]) -> Result<HashMap<i64, Self::Value>, Self::Error> {
        tracing::debug!(count = keys.len(), "Batch loading books");
        let records = self.db.books().list_by_ids(keys).await.map_err(Arc::new)?;
        Ok(records.into_iter().map(|r| (r.id, to_book(r))).collect())
    }
}

pub struct UserLoader {
    db: Database,
}

impl UserLoader {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl Loader<i64> for UserLoader {
    type Value = User;
    type Error = Arc<anyhow::Error>;

    async fn load(&self, keys: &[i64]) -> Result<HashMap<i64, Self::Value>, Self::Error> {
        tracing::debug!(count = keys.len(), "Batch loading users");
        let records = self.db.users().list_by_ids(keys).await.map_err(Arc::new)?;
        Ok(records.into_iter().map(|r| (r.id, to_user(r))).collect())
    }
}

pub struct CategoryLoader {
    db: Database,
}

impl CategoryLoader {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl Loader<i64> for CategoryLoader {
    type Value = Category;
    type Error = Arc<anyhow::Error>;

    async fn load(&self, keys: &[i64]) -> Result<HashMap<i64, Self::Value>, Self::Error> {
        tracing::debug!(count = keys.len(), "Batch loading categories");
        let records = self.db.categories().list_by_ids(keys).await.map_err(Arc::new)?;
        Ok(records.into_iter().map(|r| (r.id, Category::from(r))).collect())
    }
}

/// Authors keyed by book ID
pub struct BookAuthorsLoader {
    db: Database,
}

impl BookAuthorsLoader {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl Loader<i64> for BookAuthorsLoader {
    type Value = Vec<Author>;
    type Error = Arc<anyhow::Error>;

    async fn load(&self, keys: &[i64]) -> Result<HashMap<i64, Self::Value>, Self::Error> {
        tracing::debug!(books = keys.len(), "Batch loading authors");
        let rows = self.db.authors().list_for_books(keys).await.map_err(Arc::new)?;

        let mut result: HashMap<i64, Vec<Author>> = keys.iter().map(|&k| (k, Vec::new())).collect();
        for row in rows {
            if let Some(authors) = result.get_mut(&row.book_id) {
                authors.push(Author::from(row.author));
            }
        }
        Ok(result)
    }
}

/// Reviews keyed by book ID
pub struct BookReviewsLoader {
    db: Database,
}

impl BookReviewsLoader {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl Loader<i64> for BookReviewsLoader {
    type Value = Vec<Review>;
    type Error = Arc<anyhow::Error>;

    async fn load(&self, keys: &[i64]) -> Result<HashMap<i64, Self::Value>, Self::Error> {
        tracing::debug!(books = keys.len(), "Batch loading reviews");
        let records = self.db.reviews().list_for_books(keys).await.map_err(Arc::new)?;

        let mut result: HashMap<i64, Vec<Review>> = keys.iter().map(|&k| (k, Vec::new())).collect();
        for record in records {
            if let Some(reviews) = result.get_mut(&record.review_item_id) {
                reviews.push(to_review(record));
            }
        }
        Ok(result)
    }
}

/// Mean rating keyed by book ID; books without reviews have no entry
pub struct AverageRatingLoader {
    db: Database,
}

impl AverageRatingLoader {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl Loader<i64> for AverageRatingLoader {
    type Value = f64;
    type Error = Arc<anyhow::Error>;

    async fn load(&self, keys: &[i64]) -> Result<HashMap<i64, Self::Value>, Self::Error> {
        tracing::debug!(books = keys.len(), "Batch loading average ratings");
        self.db.reviews().average_ratings(keys).await.map_err(Arc::new)
    }
}

/// A user's review keyed by (book ID, user ID)
pub struct UserReviewLoader {
    db: Database,
}

impl UserReviewLoader {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl Loader<(i64, i64)> for UserReviewLoader {
    type Value = Review;
    type Error = Arc<anyhow::Error>;

    async fn load(
        &self,
        keys: &[(i64, i64)],
    ) -> Result<HashMap<(i64, i64), Self::Value>, Self::Error> {
        // One query per distinct user; in practice a request has one session user
        let mut books_by_user: HashMap<i64, Vec<i64>> = HashMap::new();
        for &(book_id, user_id) in keys {
            books_by_user.entry(user_id).or_default().push(book_id);
        }
        tracing::debug!(
            keys = keys.len(),
            users = books_by_user.len(),
            "Batch loading user reviews"
        );

        let mut result = HashMap::new();
        for (user_id, book_ids) in books_by_user {
            let records = self
                .db
                .reviews()
                .list_for_user_books(user_id, &book_ids)
                .await
                .map_err(Arc::new)?;
            for record in records {
                result.insert((record.review_item_id, record.reviewed_by_id), to_review(record));
            }
        }
        Ok(result)
    }
}
