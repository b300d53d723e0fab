//! GraphQL type definitions
//!
//! Objects mirror the database records; relations resolve lazily through
//! `ComplexObject` impls.

use async_graphql::dataloader::DataLoader;
use async_graphql::{ComplexObject, Context, Result, SimpleObject};
use chrono::NaiveDate;

use crate::db::Database;

use super::auth::AuthExt;
use super::helpers::{gql_err, to_review};
use super::loaders::{
    AverageRatingLoader, BookAuthorsLoader, BookLoader, BookReviewsLoader, CategoryLoader,
    UserLoader, UserReviewLoader,
};

/// A catalog book
#[derive(Debug, Clone, SimpleObject)]
#[graphql(complex)]
pub struct Book {
    pub id: i64,
    pub title: String,
    /// Stored cover, or the OpenLibrary cover for the ISBN
    pub book_cover_url: String,
    pub isbn: String,
    pub isbn13: String,
    pub language_code: String,
    pub num_pages: i64,
    pub publication_date: NaiveDate,
    pub publisher: String,
    pub goodreads_ratings: i64,
    pub category_id: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

#[ComplexObject]
impl Book {
    async fn authors(&self, ctx: &Context<'_>) -> Result<Vec<Author>> {
        let loader = ctx.data_unchecked::<DataLoader<BookAuthorsLoader>>();
        let authors = loader.load_one(self.id).await.map_err(gql_err)?;
        Ok(authors.unwrap_or_default())
    }

    async fn reviews(&self, ctx: &Context<'_>) -> Result<Vec<Review>> {
        let loader = ctx.data_unchecked::<DataLoader<BookReviewsLoader>>();
        let reviews = loader.load_one(self.id).await.map_err(gql_err)?;
        Ok(reviews.unwrap_or_default())
    }

    async fn category(&self, ctx: &Context<'_>) -> Result<Option<Category>> {
        let Some(category_id) = self.category_id else {
            return Ok(None);
        };
        let loader = ctx.data_unchecked::<DataLoader<CategoryLoader>>();
        loader.load_one(category_id).await.map_err(gql_err)
    }

    /// The logged-in user's review of this book
    async fn your_review(&self, ctx: &Context<'_>) -> Result<Option<Review>> {
        let Some(session) = ctx.try_session() else {
            return Ok(None);
        };
        let loader = ctx.data_unchecked::<DataLoader<UserReviewLoader>>();
        loader
            .load_one((self.id, session.user_id))
            .await
            .map_err(gql_err)
    }

    /// Mean review rating, null when there are no reviews
    async fn average_rating(&self, ctx: &Context<'_>) -> Result<Option<f64>> {
        let loader = ctx.data_unchecked::<DataLoader<AverageRatingLoader>>();
        loader.load_one(self.id).await.map_err(gql_err)
    }
}

#[derive(Debug, Clone, SimpleObject)]
pub struct Author {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, SimpleObject)]
pub struct Category {
    pub id: i64,
    pub category_name: String,
    pub created_at: String,
    pub updated_at: String,
}

/// A user's rating of a book
#[derive(Debug, Clone, SimpleObject)]
#[graphql(complex)]
pub struct Review {
    /// ID of the reviewed book
    pub review_item_id: i64,
    /// ID of the reviewing user
    pub reviewed_by_id: i64,
    pub rating: f64,
    pub text: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[ComplexObject]
impl Review {
    async fn review_item(&self, ctx: &Context<'_>) -> Result<Option<Book>> {
        let loader = ctx.data_unchecked::<DataLoader<BookLoader>>();
        loader.load_one(self.review_item_id).await.map_err(gql_err)
    }

    async fn reviewed_by(&self, ctx: &Context<'_>) -> Result<Option<User>> {
        let loader = ctx.data_unchecked::<DataLoader<UserLoader>>();
        loader.load_one(self.reviewed_by_id).await.map_err(gql_err)
    }
}

/// A registered user. The password hash is never exposed.
#[derive(Debug, Clone, SimpleObject)]
#[graphql(complex)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub nationality: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[ComplexObject]
impl User {
    async fn reviews(&self, ctx: &Context<'_>) -> Result<Vec<Review>> {
        let db = ctx.data_unchecked::<Database>();
        let records = db.reviews().list_for_user(self.id).await.map_err(gql_err)?;
        Ok(records.into_iter().map(to_review).collect())
    }
}

/// Validation failure on one input field
#[derive(Debug, Clone, SimpleObject)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Result of register and login
#[derive(Debug, Clone, Default, SimpleObject)]
pub struct UserResponse {
    pub errors: Option<Vec<FieldError>>,
    pub user: Option<User>,
}

#[derive(Debug, Clone, SimpleObject)]
pub struct PaginatedBooks {
    pub books: Vec<Book>,
    /// Matches across all pages
    pub total_count: i64,
}

#[derive(Debug, Clone, SimpleObject)]
pub struct AllReviews {
    pub reviews: Vec<Review>,
    pub total_count: i64,
}
