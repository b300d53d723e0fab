//! Review mutations, all scoped to the logged-in user

use async_graphql::{ErrorExtensions, InputObject};

use super::prelude::*;
use crate::db::users::is_unique_violation;

const MAX_RATING: f64 = 5.0;

#[derive(Debug, InputObject)]
pub struct ReviewInput {
    pub rating: f64,
    pub text: Option<String>,
}

impl ReviewInput {
    fn validate(&self) -> Result<()> {
        if !self.rating.is_finite() || !(0.0..=MAX_RATING).contains(&self.rating) {
            return Err(async_graphql::Error::new(format!(
                "rating must be between 0 and {}",
                MAX_RATING
            ))
            .extend_with(|_, e| e.set("code", "BAD_USER_INPUT")));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct ReviewMutations;

#[Object]
impl ReviewMutations {
    /// Review a book as the logged-in user
    #[graphql(guard = "AuthGuard")]
    async fn create_review(&self, ctx: &Context<'_>, book_id: i64, input: ReviewInput) -> Result<Review> {
        input.validate()?;
        let session = ctx.session()?;
        let db = ctx.data_unchecked::<Database>();

        if db.books().get_by_id(book_id).await.map_err(gql_err)?.is_none() {
            return Err(async_graphql::Error::new("book not found")
                .extend_with(|_, e| e.set("code", "NOT_FOUND")));
        }

        let record = db
            .reviews()
            .create(CreateReview {
                book_id,
                user_id: session.user_id,
                rating: input.rating,
                text: input.text,
            })
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    async_graphql::Error::new("you have already reviewed this book")
                        .extend_with(|_, e| e.set("code", "CONFLICT"))
                } else {
                    gql_err(e)
                }
            })?;

        tracing::info!(user_id = session.user_id, book_id = book_id, "Review created");
        Ok(to_review(record))
    }

    /// Update the logged-in user's review. Null if they have not reviewed the book.
    #[graphql(guard = "AuthGuard")]
    async fn update_review(
        &self,
        ctx: &Context<'_>,
        book_id: i64,
        input: ReviewInput,
    ) -> Result<Option<Review>> {
        input.validate()?;
        let session = ctx.session()?;
        let db = ctx.data_unchecked::<Database>();

        let record = db
            .reviews()
            .update(
                book_id,
                session.user_id,
                UpdateReview {
                    rating: input.rating,
                    text: input.text,
                },
            )
            .await
            .map_err(gql_err)?;

        Ok(record.map(to_review))
    }

    /// Delete the logged-in user's review of a book
    #[graphql(guard = "AuthGuard")]
    async fn delete_review(&self, ctx: &Context<'_>, book_id: i64) -> Result<bool> {
        let session = ctx.session()?;
        let db = ctx.data_unchecked::<Database>();

        match db.reviews().delete(book_id, session.user_id).await {
            Ok(removed) => {
                tracing::info!(user_id = session.user_id, book_id = book_id, removed = removed, "Review deleted");
                Ok(true)
            }
            Err(e) => {
                tracing::error!(user_id = session.user_id, book_id = book_id, error = %e, "Failed to delete review");
                Ok(false)
            }
        }
    }
}
