use super::prelude::*;

#[derive(Default)]
pub struct ReviewQueries;

#[Object]
impl ReviewQueries {
    /// Every review with the total count
    async fn reviews(&self, ctx: &Context<'_>) -> Result<AllReviews> {
        let db = ctx.data_unchecked::<Database>();
        let (records, total_count) = db.reviews().list_all().await.map_err(gql_err)?;

        Ok(AllReviews {
            reviews: records.into_iter().map(to_review).collect(),
            total_count,
        })
    }

    /// One user's review of one book
    async fn review(&self, ctx: &Context<'_>, book_id: i64, user_id: i64) -> Result<Option<Review>> {
        let db = ctx.data_unchecked::<Database>();
        let record = db.reviews().get(book_id, user_id).await.map_err(gql_err)?;
        Ok(record.map(to_review))
    }
}
