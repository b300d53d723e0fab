use super::prelude::*;

#[derive(Default)]
pub struct BookQueries;

#[Object]
impl BookQueries {
    /// Paginated book listing with search, filters and sorting
    async fn books(&self, ctx: &Context<'_>, options: PaginatedBooksInput) -> Result<PaginatedBooks> {
        let db = ctx.data_unchecked::<Database>();
        let config = ctx.data_unchecked::<Arc<Config>>();

        let (limit, offset) = options.page(config.max_page_size);
        let listing = BookListing {
            search: options.search_query.clone(),
            filter: options.compiled_filter(),
            order_by: options.order_by(),
            limit,
            offset,
        };

        let (records, total_count) = db.books().list(&listing).await.map_err(|e| {
            tracing::error!(error = %e, "Book listing failed");
            gql_err(e)
        })?;

        Ok(PaginatedBooks {
            books: records.into_iter().map(to_book).collect(),
            total_count,
        })
    }

    /// A single book
    async fn book(&self, ctx: &Context<'_>, id: i64) -> Result<Option<Book>> {
        let db = ctx.data_unchecked::<Database>();
        let record = db.books().get_by_id(id).await.map_err(gql_err)?;
        Ok(record.map(to_book))
    }
}
