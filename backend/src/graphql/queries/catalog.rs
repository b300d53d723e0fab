use super::prelude::*;

#[derive(Default)]
pub struct CatalogQueries;

#[Object]
impl CatalogQueries {
    /// Distinct language codes across the catalog, sorted
    async fn language_codes(&self, ctx: &Context<'_>) -> Result<Vec<String>> {
        let db = ctx.data_unchecked::<Database>();
        db.books().language_codes().await.map_err(gql_err)
    }

    async fn categories(&self, ctx: &Context<'_>) -> Result<Vec<Category>> {
        let db = ctx.data_unchecked::<Database>();
        let records = db.categories().list().await.map_err(gql_err)?;
        Ok(records.into_iter().map(Category::from).collect())
    }
}
