use super::prelude::*;

#[derive(Default)]
pub struct UserQueries;

#[Object]
impl UserQueries {
    /// The logged-in user, or null when not logged in
    async fn me(&self, ctx: &Context<'_>) -> Result<Option<User>> {
        let Some(session) = ctx.try_session() else {
            return Ok(None);
        };

        let db = ctx.data_unchecked::<Database>();
        let record = db.users().get_by_id(session.user_id).await.map_err(gql_err)?;
        Ok(record.map(to_user))
    }
}
