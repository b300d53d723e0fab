pub mod reviews;
pub mod user;

pub use reviews::ReviewMutations;
pub use user::UserMutations;

pub(crate) mod prelude {
    pub(crate) use async_graphql::{Context, Object, Result};

    pub(crate) use crate::db::*;
    pub(crate) use crate::graphql::auth::{AuthExt, AuthGuard, CookieSettings};
    pub(crate) use crate::graphql::helpers::*;
    pub(crate) use crate::graphql::types::*;
    pub(crate) use crate::services::{AuthOutcome, AuthService};
}
