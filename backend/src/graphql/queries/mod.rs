pub mod books;
pub mod catalog;
pub mod reviews;
pub mod user;

pub use books::BookQueries;
pub use catalog::CatalogQueries;
pub use reviews::ReviewQueries;
pub use user::UserQueries;

pub(crate) mod prelude {
    pub(crate) use std::sync::Arc;

    pub(crate) use async_graphql::{Context, Object, Result};

    pub(crate) use crate::config::Config;
    pub(crate) use crate::db::*;
    pub(crate) use crate::graphql::auth::AuthExt;
    pub(crate) use crate::graphql::filters::PaginatedBooksInput;
    pub(crate) use crate::graphql::helpers::*;
    pub(crate) use crate::graphql::types::*;
}
