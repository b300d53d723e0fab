//! GraphQL schema definition
//!
//! Queries are public; review mutations require a session. The session is
//! attached per request by the HTTP handler.

use std::sync::Arc;

use async_graphql::dataloader::DataLoader;
use async_graphql::{EmptySubscription, MergedObject, Schema};

use crate::config::Config;
use crate::db::Database;
use crate::services::AuthService;

use super::auth::CookieSettings;
use super::loaders::{
    AverageRatingLoader, BookAuthorsLoader, BookLoader, BookReviewsLoader, CategoryLoader,
    UserLoader, UserReviewLoader,
};
use super::mutations::{ReviewMutations, UserMutations};
use super::queries::{BookQueries, CatalogQueries, ReviewQueries, UserQueries};

/// The GraphQL schema type
pub type BookshelfSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

#[derive(MergedObject, Default)]
pub struct QueryRoot(UserQueries, BookQueries, ReviewQueries, CatalogQueries);

#[derive(MergedObject, Default)]
pub struct MutationRoot(UserMutations, ReviewMutations);

/// Build the GraphQL schema with all resolvers
pub fn build_schema(db: Database, auth: AuthService, config: Arc<Config>) -> BookshelfSchema {
    let cookies = CookieSettings {
        secure: config.cookie_secure,
        max_age_days: config.session_ttl_days,
    };

    Schema::build(QueryRoot::default(), MutationRoot::default(), EmptySubscription)
        .data(DataLoader::new(BookLoader::new(db.clone()), tokio::spawn))
        .data(DataLoader::new(UserLoader::new(db.clone()), tokio::spawn))
        .data(DataLoader::new(CategoryLoader::new(db.clone()), tokio::spawn))
        .data(DataLoader::new(BookAuthorsLoader::new(db.clone()), tokio::spawn))
        .data(DataLoader::new(BookReviewsLoader::new(db.clone()), tokio::spawn))
        .data(DataLoader::new(AverageRatingLoader::new(db.clone()), tokio::spawn))
        .data(DataLoader::new(UserReviewLoader::new(db.clone()), tokio::spawn))
        .data(db)
        .data(auth)
        .data(cookies)
        .data(config)
        .finish()
}
