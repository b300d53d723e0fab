//! GraphQL API
//!
//! Queries and mutations are split per domain under `queries/` and
//! `mutations/` and merged into the roots in `schema.rs`. The `orm` module
//! turns listing filters and sorts into SQL.

pub mod auth;
pub mod filters;
pub mod helpers;
mod loaders;
pub mod mutations;
pub mod orm;
pub mod queries;
mod schema;
pub mod types;

pub use auth::{AuthGuard, CookieSettings, SESSION_COOKIE_NAME, Session};
pub use schema::{BookshelfSchema, MutationRoot, QueryRoot, build_schema};
