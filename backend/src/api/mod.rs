//! HTTP routes outside GraphQL
//!
//! The primary API is GraphQL at /graphql.

pub mod health;
