//! Bookshelf backend: a GraphQL book catalog with reviews and cookie sessions.

pub mod api;
pub mod app;
pub mod config;
pub mod db;
pub mod graphql;
pub mod services;

pub use app::{AppState, build_app};
