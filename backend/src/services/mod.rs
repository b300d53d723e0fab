//! Application services

pub mod auth;

pub use auth::{AuthConfig, AuthOutcome, AuthService, FieldError, RegisterInput, Session};
