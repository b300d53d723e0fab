//! GraphQL authentication
//!
//! The HTTP handler resolves the `bookshelf.sid` cookie to a [`Session`] and
//! attaches it to the request data. Resolvers read it through [`AuthExt`].
//!
//! ## Guards
//!
//! Use `AuthGuard` to require a logged-in user:
//!
//! ```ignore
//! #[graphql(guard = "AuthGuard")]
//! async fn create_review(&self, ctx: &Context<'_>, ...) -> Result<Review> { ... }
//! ```

use async_graphql::{Context, ErrorExtensions, Result};
use axum::http::header::SET_COOKIE;
use axum_extra::extract::cookie::{Cookie, SameSite};

pub use crate::services::Session;

/// Name of the session cookie
pub const SESSION_COOKIE_NAME: &str = "bookshelf.sid";

/// Attributes of the session cookie, shared through schema data
#[derive(Debug, Clone, Copy)]
pub struct CookieSettings {
    pub secure: bool,
    pub max_age_days: i64,
}

impl CookieSettings {
    /// Cookie carrying a freshly issued session token
    pub fn session_cookie(&self, token: &str) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE_NAME, token.to_string()))
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .path("/")
            .max_age(time::Duration::days(self.max_age_days))
            .build()
    }

    /// Cookie that makes the browser drop the session cookie
    pub fn cleared_cookie(&self) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE_NAME, ""))
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .path("/")
            .max_age(time::Duration::seconds(0))
            .build()
    }
}

/// Extension trait to get the session from GraphQL context
pub trait AuthExt {
    /// Get the session, or return an error if not logged in
    fn session(&self) -> Result<&Session>;

    /// Get the session if present
    fn try_session(&self) -> Option<&Session>;

    /// Queue a Set-Cookie header on the HTTP response
    fn set_cookie(&self, cookie: Cookie<'static>);
}

impl<'a> AuthExt for Context<'a> {
    fn session(&self) -> Result<&Session> {
        self.data_opt::<Session>().ok_or_else(|| {
            async_graphql::Error::new("not authenticated")
                .extend_with(|_, e| e.set("code", "UNAUTHORIZED"))
        })
    }

    fn try_session(&self) -> Option<&Session> {
        self.data_opt::<Session>()
    }

    fn set_cookie(&self, cookie: Cookie<'static>) {
        self.append_http_header(SET_COOKIE, cookie.to_string());
    }
}

/// Guard that requires a logged-in user.
pub struct AuthGuard;

impl async_graphql::Guard for AuthGuard {
    fn check(&self, ctx: &Context<'_>) -> impl std::future::Future<Output = Result<()>> + Send {
        let result = ctx.session().map(|_| ());
        async move { result }
    }
}
