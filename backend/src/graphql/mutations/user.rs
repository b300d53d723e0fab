//! Account mutations: register, login and logout
//!
//! None of these require a session. Successful register/login set the
//! session cookie on the HTTP response; logout clears it.

use async_graphql::InputObject;

use super::prelude::*;
use crate::services::RegisterInput;

/// Input for user registration
#[derive(Debug, InputObject)]
pub struct RegisterOptions {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// Password (will be hashed)
    pub password: String,
    pub nationality: Option<String>,
}

impl From<RegisterOptions> for RegisterInput {
    fn from(options: RegisterOptions) -> Self {
        Self {
            email: options.email,
            first_name: options.first_name,
            last_name: options.last_name,
            password: options.password,
            nationality: options.nationality,
        }
    }
}

/// Turn an auth outcome into a response, setting the cookie on success.
fn respond(ctx: &Context<'_>, outcome: AuthOutcome) -> UserResponse {
    match outcome {
        AuthOutcome::Authenticated { user, session } => {
            let cookies = ctx.data_unchecked::<CookieSettings>();
            ctx.set_cookie(cookies.session_cookie(&session.token));
            UserResponse {
                errors: None,
                user: Some(to_user(user)),
            }
        }
        AuthOutcome::Rejected(error) => {
            tracing::debug!(field = %error.field, message = %error.message, "Auth input rejected");
            UserResponse {
                errors: Some(vec![error.into()]),
                user: None,
            }
        }
    }
}

#[derive(Default)]
pub struct UserMutations;

#[Object]
impl UserMutations {
    /// Create an account and log it in
    async fn register(&self, ctx: &Context<'_>, options: RegisterOptions) -> Result<UserResponse> {
        let auth = ctx.data_unchecked::<AuthService>();
        let outcome = auth.register(options.into()).await.map_err(|e| {
            tracing::error!(error = %e, "Registration failed");
            gql_err(e)
        })?;

        Ok(respond(ctx, outcome))
    }

    /// Log in with email and password
    async fn login(&self, ctx: &Context<'_>, email: String, password: String) -> Result<UserResponse> {
        let auth = ctx.data_unchecked::<AuthService>();
        let outcome = auth.login(&email, &password).await.map_err(|e| {
            tracing::error!(error = %e, "Login failed");
            gql_err(e)
        })?;

        Ok(respond(ctx, outcome))
    }

    /// End the current session and clear the cookie. False if the session store failed.
    async fn logout(&self, ctx: &Context<'_>) -> bool {
        let cookies = ctx.data_unchecked::<CookieSettings>();
        ctx.set_cookie(cookies.cleared_cookie());

        let Some(session) = ctx.try_session() else {
            return true;
        };

        let auth = ctx.data_unchecked::<AuthService>();
        match auth.logout(session).await {
            Ok(_) => true,
            Err(e) => {
                tracing::error!(user_id = session.user_id, error = %e, "Failed to end session");
                false
            }
        }
    }
}
