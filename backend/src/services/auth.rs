//! Authentication service: registration, login and cookie sessions
//!
//! Provides:
//! - Registration input validation
//! - Password hashing with bcrypt
//! - Opaque session tokens; only their SHA-256 hash is stored

use anyhow::{Result, anyhow};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use bcrypt::{DEFAULT_COST, hash, verify};
use chrono::{Duration, Utc};
use sha2::{Digest, Sha256};

use crate::config::Config;
use crate::db::users::is_unique_violation;
use crate::db::{CreateUser, Database, UserRecord};

// ============================================================================
// Auth Types
// ============================================================================

/// Registration input
#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub nationality: Option<String>,
}

/// A user-facing validation failure tied to one input field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// The logged-in user attached to a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: i64,
    /// Raw cookie token
    pub token: String,
}

/// Result of register or login
#[derive(Debug)]
pub enum AuthOutcome {
    /// Credentials accepted and a session was opened
    Authenticated { user: UserRecord, session: Session },
    /// Input rejected; nothing was changed
    Rejected(FieldError),
}

// ============================================================================
// Configuration
// ============================================================================

/// Auth service configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Session lifetime in days (default: 30)
    pub session_ttl_days: i64,
    /// Bcrypt cost factor
    pub bcrypt_cost: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl_days: 30,
            bcrypt_cost: DEFAULT_COST,
        }
    }
}

impl From<&Config> for AuthConfig {
    fn from(config: &Config) -> Self {
        Self {
            session_ttl_days: config.session_ttl_days,
            bcrypt_cost: config.bcrypt_cost,
        }
    }
}

const MIN_EMAIL_LENGTH: usize = 6;
const MIN_PASSWORD_LENGTH: usize = 4;

/// Check registration input, returning the first problem found
pub fn validate_register(input: &RegisterInput) -> Option<FieldError> {
    if !input.email.contains('@') {
        return Some(FieldError::new("email", "invalid email"));
    }

    if input.email.chars().count() <= MIN_EMAIL_LENGTH {
        return Some(FieldError::new(
            "email",
            format!("length must be greater than {}", MIN_EMAIL_LENGTH),
        ));
    }

    if input.password.chars().count() <= MIN_PASSWORD_LENGTH {
        return Some(FieldError::new(
            "password",
            format!("length must be greater than {}", MIN_PASSWORD_LENGTH),
        ));
    }

    None
}

// ============================================================================
// Auth Service
// ============================================================================

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db: Database,
    config: AuthConfig,
}

impl AuthService {
    /// Create a new auth service
    pub fn new(db: Database, config: AuthConfig) -> Self {
        Self { db, config }
    }

    // ========================================================================
    // Registration and Login
    // ========================================================================

    /// Register a new user and open a session for them
    pub async fn register(&self, input: RegisterInput) -> Result<AuthOutcome> {
        if let Some(error) = validate_register(&input) {
            return Ok(AuthOutcome::Rejected(error));
        }

        let taken = || AuthOutcome::Rejected(FieldError::new("email", "email address already taken"));

        let users = self.db.users();
        if users.get_by_email(&input.email).await?.is_some() {
            return Ok(taken());
        }

        let password_hash = self.hash_password(&input.password)?;

        let user = match users
            .create(CreateUser {
                email: input.email,
                first_name: input.first_name,
                last_name: input.last_name,
                password_hash,
                nationality: input.nationality,
            })
            .await
        {
            Ok(user) => user,
            // Lost a race with a concurrent registration
            Err(e) if is_unique_violation(&e) => return Ok(taken()),
            Err(e) => return Err(e),
        };

        tracing::info!(user_id = user.id, "User registered");

        let session = self.open_session(user.id).await?;
        Ok(AuthOutcome::Authenticated { user, session })
    }

    /// Check credentials and open a session
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthOutcome> {
        let Some(user) = self.db.users().get_by_email(email).await? else {
            return Ok(AuthOutcome::Rejected(FieldError::new(
                "email",
                "a user with that email doesn't exist",
            )));
        };

        if !self.verify_password(password, &user.password)? {
            tracing::debug!(user_id = user.id, "Login rejected: wrong password");
            return Ok(AuthOutcome::Rejected(FieldError::new(
                "password",
                "incorrect password",
            )));
        }

        tracing::info!(user_id = user.id, "User logged in");

        let session = self.open_session(user.id).await?;
        Ok(AuthOutcome::Authenticated { user, session })
    }

    // ========================================================================
    // Sessions
    // ========================================================================

    /// Resolve a cookie token to its session; expired or unknown tokens give None
    pub async fn resolve_session(&self, token: &str) -> Result<Option<Session>> {
        let record = self.db.sessions().get_valid(&hash_token(token)).await?;
        Ok(record.map(|r| Session {
            user_id: r.user_id,
            token: token.to_string(),
        }))
    }

    /// End a session. Returns whether it existed.
    pub async fn logout(&self, session: &Session) -> Result<bool> {
        let removed = self.db.sessions().delete(&hash_token(&session.token)).await?;
        if removed {
            tracing::info!(user_id = session.user_id, "User logged out");
        }
        Ok(removed)
    }

    /// Purge expired sessions
    pub async fn cleanup_expired_sessions(&self) -> Result<u64> {
        self.db.sessions().delete_expired().await
    }

    /// Session lifetime, for the cookie's Max-Age
    pub fn session_ttl(&self) -> Duration {
        Duration::days(self.config.session_ttl_days)
    }

    async fn open_session(&self, user_id: i64) -> Result<Session> {
        let token = generate_token();
        let expires_at = Utc::now() + self.session_ttl();

        self.db
            .sessions()
            .create(&hash_token(&token), user_id, expires_at)
            .await?;

        Ok(Session { user_id, token })
    }

    // ========================================================================
    // Helper Methods
    // ========================================================================

    /// Hash a password with bcrypt
    fn hash_password(&self, password: &str) -> Result<String> {
        hash(password, self.config.bcrypt_cost)
            .map_err(|e| anyhow!("Failed to hash password: {}", e))
    }

    /// Verify a password against a hash
    fn verify_password(&self, password: &str, hash: &str) -> Result<bool> {
        verify(password, hash).map_err(|e| anyhow!("Failed to verify password: {}", e))
    }
}

/// Random opaque session token (256 bits, URL-safe base64)
fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Hash a token for storage (using SHA-256)
fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support;
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;

    async fn service() -> AuthService {
        let db = test_support::database().await;
        AuthService::new(
            db,
            AuthConfig {
                session_ttl_days: 30,
                bcrypt_cost: 4,
            },
        )
    }

    fn input(email: &str, password: &str) -> RegisterInput {
        RegisterInput {
            email: email.to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            password: password.to_string(),
            nationality: Some("British".to_string()),
        }
    }

    #[test]
    fn test_validate_register() {
        assert_eq!(validate_register(&input("ada@example.com", "secret")), None);
        assert_eq!(
            validate_register(&input("ada.example.com", "secret")),
            Some(FieldError::new("email", "invalid email"))
        );
        assert_eq!(
            validate_register(&input("a@b.cd", "secret")),
            Some(FieldError::new("email", "length must be greater than 6"))
        );
        assert_eq!(
            validate_register(&input("ada@example.com", "four")),
            Some(FieldError::new("password", "length must be greater than 4"))
        );
    }

    #[test]
    fn test_hash_token_is_stable_hex() {
        let hashed = hash_token("abc");
        assert_eq!(hashed.len(), 64);
        assert_eq!(hashed, hash_token("abc"));
        assert_ne!(hashed, hash_token("abd"));
        assert_ne!(generate_token(), generate_token());
    }

    #[tokio::test]
    async fn test_register_login_logout() {
        let auth = service().await;

        let outcome = auth.register(input("ada@example.com", "secret")).await.unwrap();
        let (user, session) = assert_matches!(
            outcome,
            AuthOutcome::Authenticated { user, session } => (user, session)
        );
        assert_eq!(session.user_id, user.id);
        assert_ne!(user.password, "secret");

        let resolved = auth.resolve_session(&session.token).await.unwrap();
        assert_eq!(resolved, Some(session.clone()));

        let login = auth.login("ada@example.com", "secret").await.unwrap();
        assert_matches!(login, AuthOutcome::Authenticated { user: u, .. } if u.id == user.id);

        assert!(auth.logout(&session).await.unwrap());
        assert_eq!(auth.resolve_session(&session.token).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_register_rejects_taken_email() {
        let auth = service().await;
        auth.register(input("ada@example.com", "secret")).await.unwrap();

        let outcome = auth.register(input("ADA@example.com", "secret")).await.unwrap();
        assert_matches!(
            outcome,
            AuthOutcome::Rejected(e) if e == FieldError::new("email", "email address already taken")
        );
    }

    #[tokio::test]
    async fn test_login_errors() {
        let auth = service().await;
        auth.register(input("ada@example.com", "secret")).await.unwrap();

        assert_matches!(
            auth.login("nobody@example.com", "secret").await.unwrap(),
            AuthOutcome::Rejected(e) if e.field == "email" && e.message == "a user with that email doesn't exist"
        );
        assert_matches!(
            auth.login("ada@example.com", "wrong").await.unwrap(),
            AuthOutcome::Rejected(e) if e.field == "password" && e.message == "incorrect password"
        );
    }

    #[tokio::test]
    async fn test_unknown_token_has_no_session() {
        let auth = service().await;
        assert_eq!(auth.resolve_session("not-a-token").await.unwrap(), None);
    }
}
