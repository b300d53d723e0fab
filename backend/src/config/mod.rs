//! Application configuration management

use std::env;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host (for log output)
    pub host: Option<String>,

    /// Server port
    pub port: u16,

    /// SQLite path or `sqlite://` URL
    pub database_url: String,

    /// Origin allowed to make credentialed CORS requests
    pub cors_origin: String,

    /// Lifetime of a login session in days
    pub session_ttl_days: i64,

    /// Mark the session cookie `Secure`
    pub cookie_secure: bool,

    /// bcrypt work factor for new password hashes
    pub bcrypt_cost: u32,

    /// Upper bound on `limit` in the book listing
    pub max_page_size: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: None,
            port: 4000,
            database_url: "./data/bookshelf.db".to_string(),
            cors_origin: "http://localhost:3000".to_string(),
            session_ttl_days: 30,
            cookie_secure: false,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            max_page_size: 100,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        // Prefer DATABASE_PATH, fall back to DATABASE_URL
        let database_url = env::var("DATABASE_PATH")
            .or_else(|_| env::var("DATABASE_URL"))
            .unwrap_or(defaults.database_url);

        let production = env::var("APP_ENV")
            .map(|v| v.eq_ignore_ascii_case("production"))
            .unwrap_or(false);

        Ok(Self {
            host: env::var("HOST").ok(),

            port: env::var("PORT")
                .unwrap_or_else(|_| defaults.port.to_string())
                .parse()
                .context("Invalid PORT")?,

            database_url,

            cors_origin: env::var("CORS_ORIGIN").unwrap_or(defaults.cors_origin),

            session_ttl_days: env::var("SESSION_TTL_DAYS")
                .ok()
                .map(|v| v.parse())
                .transpose()
                .context("Invalid SESSION_TTL_DAYS")?
                .unwrap_or(defaults.session_ttl_days),

            cookie_secure: env::var("COOKIE_SECURE")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(production),

            bcrypt_cost: env::var("BCRYPT_COST")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.bcrypt_cost),

            max_page_size: env::var("MAX_PAGE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_page_size),
        })
    }
}
