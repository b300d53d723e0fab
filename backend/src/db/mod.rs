//! Database connection and repositories

pub mod authors;
pub mod books;
pub mod categories;
pub mod reviews;
pub mod sessions;
pub mod sqlite_helpers;
pub mod users;

use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};

pub use authors::{AuthorRecord, AuthorRepository};
pub use books::{BookListing, BookRecord, BookRepository, CreateBook};
pub use categories::{CategoryRecord, CategoryRepository};
pub use reviews::{CreateReview, ReviewRecord, ReviewRepository, UpdateReview};
pub use sessions::{SessionRecord, SessionRepository};
pub use users::{CreateUser, UserRecord, UserRepository};

/// Database wrapper providing connection pool access
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create a new database wrapper from an existing pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get the maximum connection pool size from environment or default
    fn get_max_connections() -> u32 {
        std::env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10)
    }

    /// Open (creating if needed) the SQLite database at `url`
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("Invalid database url '{}'", url))?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        if let Some(parent) = options.get_filename().parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create database directory {:?}", parent))?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(Self::get_max_connections())
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Single-connection in-memory database, used by tests.
    ///
    /// The connection never idles out, since dropping it discards the data.
    pub async fn connect_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Apply embedded migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    /// Get the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Get a users repository
    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.pool.clone())
    }

    /// Get a books repository
    pub fn books(&self) -> BookRepository {
        BookRepository::new(self.pool.clone())
    }

    /// Get an authors repository
    pub fn authors(&self) -> AuthorRepository {
        AuthorRepository::new(self.pool.clone())
    }

    /// Get a categories repository
    pub fn categories(&self) -> CategoryRepository {
        CategoryRepository::new(self.pool.clone())
    }

    /// Get a reviews repository
    pub fn reviews(&self) -> ReviewRepository {
        ReviewRepository::new(self.pool.clone())
    }

    /// Get a sessions repository
    pub fn sessions(&self) -> SessionRepository {
        SessionRepository::new(self.pool.clone())
    }
}
