//! Bookshelf backend entry point
//!
//! All operations are exposed via GraphQL at /graphql.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bookshelf::config::Config;
use bookshelf::db::Database;
use bookshelf::{AppState, build_app};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bookshelf=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    tracing::info!("Starting Bookshelf backend");

    let config = Arc::new(Config::from_env()?);
    tracing::info!(
        port = config.port,
        cors_origin = %config.cors_origin,
        cookie_secure = config.cookie_secure,
        "Configuration loaded"
    );

    let db = Database::connect(&config.database_url).await?;
    db.migrate().await?;
    tracing::info!(database = %config.database_url, "Database connected and migrated");

    let state = AppState::new(config.clone(), db);

    match state.auth.cleanup_expired_sessions().await {
        Ok(removed) => tracing::info!(removed = removed, "Expired sessions purged"),
        Err(e) => tracing::warn!(error = %e, "Failed to purge expired sessions"),
    }

    let app = build_app(state)?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let host = config.host.as_deref().unwrap_or("localhost");
    tracing::info!("Listening on {}", addr);
    tracing::info!("GraphQL playground: http://{}:{}/graphql", host, config.port);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
