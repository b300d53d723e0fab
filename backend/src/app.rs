//! Application state and HTTP router construction.
//!
//! Used by `main` and by the integration tests to build the Axum app.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_graphql::http::GraphiQLSource;
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::get;
use axum_extra::extract::cookie::CookieJar;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::config::Config;
use crate::db::Database;
use crate::graphql::{BookshelfSchema, SESSION_COOKIE_NAME, build_schema};
use crate::services::{AuthConfig, AuthService};

/// Shared state for HTTP handlers (GraphQL, health routes).
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Database,
    pub schema: BookshelfSchema,
    pub auth: AuthService,
}

impl AppState {
    /// Wire services and the schema over a migrated database
    pub fn new(config: Arc<Config>, db: Database) -> Self {
        let auth = AuthService::new(db.clone(), AuthConfig::from(config.as_ref()));
        let schema = build_schema(db.clone(), auth.clone(), config.clone());

        Self {
            config,
            db,
            schema,
            auth,
        }
    }
}

/// Credentialed CORS for the configured frontend origin
fn cors_layer(config: &Config) -> Result<CorsLayer> {
    let origin = HeaderValue::from_str(&config.cors_origin)
        .with_context(|| format!("Invalid CORS_ORIGIN '{}'", config.cors_origin))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true))
}

/// Build the full Axum router: /graphql, health routes and layers.
/// Returns Router<()> (state fully applied) for use with axum::serve.
pub fn build_app(state: AppState) -> Result<Router<()>> {
    let cors = cors_layer(&state.config)?;

    Ok(Router::new()
        // Health endpoints (no auth required)
        .merge(api::health::router())
        .route("/graphql", get(graphiql).post(graphql_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

/// GraphQL query/mutation handler with session context
async fn graphql_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    req: GraphQLRequest,
) -> GraphQLResponse {
    let mut request = req.into_inner();

    if let Some(cookie) = jar.get(SESSION_COOKIE_NAME) {
        match state.auth.resolve_session(cookie.value()).await {
            Ok(Some(session)) => request = request.data(session),
            Ok(None) => tracing::debug!("Ignoring unknown or expired session cookie"),
            Err(e) => tracing::error!(error = %e, "Failed to resolve session"),
        }
    }

    state.schema.execute(request).await.into()
}

/// GraphiQL interactive playground (only for browsers)
async fn graphiql(headers: HeaderMap) -> impl IntoResponse {
    // Check if this is a browser request (accepts HTML)
    let accepts_html = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("text/html"))
        .unwrap_or(false);

    if accepts_html {
        axum::response::Html(GraphiQLSource::build().endpoint("/graphql").finish()).into_response()
    } else {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            axum::Json(serde_json::json!({
                "error": "GET requests are not supported for GraphQL queries. Use POST with Content-Type: application/json"
            })),
        )
            .into_response()
    }
}
