//! HTTP server
//!
//! - `GET /` GraphiQL playground
//! - `POST /query` GraphQL endpoint
//! - `GET /health` liveness and database check

use std::sync::Arc;

use anyhow::Result;
use async_graphql::http::GraphiQLSource;
use async_graphql::{ErrorExtensions, Pos};
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::db::Database;
use crate::db::seed::run_seeds;
use crate::error::ResolveError;
use crate::graphql::auth::{AuthUser, InvalidToken, parse_token};
use crate::graphql::operation::Operation;
use crate::graphql::schema::{RepographSchema, build_schema};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Database,
    pub schema: RepographSchema,
}

impl AppState {
    pub fn new(config: Config, db: Database) -> Self {
        let schema = build_schema(config.complexity_limit);
        Self {
            config: Arc::new(config),
            db,
            schema,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(graphiql))
        .route("/query", get(graphiql).post(graphql_handler))
        .route("/health", get(health))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Connect, prepare the database and serve until Ctrl-C.
pub async fn serve(config: Config) -> Result<()> {
    let db = Database::connect(&config.database_url, config.database_max_connections)
        .await?
        .with_sql_debug(config.sql_debug);

    let sync = db.sync_schema().await?;
    tracing::info!(
        tables_created = sync.tables_created.len(),
        columns_added = sync.columns_added.len(),
        "Schema synchronized"
    );

    if config.seed_demo_data {
        let seeded = run_seeds(&db).await;
        if !seeded.errors.is_empty() {
            tracing::warn!(errors = ?seeded.errors, "Demo data partially applied");
        }
    }

    let addr = config.bind_address();
    let app = router(AppState::new(config, db));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);
    tracing::info!("GraphQL playground: http://{}/", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Parse the Authorization header. No header is an anonymous request.
fn extract_user(headers: &HeaderMap) -> Result<Option<AuthUser>, InvalidToken> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let token = value.to_str().map_err(|_| InvalidToken)?;
    if token.is_empty() {
        return Ok(None);
    }
    parse_token(token).map(Some)
}

async fn graphiql() -> impl IntoResponse {
    Html(GraphiQLSource::build().endpoint("/query").finish())
}

async fn graphql_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    req: GraphQLRequest,
) -> Response {
    let mut request = req.into_inner();

    match extract_user(&headers) {
        Ok(Some(user)) => {
            tracing::debug!(user = %user.name, "Authenticated request");
            request = request.data(user);
        }
        Ok(None) => {}
        Err(e) => {
            tracing::info!(error = %e, "Rejected request with malformed token");
            return (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({ "reason": "invalid token" })),
            )
                .into_response();
        }
    }

    // The operation travels inside the request; when execution finishes or
    // the timeout drops it, its token is cancelled.
    request = request.data(Operation::new(&state.db, state.config.loader));

    let timeout = state.config.request_timeout;
    let response = match tokio::time::timeout(timeout, state.schema.execute(request)).await {
        Ok(response) => response,
        Err(_) => {
            tracing::warn!(timeout_ms = timeout.as_millis() as u64, "GraphQL operation timed out");
            async_graphql::Response::from_errors(vec![
                ResolveError::Cancelled
                    .extend()
                    .into_server_error(Pos::default()),
            ])
        }
    };

    GraphQLResponse::from(response).into_response()
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    database: bool,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = sqlx::query("SELECT 1")
        .fetch_one(state.db.pool())
        .await
        .is_ok();

    Json(HealthResponse {
        status: if database { "healthy" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        database,
    })
}
