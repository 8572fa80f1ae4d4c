//! HTTP server.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/` | Redirect to the configured landing page |
//! | `GET`  | `/search?regexp=<pattern>` | Search paths and rendered content (`path:` prefix for paths only) |
//! | `GET`  | `/health` | Health check (returns version) |
//! | `GET`  | `/status` | Sync loop status as JSON |
//! | `GET`  | `/static/*` | Static assets from the clone |
//! | `GET`  | `/{*path}` | Directory listing, rendered document, or 404 |
//!
//! # Error Contract
//!
//! A path with neither directory nor document → 404 with a search hint.
//! A search pattern that does not compile → 400. Any I/O failure → 500.
//! Filesystem work runs on the blocking pool; a failing request never
//! touches the sync loop.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::Config;
use crate::error::PageError;
use crate::models::PageResult;
use crate::page;
use crate::site::Site;
use crate::sync::{SyncHandle, SyncStatus};

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
struct AppState {
    site: Arc<Site>,
    sync: Option<SyncHandle>,
    landing_page: String,
}

/// Build the router. `sync` is `None` when no loop is running, in which
/// case `/status` answers 404.
pub fn router(config: &Config, site: Arc<Site>, sync: Option<SyncHandle>) -> Router {
    let static_root = config.store.static_root();
    let state = AppState {
        site,
        sync,
        landing_page: config.server.landing_page.trim_matches('/').to_string(),
    };

    Router::new()
        .route("/", get(handle_root))
        .route("/search", get(handle_search))
        .route("/health", get(handle_health))
        .route("/status", get(handle_status))
        .route_service("/favicon.ico", ServeFile::new(static_root.join("favicon.ico")))
        .nest_service("/static", ServeDir::new(static_root))
        .route("/{*path}", get(handle_page))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until the process is terminated.
pub async fn run_server(
    config: &Config,
    site: Arc<Site>,
    sync: Option<SyncHandle>,
) -> anyhow::Result<()> {
    let app = router(config, site, sync);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    info!(addr = %listener.local_addr()?, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

/// Error type that converts into an HTML response.
struct AppError {
    status: StatusCode,
    body: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, Html(self.body)).into_response()
    }
}

impl From<PageError> for AppError {
    fn from(err: PageError) -> Self {
        if err.is_client_error() {
            AppError {
                status: StatusCode::BAD_REQUEST,
                body: page::render_error(&err.to_string()),
            }
        } else {
            error!(error = %err, "request failed");
            internal(err.to_string())
        }
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: page::render_error(&message.into()),
    }
}

/// Run a filesystem-bound closure on the blocking pool.
async fn blocking<T, F>(f: F) -> Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, PageError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| internal(format!("task failed: {}", e)))?
        .map_err(AppError::from)
}

// ============ Handlers ============

async fn handle_root(State(state): State<AppState>) -> Response {
    let location = format!("/{}", state.landing_page);
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

#[derive(Deserialize)]
struct SearchParams {
    regexp: Option<String>,
}

async fn handle_search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Html<String>, AppError> {
    let Some(query) = params.regexp else {
        return Ok(Html(page::render_search(&crate::models::SearchResult {
            pattern: String::new(),
            path_only: false,
            paths: Vec::new(),
        })));
    };

    let site = state.site.clone();
    let result = blocking(move || site.search.search(&query, false)).await?;
    Ok(Html(page::render_search(&result)))
}

async fn handle_page(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Response, AppError> {
    let site = state.site.clone();
    let result = blocking(move || site.resolver.resolve(&path)).await?;

    let status = match result {
        PageResult::NotFound { .. } => StatusCode::NOT_FOUND,
        _ => StatusCode::OK,
    };
    Ok((status, Html(page::render(&result))).into_response())
}

/// JSON response body for `GET /health`.
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn handle_status(State(state): State<AppState>) -> Result<Json<SyncStatus>, StatusCode> {
    state
        .sync
        .as_ref()
        .map(|sync| Json(sync.status()))
        .ok_or(StatusCode::NOT_FOUND)
}
