//! HTTP server mode for REST access to the cache and the pager

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::cli::runner::App;
use crate::details::DetailsService;
use crate::error::{Error, ErrorKind, Result};
use crate::local::{LocalDataSource, PokemonEntity};
use crate::paging::{LoadState, LoadType, Pager, PagerState};

/// App state shared across handlers
struct AppState {
    local: Arc<dyn LocalDataSource>,
    details: DetailsService,
    /// Loads run one at a time
    pager: Mutex<Pager>,
    pager_state: watch::Receiver<PagerState>,
    page_size: usize,
}

/// Query for `GET /pokemon`
#[derive(Debug, Deserialize)]
struct ListQuery {
    #[serde(default)]
    offset: usize,
    limit: Option<usize>,
}

/// Body of `POST /load/:type`
#[derive(Debug, Serialize)]
struct LoadResponse<'a> {
    state: PagerState,
    items: Vec<&'a PokemonEntity>,
}

/// Response wrapper
#[derive(Debug, Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn error(msg: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

/// Status code for a failed request
fn error_status(err: &Error) -> StatusCode {
    match err {
        Error::NotFound { .. } => StatusCode::NOT_FOUND,
        _ => match err.kind() {
            ErrorKind::Transport => StatusCode::BAD_GATEWAY,
            ErrorKind::Config => StatusCode::BAD_REQUEST,
            ErrorKind::Storage | ErrorKind::Other => StatusCode::INTERNAL_SERVER_ERROR,
        },
    }
}

fn error_response(err: &Error) -> Response {
    (
        error_status(err),
        Json(ApiResponse::<()>::error(err.to_string())),
    )
        .into_response()
}

/// Build the router over an [`App`]
pub fn router(app: &App) -> Router {
    let pager = app.pager();
    let state = AppState {
        local: app.local.clone(),
        details: app.details(),
        pager_state: pager.subscribe(),
        pager: Mutex::new(pager),
        page_size: app.config.paging.page_size,
    };

    // Build CORS layer - allow all origins for development
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/state", get(pager_state))
        .route("/pokemon", get(list_pokemon))
        .route("/pokemon/:name", get(show_pokemon))
        .route("/load/:load_type", post(run_load))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Start the HTTP server
pub async fn serve(app: App, port: u16) -> Result<()> {
    let router = router(&app);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Starting HTTP server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::config(format!("Failed to bind to port {port}: {e}")))?;

    axum::serve(listener, router)
        .await
        .map_err(|e| Error::Other(format!("Server error: {e}")))?;

    Ok(())
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Current pager state, without waiting for a running load
async fn pager_state(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let current = state.pager_state.borrow().clone();
    Json(ApiResponse::success(current))
}

/// Cached rows, straight from the local store
async fn list_pokemon(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Response {
    let limit = query.limit.unwrap_or(state.page_size);
    match state.local.pokemons(query.offset, limit).await {
        Ok(rows) => Json(ApiResponse::success(rows)).into_response(),
        Err(e) => error_response(&e),
    }
}

/// Joined details record, enriched on first access
async fn show_pokemon(State(state): State<Arc<AppState>>, Path(name): Path<String>) -> Response {
    match state.details.pokemon_and_detail(&name).await {
        Ok(record) => Json(ApiResponse::success(record)).into_response(),
        Err(e) => error_response(&e),
    }
}

/// Drive the pager: `refresh`, `prepend`, `append` or `retry`
async fn run_load(
    State(state): State<Arc<AppState>>,
    Path(load_type): Path<String>,
) -> Response {
    let mut pager = state.pager.lock().await;

    let failed = if load_type.eq_ignore_ascii_case("retry") {
        pager.retry().await;
        [LoadType::Refresh, LoadType::Prepend, LoadType::Append]
            .into_iter()
            .find(|lt| pager.state().get(*lt).is_error())
    } else {
        let load_type = match load_type.parse::<LoadType>() {
            Ok(load_type) => load_type,
            Err(e) => return error_response(&e),
        };
        pager.load(load_type).await;
        pager.state().get(load_type).is_error().then_some(load_type)
    };

    let current = pager.state();
    if let Some(load_type) = failed {
        if let LoadState::Error { message, .. } = current.get(load_type) {
            return (
                StatusCode::BAD_GATEWAY,
                Json(ApiResponse::<()>::error(message.clone())),
            )
                .into_response();
        }
    }

    Json(ApiResponse::success(LoadResponse {
        state: current,
        items: pager.items().collect(),
    }))
    .into_response()
}
