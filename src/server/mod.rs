mod backend;
mod queue;

pub use backend::{Backend, FileStore};
pub use queue::MutationQueue;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use axum::{
    Json, Router,
    extract::{Path, Request, State},
    http::{Method, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
};
use serde_json::{Value, json};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::model::{GraphState, link_from_value, node_from_value, note_from_value};

#[derive(Clone, Debug)]
pub struct ServeConfig {
    pub listen: SocketAddr,
    pub data_path: PathBuf,
    pub token: String,
}

#[derive(Clone)]
struct AppState {
    backend: Arc<dyn Backend>,
    token: Arc<str>,
}

pub async fn run(config: ServeConfig) -> anyhow::Result<()> {
    let store = FileStore::open(config.data_path.clone()).await?;
    let app = router(Arc::new(store), &config.token);

    let listener = tokio::net::TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("cannot bind {}", config.listen))?;
    tracing::info!("persistence service listening on {}", config.listen);

    axum::serve(listener, app).await.context("server failed")
}

pub fn router(backend: Arc<dyn Backend>, token: &str) -> Router {
    let state = AppState {
        backend,
        token: token.into(),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let api = Router::new()
        .route("/map", get(get_map))
        .route("/nodes", post(create_node))
        .route("/nodes/{id}", patch(update_note))
        .route("/links", post(create_link))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_bearer,
        ));

    Router::new()
        .route("/healthz", get(healthz))
        .merge(api)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Credential check runs before any handler logic; absence and mismatch are
/// indistinguishable to the caller.
async fn require_bearer(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let expected = format!("Bearer {}", state.token);
    let authorized = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value == expected);

    if !authorized {
        return error_response(StatusCode::UNAUTHORIZED, "missing or invalid credential");
    }
    next.run(request).await
}

async fn healthz() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

async fn get_map(State(state): State<AppState>) -> Response {
    match state.backend.get_graph().await {
        Ok(graph) => Json::<GraphState>(graph).into_response(),
        Err(error) => api_error_response(error),
    }
}

async fn create_node(State(state): State<AppState>, Json(payload): Json<Value>) -> Response {
    let node = match node_from_value(&payload) {
        Ok(node) => node,
        Err(message) => return error_response(StatusCode::BAD_REQUEST, &message),
    };

    match state.backend.insert_node(node).await {
        Ok(()) => created_response(),
        Err(error) => api_error_response(error),
    }
}

async fn create_link(State(state): State<AppState>, Json(payload): Json<Value>) -> Response {
    let link = match link_from_value(&payload) {
        Ok(link) => link,
        Err(message) => return error_response(StatusCode::BAD_REQUEST, &message),
    };

    match state.backend.insert_link(link).await {
        Ok(()) => created_response(),
        Err(error) => api_error_response(error),
    }
}

async fn update_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<Value>,
) -> Response {
    let text = match note_from_value(&payload) {
        Ok(text) => text,
        Err(message) => return error_response(StatusCode::BAD_REQUEST, &message),
    };

    match state.backend.update_node_note(&id, &text).await {
        Ok(()) => Json(json!({ "ok": true })).into_response(),
        Err(error) => api_error_response(error),
    }
}

fn created_response() -> Response {
    (StatusCode::CREATED, Json(json!({ "ok": true }))).into_response()
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn api_error_response(error: ApiError) -> Response {
    let status = match &error {
        ApiError::Validation(_) => StatusCode::BAD_REQUEST,
        ApiError::Conflict(_) => StatusCode::CONFLICT,
        ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        ApiError::Transient(_) => StatusCode::SERVICE_UNAVAILABLE,
        ApiError::Fatal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_response(status, &error.to_string())
}
