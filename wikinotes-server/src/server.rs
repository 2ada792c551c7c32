use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use wikinotes_core::{NewPage, PageId, PageUpdate, SqliteStore, Wiki};

use crate::{config::ServerConfig, error::ApiError};

#[derive(Clone)]
pub struct AppState {
    pub wiki: Wiki,
}

impl AppState {
    pub fn new(wiki: Wiki) -> Self {
        Self { wiki }
    }
}

pub async fn serve(config: ServerConfig) -> Result<()> {
    let db_path = config.db_path.clone();
    let store = tokio::task::spawn_blocking(move || SqliteStore::open(db_path)).await??;
    let wiki = Wiki::new(Arc::new(store));

    if config.reindex_on_start {
        let wiki = wiki.clone();
        let report = tokio::task::spawn_blocking(move || wiki.reindex()).await??;
        info!(
            pages = report.scanned,
            failed = report.failed,
            "startup reindex finished"
        );
    }

    let app = router(AppState::new(wiki))
        .layer(cors_layer(&config.cors_origins))
        .layer(TraceLayer::new_for_http());

    info!(addr = %config.listen_addr, db = %config.db_path.display(), "wikinotes listening");
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

/// API routes, without the CORS and tracing layers.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/pages", get(list_pages))
        .route("/api/page", post(create_page))
        .route("/api/page/by-name/{name}", get(get_page_by_name))
        .route(
            "/api/page/{id}",
            get(get_page).patch(update_page).delete(delete_page),
        )
        .route("/api/page/{id}/backlinks", get(backlinks))
        .route("/api/page/{id}/links", get(forward_links))
        .route("/api/page/{id}/link-status", get(link_status))
        .route("/api/graph", get(graph))
        .route("/api/reindex", post(reindex))
        .with_state(state)
}

pub fn cors_layer(origins: &[HeaderValue]) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins.iter().cloned()))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ORIGIN,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::AUTHORIZATION,
        ])
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutting down");
    }
}

/// Run a core call on the blocking pool; the store does synchronous I/O.
async fn with_wiki<T, F>(state: &AppState, call: F) -> Result<T, ApiError>
where
    F: FnOnce(&Wiki) -> wikinotes_core::error::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let wiki = state.wiki.clone();
    tokio::task::spawn_blocking(move || call(&wiki))
        .await
        .map_err(|err| ApiError::Internal(format!("worker task failed: {err}")))?
        .map_err(ApiError::from)
}

fn parse_page_id(raw: &str) -> Result<PageId, ApiError> {
    raw.parse::<i64>()
        .map(PageId)
        .map_err(|_| ApiError::BadRequest("Invalid page ID".into()))
}

async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn list_pages(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let pages = with_wiki(&state, |wiki| wiki.list_pages()).await?;
    Ok(Json(pages))
}

async fn get_page(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_page_id(&id)?;
    let page = with_wiki(&state, move |wiki| wiki.get_page(id)).await?;
    Ok(Json(page))
}

async fn get_page_by_name(
    Path(name): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let page = with_wiki(&state, move |wiki| wiki.get_page_by_name(&name)).await?;
    Ok(Json(page))
}

async fn create_page(
    State(state): State<AppState>,
    payload: Result<Json<NewPage>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(new_page) = payload.map_err(|err| ApiError::BadRequest(err.body_text()))?;
    let page = with_wiki(&state, move |wiki| wiki.create_page(new_page)).await?;
    Ok((StatusCode::CREATED, Json(page)))
}

async fn update_page(
    Path(id): Path<String>,
    State(state): State<AppState>,
    payload: Result<Json<PageUpdate>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_page_id(&id)?;
    let Json(update) = payload.map_err(|err| ApiError::BadRequest(err.body_text()))?;
    let page = with_wiki(&state, move |wiki| wiki.update_page(id, update)).await?;
    Ok(Json(page))
}

async fn delete_page(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_page_id(&id)?;
    with_wiki(&state, move |wiki| wiki.delete_page(id)).await?;
    Ok(Json(json!({ "message": "Page deleted successfully" })))
}

async fn backlinks(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_page_id(&id)?;
    let pages = with_wiki(&state, move |wiki| wiki.backlinks(id)).await?;
    Ok(Json(pages))
}

async fn forward_links(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_page_id(&id)?;
    let pages = with_wiki(&state, move |wiki| wiki.forward_links(id)).await?;
    Ok(Json(pages))
}

async fn link_status(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_page_id(&id)?;
    let links = with_wiki(&state, move |wiki| wiki.link_status(id)).await?;
    Ok(Json(links))
}

async fn graph(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let graph = with_wiki(&state, |wiki| wiki.graph()).await?;
    Ok(Json(graph))
}

async fn reindex(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let report = with_wiki(&state, |wiki| wiki.reindex()).await?;
    Ok(Json(report))
}
