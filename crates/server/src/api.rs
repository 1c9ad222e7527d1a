//! HTTP API routes for cover resolution.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use shelfwise_core::book::Book;
use shelfwise_core::cover::{BookCover, CoverLookup, CoverStatsSnapshot};

use crate::AppState;

/// Query params for GET /api/covers and /api/covers/status
#[derive(Debug, serde::Deserialize)]
pub struct CoverQueryParams {
    pub title: Option<String>,
    pub author: Option<String>,
    pub fallback: Option<String>,
}

impl CoverQueryParams {
    fn title(&self) -> Result<&str, ApiError> {
        self.title
            .as_deref()
            .ok_or_else(|| ApiError::BadRequest("missing title parameter".to_string()))
    }
}

/// Batch requests above this size are rejected rather than fanned out.
const MAX_BATCH: usize = 1000;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/covers", get(resolve_cover))
        .route("/api/covers/status", get(cover_status))
        .route("/api/covers/batch", post(resolve_batch))
        .route("/api/covers/stats", get(stats))
        .with_state(state)
}

async fn resolve_cover(
    State(state): State<AppState>,
    Query(q): Query<CoverQueryParams>,
) -> Result<Json<CoverLookup>, ApiError> {
    let title = q.title()?;
    let author = q.author.as_deref().unwrap_or("");
    let cover = state.resolver.resolve(title, author, q.fallback.as_deref()).await;
    Ok(Json(cover))
}

async fn cover_status(
    State(state): State<AppState>,
    Query(q): Query<CoverQueryParams>,
) -> Result<Json<CoverLookup>, ApiError> {
    let title = q.title()?;
    let author = q.author.as_deref().unwrap_or("");
    Ok(Json(state.resolver.status(title, author, q.fallback.as_deref())))
}

async fn resolve_batch(
    State(state): State<AppState>,
    Json(books): Json<Vec<Book>>,
) -> Result<Json<Vec<BookCover>>, ApiError> {
    if books.len() > MAX_BATCH {
        return Err(ApiError::BadRequest(format!(
            "batch of {} books exceeds limit of {}",
            books.len(),
            MAX_BATCH
        )));
    }
    tracing::info!(books = books.len(), "Resolving cover batch");
    Ok(Json(state.resolver.resolve_books(&books, None).await))
}

async fn stats(State(state): State<AppState>) -> Json<CoverStatsSnapshot> {
    Json(state.resolver.stats())
}

#[derive(Debug)]
enum ApiError {
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = match &self {
            ApiError::BadRequest(s) => (StatusCode::BAD_REQUEST, s.clone()),
        };
        (status, body).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::BadRequest(s) => write!(f, "bad request: {}", s),
        }
    }
}
