//! Search and tag-discovery API handlers.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use kaleido_core::{ImageRecord, ResolvedTagSet, SearchError};

use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub character: Option<String>,
    #[serde(default)]
    pub series: Option<String>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    100
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub character: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series: Option<String>,
    pub page: u32,
    pub limit: u32,
    pub total_images: usize,
    pub total_pages: usize,
    pub images: Vec<ImageRecord>,
    pub source_counts: HashMap<String, usize>,
    pub cached: bool,
    pub duration_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct TagsParams {
    #[serde(default)]
    pub character: Option<String>,
    #[serde(default)]
    pub series: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TagsResponse {
    pub tags: ResolvedTagSet,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn bad_request(error: &SearchError) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/search
///
/// Aggregate image search across every configured source.
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let start = Instant::now();
    let character = params.character.as_deref().unwrap_or("");

    let result = state
        .orchestrator()
        .search(character, params.series.as_deref(), params.page, params.limit)
        .await
        .map_err(|e| bad_request(&e))?;

    Ok(Json(SearchResponse {
        character: character.trim().to_string(),
        series: params.series,
        page: params.page,
        limit: params.limit,
        total_images: result.total_images,
        total_pages: result.total_pages,
        images: result.images,
        source_counts: result.source_counts,
        cached: result.cached,
        duration_ms: start.elapsed().as_millis() as u64,
    }))
}

/// GET /api/v1/tags
///
/// Resolve per-source search tags without fetching images.
pub async fn discover_tags(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TagsParams>,
) -> Result<Json<TagsResponse>, ApiError> {
    let character = params.character.as_deref().unwrap_or("");

    let tags = state
        .orchestrator()
        .discover_tags(character, params.series.as_deref())
        .await
        .map_err(|e| bad_request(&e))?;

    Ok(Json(TagsResponse { tags }))
}
