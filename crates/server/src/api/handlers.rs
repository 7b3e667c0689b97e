use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use kaleido_core::{CacheStats, Config};

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs: state.uptime_secs(),
    })
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<Config> {
    Json(state.config().clone())
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub cache: CacheStats,
    pub uptime_secs: u64,
}

pub async fn stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    Json(StatsResponse {
        cache: state.cache().stats().await,
        uptime_secs: state.uptime_secs(),
    })
}

#[derive(Serialize)]
pub struct ClearCacheResponse {
    pub cleared: bool,
}

pub async fn clear_cache(State(state): State<Arc<AppState>>) -> Json<ClearCacheResponse> {
    state.cache().clear().await;
    info!("cache cleared by request");
    Json(ClearCacheResponse { cleared: true })
}
