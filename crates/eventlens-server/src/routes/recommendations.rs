//! Recommendations: the registry narrows candidates, the ranker orders them.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use eventlens_rank::{QueryRecommendations, TagRecommendations};
use serde::Deserialize;

use super::{ApiError, ApiResult};
use crate::registry::EventFilter;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/recommendations/tags", post(by_tags))
        .route("/recommendations/query", post(by_query))
}

#[derive(Deserialize)]
struct TagsRequest {
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    format: Option<String>,
}

#[derive(Deserialize)]
struct QueryRequest {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    format: Option<String>,
}

async fn by_tags(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TagsRequest>,
) -> ApiResult<Vec<TagRecommendations>> {
    let filter = EventFilter {
        location: req.location,
        format: req.format,
    };
    let candidates = state.events.candidates(&filter);

    state
        .ranker
        .rank_tags(&req.tags, &candidates)
        .await
        .map(Json)
        .map_err(|e| ApiError::ranking(e, "tag"))
}

async fn by_query(
    State(state): State<Arc<AppState>>,
    Json(req): Json<QueryRequest>,
) -> ApiResult<QueryRecommendations> {
    let filter = EventFilter {
        location: req.location,
        format: req.format,
    };
    let candidates = state.events.candidates(&filter);

    state
        .ranker
        .rank_query(req.message.as_deref(), &req.tags, &candidates)
        .await
        .map(Json)
        .map_err(|e| ApiError::ranking(e, "query"))
}
