//! Event ingestion: extraction runs once per event and the result is stored.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use eventlens_core::Error;
use serde::Deserialize;
use tracing::info;

use super::ApiResult;
use crate::registry::{EventFilter, StoredEvent};
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/events", get(list_events).post(ingest_event))
        .route("/events/batch", post(ingest_batch))
        .route("/events/{id}", get(get_event))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventInput {
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub detail: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
}

#[derive(Deserialize)]
struct BatchRequest {
    events: Vec<EventInput>,
}

async fn ingest(state: &AppState, input: EventInput) -> Result<StoredEvent, Error> {
    if input.title.trim().is_empty() {
        return Err(Error::InvalidRequest("title is required".into()));
    }
    let id = input
        .id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let data = state
        .pipeline
        .build_event_key_data(&id, &input.title, &input.detail)
        .await;
    let stored = StoredEvent {
        data,
        location: input.location,
        format: input.format,
        updated_at: Utc::now(),
    };
    state.events.upsert(stored.clone());
    Ok(stored)
}

async fn ingest_event(
    State(state): State<Arc<AppState>>,
    Json(input): Json<EventInput>,
) -> ApiResult<StoredEvent> {
    Ok(Json(ingest(&state, input).await?))
}

/// Sequential ingestion with the configured delay between events.
async fn ingest_batch(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BatchRequest>,
) -> ApiResult<Vec<StoredEvent>> {
    if req.events.iter().any(|e| e.title.trim().is_empty()) {
        return Err(Error::InvalidRequest("every event needs a title".into()).into());
    }

    let total = req.events.len();
    let mut stored = Vec::with_capacity(total);
    for (i, input) in req.events.into_iter().enumerate() {
        if i > 0 && !state.config.batch_delay.is_zero() {
            tokio::time::sleep(state.config.batch_delay).await;
        }
        stored.push(ingest(&state, input).await?);
    }
    info!("Ingested {} events", total);
    Ok(Json(stored))
}

async fn get_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<StoredEvent> {
    state
        .events
        .get(&id)
        .map(Json)
        .ok_or_else(|| Error::NotFound(format!("event '{}'", id)).into())
}

async fn list_events(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<EventFilter>,
) -> Json<Vec<StoredEvent>> {
    Json(state.events.filtered(&filter))
}
