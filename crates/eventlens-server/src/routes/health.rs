use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Health {
    status: &'static str,
    llm_available: bool,
    llm_provider: Option<String>,
    cached_entries: usize,
    events: usize,
    uptime_secs: u64,
}

async fn health(State(state): State<Arc<AppState>>) -> Json<Health> {
    let llm_provider = state
        .llm_config
        .read()
        .resolve_provider()
        .map(|(provider, _, _)| provider.to_string());

    Json(Health {
        status: "ok",
        llm_available: state.pipeline.enhancer_available(),
        llm_provider,
        cached_entries: state.pipeline.cache().len(),
        events: state.events.len(),
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}
