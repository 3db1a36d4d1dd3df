//! LLM provider configuration.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use eventlens_llm::{LlmConfigStatus, LlmConfigUpdate};

use super::ApiResult;
use crate::state::{transport_for, AppState};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/llm/config", get(get_config).put(update_config))
}

async fn get_config(State(state): State<Arc<AppState>>) -> Json<LlmConfigStatus> {
    Json(state.llm_config.read().to_status())
}

/// Persist the update and switch providers for subsequent calls.
async fn update_config(
    State(state): State<Arc<AppState>>,
    Json(update): Json<LlmConfigUpdate>,
) -> ApiResult<LlmConfigStatus> {
    let mut config = state.llm_config.write();
    config.apply_update(&update);
    config.save()?;
    state.transport.replace(transport_for(&config));
    Ok(Json(config.to_status()))
}
