//! Keyphrase extraction for arbitrary text.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use eventlens_core::{EnhancedPhrase, Error, RawDocument};
use eventlens_enhance::{ExtractionOutcome, PhraseSource};
use serde::{Deserialize, Serialize};

use super::ApiResult;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/keyphrases", post(extract))
        .route("/keyphrases/batch", post(extract_batch))
}

#[derive(Deserialize)]
struct ExtractRequest {
    text: String,
}

#[derive(Deserialize)]
struct BatchRequest {
    documents: Vec<RawDocument>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DocumentKeyphrases {
    id: String,
    keyphrases: Vec<EnhancedPhrase>,
    source: PhraseSource,
}

async fn extract(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ExtractRequest>,
) -> Json<ExtractionOutcome> {
    Json(state.pipeline.extract(&req.text).await)
}

async fn extract_batch(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BatchRequest>,
) -> ApiResult<Vec<DocumentKeyphrases>> {
    if req.documents.iter().any(|d| d.id.trim().is_empty()) {
        return Err(Error::InvalidRequest("every document needs an id".into()).into());
    }

    let results = state
        .pipeline
        .extract_batch(&req.documents, state.config.batch_delay)
        .await
        .into_iter()
        .map(|(id, outcome)| DocumentKeyphrases {
            id,
            keyphrases: outcome.keyphrases,
            source: outcome.source,
        })
        .collect();
    Ok(Json(results))
}
