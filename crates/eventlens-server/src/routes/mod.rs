//! HTTP route handlers under `/api`.

pub mod events;
pub mod health;
pub mod keyphrases;
pub mod llm;
pub mod recommendations;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use eventlens_core::Error;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the main Axum router with all routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(health::routes())
        .merge(keyphrases::routes())
        .merge(events::routes())
        .merge(recommendations::routes())
        .merge(llm::routes())
}

/// Error response body: `{ "error": ..., <field>: <subject> }`.
pub struct ApiError {
    error: Error,
    /// `tag` or `query` echoed back for ranking failures.
    echo: Option<(&'static str, String)>,
}

impl ApiError {
    /// Ranking errors echo their tag or query back under `field`.
    pub fn ranking(error: Error, field: &'static str) -> Self {
        let echo = match &error {
            Error::RankingFailed { subject, .. } => Some((field, subject.clone())),
            _ => None,
        };
        Self { error, echo }
    }

    fn status(&self) -> StatusCode {
        match &self.error {
            Error::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::RankingFailed { .. }
            | Error::Llm(_)
            | Error::Timeout { .. }
            | Error::Parse(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        Self::ranking(error, "subject")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{}", self.error);
        }
        let mut body = serde_json::json!({ "error": self.error.to_string() });
        if let Some((field, subject)) = self.echo {
            body[field] = serde_json::Value::String(subject);
        }
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<Json<T>, ApiError>;
