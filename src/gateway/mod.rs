//! HTTP gateway (Axum) exposing the reranker.
//!
//! Routes: `GET /health` and `POST /rerank`. Every route sits behind a permissive CORS
//! layer and HTTP tracing.

pub mod error;
pub mod handler;
pub mod payload;
pub mod state;


use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use handler::rerank_handler;
pub use payload::{HealthResponse, RerankRequest, RerankResponse};
pub use state::HandlerState;

use crate::constants::HEALTH_STATUS_OK;

pub fn create_router_with_state(state: HandlerState) -> Router {
    let body_limit = state.max_body_bytes;

    Router::new()
        .route("/health", get(health_handler))
        .route("/rerank", post(rerank_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[tracing::instrument]
pub async fn health_handler() -> Response {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: HEALTH_STATUS_OK,
        }),
    )
        .into_response()
}
