use std::sync::Arc;

use axum::{Json, extract::State, extract::rejection::JsonRejection};
use tracing::{debug, instrument};

use crate::gateway::error::GatewayError;
use crate::gateway::payload::{RerankRequest, RerankResponse};
use crate::gateway::state::HandlerState;

/// `POST /rerank`: scores every document in `docs` against `query`.
///
/// Scores come back in input order. An empty `docs` list short-circuits without
/// touching the model. Inference runs on the blocking pool.
#[instrument(skip(state, payload), fields(num_docs = tracing::field::Empty))]
pub async fn rerank_handler(
    State(state): State<HandlerState>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Json<RerankResponse>, GatewayError> {
    let Json(payload) = payload?;
    let request = parse_rerank_request(payload)?;
    tracing::Span::current().record("num_docs", request.docs.len());

    validate_doc_count(&request, state.max_docs)?;

    if request.docs.is_empty() {
        debug!("Empty document list, skipping inference");
        return Ok(Json(RerankResponse { scores: Vec::new() }));
    }

    let reranker = Arc::clone(&state.reranker);
    let scores = tokio::task::spawn_blocking(move || {
        reranker.score_documents(&request.query, &request.docs)
    })
    .await
    .map_err(|e| GatewayError::InternalError(format!("scoring task failed: {}", e)))??;

    debug!(
        num_scores = scores.len(),
        top_score = scores.iter().copied().reduce(f32::max),
        "Rerank complete"
    );

    Ok(Json(RerankResponse { scores }))
}

/// Decodes the request body, rejecting missing fields and non-string documents.
pub fn parse_rerank_request(payload: serde_json::Value) -> Result<RerankRequest, GatewayError> {
    serde_json::from_value(payload)
        .map_err(|e| GatewayError::InvalidRequest(format!("Invalid request schema: {}", e)))
}

pub fn validate_doc_count(
    request: &RerankRequest,
    max_docs: Option<usize>,
) -> Result<(), GatewayError> {
    match max_docs {
        Some(limit) if request.docs.len() > limit => Err(GatewayError::InvalidRequest(format!(
            "too many documents: {} exceeds limit of {}",
            request.docs.len(),
            limit
        ))),
        _ => Ok(()),
    }
}
