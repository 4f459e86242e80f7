use serde::{Deserialize, Serialize};

/// Body of `POST /rerank`. Both fields are required; `docs` may be empty.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct RerankRequest {
    pub query: String,
    pub docs: Vec<String>,
}

/// One score per entry of [`RerankRequest::docs`], in the same order.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct RerankResponse {
    pub scores: Vec<f32>,
}

#[derive(Serialize, Debug)]
pub struct HealthResponse {
    pub status: &'static str,
}
