//! Cross-cutting, shared constants.
//!
//! Defaults live here so that configuration, the reranker, and the gateway agree on them.

/// Model identifier reported in logs when `RERANK_MODEL_ID` is not set.
pub const DEFAULT_MODEL_ID: &str = "BAAI/bge-reranker-base";

/// Model directory used when `RERANK_MODEL_PATH` is not set.
pub const DEFAULT_MODEL_PATH: &str = "./models/bge-reranker-base";

pub const DEFAULT_PORT: u16 = 5005;

/// Maximum tokens for a joint (query, document) sequence. Further capped at load time
/// by the checkpoint's position embeddings.
pub const DEFAULT_MAX_SEQ_LEN: usize = 512;

/// Pairs per forward pass inside a single scoring call.
pub const DEFAULT_BATCH_SIZE: usize = 32;

/// Upper bound on `docs` per `/rerank` request. `0` disables the check.
pub const DEFAULT_MAX_DOCS: usize = 1000;

pub const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Fixed payload returned by `GET /health`.
pub const HEALTH_STATUS_OK: &str = "OK";
