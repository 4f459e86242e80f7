use std::sync::Arc;

use crate::config::Config;
use crate::constants::{DEFAULT_MAX_BODY_BYTES, DEFAULT_MAX_DOCS};
use crate::embedding::Reranker;

#[derive(Clone)]
pub struct HandlerState {
    /// Loaded once at startup and shared read-only by every request.
    pub reranker: Arc<Reranker>,

    /// `None` disables the per-request document limit.
    pub max_docs: Option<usize>,

    pub max_body_bytes: usize,
}

impl HandlerState {
    pub fn new(reranker: Arc<Reranker>) -> Self {
        Self {
            reranker,
            max_docs: Some(DEFAULT_MAX_DOCS),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    pub fn from_config(reranker: Arc<Reranker>, config: &Config) -> Self {
        Self {
            reranker,
            max_docs: config.doc_limit(),
            max_body_bytes: config.max_body_bytes,
        }
    }

    pub fn with_max_docs(mut self, max_docs: Option<usize>) -> Self {
        self.max_docs = max_docs;
        self
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }
}
