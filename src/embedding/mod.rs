//! Cross-encoder model plumbing.
//!
//! - [`classifier`] wraps the candle sequence-classification heads.
//! - [`reranker`] owns the loaded model + tokenizer and scores (query, document) pairs.

/// Sequence-classification heads (BERT / RoBERTa / XLM-RoBERTa).
pub mod classifier;
/// Device selection (CPU / Metal / CUDA).
pub mod device;
#[cfg(test)]
pub(crate) mod fixtures;
/// Cross-encoder reranker.
pub mod reranker;
/// Tokenizer loading helpers.
pub mod utils;

pub use reranker::{Reranker, RerankerConfig, RerankerError, ScoreActivation};
