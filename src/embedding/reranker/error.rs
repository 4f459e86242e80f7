use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RerankerError {
    #[error("reranker model not found at path: {path}")]
    ModelNotFound { path: PathBuf },

    #[error("failed to load reranker model: {reason}")]
    ModelLoadFailed { reason: String },

    #[error("reranker inference failed: {reason}")]
    InferenceFailed { reason: String },

    #[error("tokenization failed: {reason}")]
    TokenizationFailed { reason: String },

    #[error("invalid reranker configuration: {reason}")]
    InvalidConfig { reason: String },
}

/// Renders a candle error as one line.
///
/// With `RUST_BACKTRACE` set, candle appends the captured backtrace after the message;
/// that part is only logged, never returned.
pub(crate) fn candle_reason(err: &candle_core::Error) -> String {
    let rendered = err.to_string();
    match rendered.split_once('\n') {
        Some((message, _)) => {
            tracing::debug!(error = %rendered, "candle error detail");
            message.trim_end().to_string()
        }
        None => rendered,
    }
}

impl From<candle_core::Error> for RerankerError {
    fn from(err: candle_core::Error) -> Self {
        RerankerError::InferenceFailed {
            reason: candle_reason(&err),
        }
    }
}

impl From<std::io::Error> for RerankerError {
    fn from(err: std::io::Error) -> Self {
        RerankerError::ModelLoadFailed {
            reason: err.to_string(),
        }
    }
}
