//! Rerank library crate (used by the server binary and integration tests).
//!
//! # Public API Surface
//!
//! - [`Config`], [`ConfigError`] - Server configuration
//! - [`Reranker`], [`RerankerConfig`], [`ScoreActivation`] - Cross-encoder scoring
//! - [`gateway`] - Axum router exposing `GET /health` and `POST /rerank`
//!
//! [`Reranker::stub`] builds a weightless scorer for tests and local development.

pub mod config;
pub mod constants;
pub mod embedding;
pub mod gateway;

pub use config::{Config, ConfigError};
pub use embedding::{Reranker, RerankerConfig, RerankerError, ScoreActivation};
pub use gateway::{
    HandlerState, RerankRequest, RerankResponse, create_router_with_state,
    error::{ErrorResponse, GatewayError},
};
