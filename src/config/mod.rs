//! Environment-backed configuration.
//!
//! Most settings have defaults. Override with `RERANK_*` environment variables.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::fmt::Display;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

use crate::constants::{DEFAULT_MAX_BODY_BYTES, DEFAULT_MAX_DOCS, DEFAULT_PORT};
use crate::embedding::RerankerConfig;

/// Server configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `RERANK_*` overrides on top of defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port. Default: `5005`.
    pub port: u16,

    /// IP address to bind to. Default: `0.0.0.0` (all interfaces).
    pub bind_addr: IpAddr,

    /// Maximum documents accepted by one `/rerank` call. `0` means unlimited.
    pub max_docs: usize,

    /// Maximum request body size in bytes. Default: 2 MiB.
    pub max_body_bytes: usize,

    /// Cross-encoder model settings.
    pub reranker: RerankerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            max_docs: DEFAULT_MAX_DOCS,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            reranker: RerankerConfig::default(),
        }
    }
}

impl Config {
    const ENV_PORT: &'static str = "RERANK_PORT";
    const ENV_BIND_ADDR: &'static str = "RERANK_BIND_ADDR";
    const ENV_MAX_DOCS: &'static str = "RERANK_MAX_DOCS";
    const ENV_MAX_BODY_BYTES: &'static str = "RERANK_MAX_BODY_BYTES";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = Self::parse_port_from_env(defaults.port)?;
        let bind_addr = Self::parse_bind_addr_from_env(defaults.bind_addr)?;
        let max_docs = parse_env_var(Self::ENV_MAX_DOCS)?.unwrap_or(defaults.max_docs);
        let max_body_bytes =
            parse_env_var(Self::ENV_MAX_BODY_BYTES)?.unwrap_or(defaults.max_body_bytes);
        let reranker = RerankerConfig::from_env()?;

        Ok(Self {
            port,
            bind_addr,
            max_docs,
            max_body_bytes,
            reranker,
        })
    }

    /// Validates paths and basic invariants (does not load the model).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_body_bytes == 0 {
            return Err(ConfigError::InvalidValue {
                name: Self::ENV_MAX_BODY_BYTES,
                reason: "must be greater than zero".to_string(),
            });
        }

        self.reranker
            .validate()
            .map_err(|reason| ConfigError::InvalidReranker { reason })?;

        let path = &self.reranker.model_path;
        if !path.exists() {
            return Err(ConfigError::PathNotFound { path: path.clone() });
        }
        if !path.is_dir() {
            return Err(ConfigError::NotADirectory { path: path.clone() });
        }

        Ok(())
    }

    /// Returns `"{bind_addr}:{port}"` (useful for logging/binding).
    pub fn socket_addr(&self) -> String {
        match self.bind_addr {
            IpAddr::V4(addr) => format!("{}:{}", addr, self.port),
            IpAddr::V6(addr) => format!("[{}]:{}", addr, self.port),
        }
    }

    /// Document limit for `/rerank`, or `None` when `max_docs` is `0`.
    pub fn doc_limit(&self) -> Option<usize> {
        (self.max_docs > 0).then_some(self.max_docs)
    }

    fn parse_port_from_env(default: u16) -> Result<u16, ConfigError> {
        match env::var(Self::ENV_PORT) {
            Ok(value) => {
                let port: u16 = value.parse().map_err(|e| ConfigError::PortParseError {
                    value: value.clone(),
                    source: e,
                })?;

                if port == 0 {
                    return Err(ConfigError::InvalidPort { value });
                }

                Ok(port)
            }
            Err(_) => Ok(default),
        }
    }

    fn parse_bind_addr_from_env(default: IpAddr) -> Result<IpAddr, ConfigError> {
        match env::var(Self::ENV_BIND_ADDR) {
            Ok(value) => value
                .parse()
                .map_err(|e| ConfigError::InvalidBindAddr { value, source: e }),
            Err(_) => Ok(default),
        }
    }
}

/// Parses the variable `name`. Unset or blank yields `Ok(None)`; anything unparseable is
/// a [`ConfigError::InvalidValue`].
pub(crate) fn parse_env_var<T>(name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    let Ok(value) = env::var(name) else {
        return Ok(None);
    };

    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }

    value
        .parse()
        .map(Some)
        .map_err(|e| ConfigError::InvalidValue {
            name,
            reason: format!("'{}': {}", value, e),
        })
}
