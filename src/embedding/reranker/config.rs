use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::config::{ConfigError, parse_env_var};
use crate::constants::{
    DEFAULT_BATCH_SIZE, DEFAULT_MAX_SEQ_LEN, DEFAULT_MODEL_ID, DEFAULT_MODEL_PATH,
};

/// Function applied to the raw classifier logit before it is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScoreActivation {
    /// Logistic squash into `(0, 1)`.
    #[default]
    Sigmoid,
    /// Raw logit.
    Identity,
}

impl ScoreActivation {
    pub fn apply(self, logit: f32) -> f32 {
        match self {
            ScoreActivation::Sigmoid => 1.0 / (1.0 + (-logit).exp()),
            ScoreActivation::Identity => logit,
        }
    }
}

impl FromStr for ScoreActivation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sigmoid" => Ok(ScoreActivation::Sigmoid),
            "identity" | "none" | "raw" => Ok(ScoreActivation::Identity),
            other => Err(format!("unknown activation '{}'", other)),
        }
    }
}

impl fmt::Display for ScoreActivation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreActivation::Sigmoid => f.write_str("sigmoid"),
            ScoreActivation::Identity => f.write_str("identity"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RerankerConfig {
    /// Directory holding `config.json`, `model.safetensors` and `tokenizer.json`.
    pub model_path: PathBuf,

    /// Label used in logs; the weights always come from `model_path`.
    pub model_id: String,

    pub max_seq_len: usize,

    pub batch_size: usize,

    pub activation: ScoreActivation,
}

impl Default for RerankerConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            model_id: DEFAULT_MODEL_ID.to_string(),
            max_seq_len: DEFAULT_MAX_SEQ_LEN,
            batch_size: DEFAULT_BATCH_SIZE,
            activation: ScoreActivation::default(),
        }
    }
}

impl RerankerConfig {
    const ENV_MODEL_PATH: &'static str = "RERANK_MODEL_PATH";
    const ENV_MODEL_ID: &'static str = "RERANK_MODEL_ID";
    const ENV_MAX_SEQ_LEN: &'static str = "RERANK_MAX_SEQ_LEN";
    const ENV_BATCH_SIZE: &'static str = "RERANK_BATCH_SIZE";
    const ENV_ACTIVATION: &'static str = "RERANK_ACTIVATION";

    pub fn new<P: Into<PathBuf>>(model_path: P) -> Self {
        Self {
            model_path: model_path.into(),
            ..Default::default()
        }
    }

    pub fn with_model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }

    /// Pairs per forward pass. Zero is rejected by [`RerankerConfig::validate`].
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_max_seq_len(mut self, max_seq_len: usize) -> Self {
        self.max_seq_len = max_seq_len;
        self
    }

    pub fn with_activation(mut self, activation: ScoreActivation) -> Self {
        self.activation = activation;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.model_path.as_os_str().is_empty() {
            return Err("model_path cannot be empty".to_string());
        }

        if self.batch_size == 0 {
            return Err("batch_size must be greater than zero".to_string());
        }

        if self.max_seq_len == 0 {
            return Err("max_seq_len must be greater than zero".to_string());
        }

        Ok(())
    }

    /// Reads `RERANK_*` overrides. Blank values keep the default; unparseable or zero
    /// sizes and unknown activations are errors.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let model_path = std::env::var(Self::ENV_MODEL_PATH)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.model_path);

        let model_id = std::env::var(Self::ENV_MODEL_ID)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.model_id);

        let max_seq_len = Self::positive_from_env(Self::ENV_MAX_SEQ_LEN)?
            .unwrap_or(defaults.max_seq_len);
        let batch_size =
            Self::positive_from_env(Self::ENV_BATCH_SIZE)?.unwrap_or(defaults.batch_size);
        let activation = parse_env_var(Self::ENV_ACTIVATION)?.unwrap_or(defaults.activation);

        Ok(Self {
            model_path,
            model_id,
            max_seq_len,
            batch_size,
            activation,
        })
    }

    fn positive_from_env(name: &'static str) -> Result<Option<usize>, ConfigError> {
        match parse_env_var::<usize>(name)? {
            Some(0) => Err(ConfigError::InvalidValue {
                name,
                reason: "must be greater than zero".to_string(),
            }),
            other => Ok(other),
        }
    }
}
