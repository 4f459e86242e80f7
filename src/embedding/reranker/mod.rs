pub mod config;
pub mod error;


pub use config::{RerankerConfig, ScoreActivation};
pub use error::RerankerError;

use error::candle_reason;

use candle_core::{Device, Tensor};
use tokenizers::{Encoding, Tokenizer};
use tracing::{debug, info};

use crate::embedding::classifier::SequenceClassifier;
use crate::embedding::device::select_device;
use crate::embedding::utils::load_pair_tokenizer;

/// Files a model directory must contain.
pub const REQUIRED_MODEL_FILES: [&str; 3] = ["config.json", "model.safetensors", "tokenizer.json"];

struct CrossEncoder {
    classifier: SequenceClassifier,
    tokenizer: Tokenizer,
}

/// Process-wide cross-encoder. Immutable after [`Reranker::load`], so it is shared
/// across request handlers behind an `Arc` without locking.
pub struct Reranker {
    device: Device,
    config: RerankerConfig,
    model: Option<CrossEncoder>,
}

impl std::fmt::Debug for Reranker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reranker")
            .field("device", &format!("{:?}", self.device))
            .field("config", &self.config)
            .field("model_loaded", &self.is_model_loaded())
            .finish()
    }
}

impl Reranker {
    /// Loads the model and tokenizer from `config.model_path`.
    ///
    /// Fails if the directory or any of [`REQUIRED_MODEL_FILES`] is missing, or if the
    /// weights cannot be mapped onto the selected device. `max_seq_len` is lowered to
    /// the checkpoint's position limit when it exceeds it.
    pub fn load(mut config: RerankerConfig) -> Result<Self, RerankerError> {
        if let Err(msg) = config.validate() {
            return Err(RerankerError::InvalidConfig { reason: msg });
        }

        let model_path = &config.model_path;
        if !model_path.is_dir() {
            return Err(RerankerError::ModelNotFound {
                path: model_path.clone(),
            });
        }

        for file in REQUIRED_MODEL_FILES {
            if !model_path.join(file).exists() {
                return Err(RerankerError::ModelLoadFailed {
                    reason: format!("Missing {} in {}", file, model_path.display()),
                });
            }
        }

        let device = select_device()?;
        debug!(?device, "Selected compute device for reranker");

        info!(
            model_id = %config.model_id,
            model_path = %model_path.display(),
            max_seq_len = config.max_seq_len,
            batch_size = config.batch_size,
            activation = %config.activation,
            "Loading reranker model"
        );

        let classifier = SequenceClassifier::load(model_path, &device).map_err(|e| {
            RerankerError::ModelLoadFailed {
                reason: format!(
                    "Failed to load classifier for {}: {}",
                    config.model_id,
                    candle_reason(&e)
                ),
            }
        })?;

        let max_seq_len = match classifier.max_input_len() {
            Some(limit) if limit < config.max_seq_len => {
                info!(
                    requested = config.max_seq_len,
                    limit, "Capping max_seq_len to the model's position embeddings"
                );
                limit
            }
            _ => config.max_seq_len,
        };

        let tokenizer = load_pair_tokenizer(model_path, max_seq_len).map_err(|e| {
            RerankerError::ModelLoadFailed {
                reason: format!("Failed to load tokenizer: {}", e),
            }
        })?;
        config.max_seq_len = max_seq_len;

        info!(
            model_id = %config.model_id,
            architecture = ?classifier.architecture(),
            max_seq_len = config.max_seq_len,
            "Reranker model loaded successfully"
        );

        Ok(Self {
            device,
            config,
            model: Some(CrossEncoder {
                classifier,
                tokenizer,
            }),
        })
    }

    /// Builds a reranker with no weights that scores by lexical overlap.
    ///
    /// Deterministic and dependency-free; used by tests and local development.
    pub fn stub() -> Self {
        Self {
            device: Device::Cpu,
            config: RerankerConfig::default(),
            model: None,
        }
    }

    /// Scores a single (query, document) pair.
    pub fn score(&self, query: &str, document: &str) -> Result<f32, RerankerError> {
        let scores = self.score_pairs(&[(query, document)])?;
        scores
            .into_iter()
            .next()
            .ok_or_else(|| RerankerError::InferenceFailed {
                reason: "model returned no score".to_string(),
            })
    }

    /// Pairs `query` with each document and scores the whole list in one call.
    ///
    /// The result has one score per document, in input order.
    pub fn score_documents<S: AsRef<str>>(
        &self,
        query: &str,
        documents: &[S],
    ) -> Result<Vec<f32>, RerankerError> {
        let pairs: Vec<(&str, &str)> = documents.iter().map(|d| (query, d.as_ref())).collect();
        self.score_pairs(&pairs)
    }

    /// Scores an ordered batch of pairs, returning scores in the same order.
    pub fn score_pairs(&self, pairs: &[(&str, &str)]) -> Result<Vec<f32>, RerankerError> {
        debug!(
            num_pairs = pairs.len(),
            model_loaded = self.is_model_loaded(),
            "Scoring query-document pairs"
        );

        if pairs.is_empty() {
            return Ok(Vec::new());
        }

        let Some(model) = &self.model else {
            let scores: Vec<f32> = pairs
                .iter()
                .map(|(query, document)| lexical_overlap_score(query, document))
                .collect();
            debug!(num_scores = scores.len(), "Computed scores (stub)");
            return Ok(scores);
        };

        let mut scores = Vec::with_capacity(pairs.len());
        for chunk in pairs.chunks(self.config.batch_size) {
            scores.extend(self.forward_chunk(model, chunk)?);
        }

        if scores.len() != pairs.len() {
            return Err(RerankerError::InferenceFailed {
                reason: format!(
                    "model returned {} scores for {} pairs",
                    scores.len(),
                    pairs.len()
                ),
            });
        }

        Ok(scores)
    }

    fn forward_chunk(
        &self,
        model: &CrossEncoder,
        chunk: &[(&str, &str)],
    ) -> Result<Vec<f32>, RerankerError> {
        let encodings = model
            .tokenizer
            .encode_batch(chunk.to_vec(), true)
            .map_err(|e| RerankerError::TokenizationFailed {
                reason: e.to_string(),
            })?;

        let input_ids = self.stack(&encodings, Encoding::get_ids)?;
        let type_ids = self.stack(&encodings, Encoding::get_type_ids)?;
        let attention_mask = self.stack(&encodings, Encoding::get_attention_mask)?;

        let logits = model
            .classifier
            .forward(&input_ids, &type_ids, &attention_mask)
            .map_err(|e| RerankerError::InferenceFailed {
                reason: candle_reason(&e),
            })?;

        let logits = logits.flatten_all()?.to_vec1::<f32>()?;
        if logits.len() != chunk.len() {
            return Err(RerankerError::InferenceFailed {
                reason: format!(
                    "expected {} logits, got {}",
                    chunk.len(),
                    logits.len()
                ),
            });
        }

        let activation = self.config.activation;
        Ok(logits.into_iter().map(|l| activation.apply(l)).collect())
    }

    /// Packs one per-token field of a padded batch into a `(batch, seq_len)` tensor.
    fn stack(
        &self,
        encodings: &[Encoding],
        field: fn(&Encoding) -> &[u32],
    ) -> Result<Tensor, RerankerError> {
        let seq_len = encodings.first().map(|e| e.len()).unwrap_or(0);
        let mut data = Vec::with_capacity(encodings.len() * seq_len);

        for encoding in encodings {
            let row = field(encoding);
            if row.len() != seq_len {
                return Err(RerankerError::TokenizationFailed {
                    reason: format!(
                        "ragged batch: expected {} tokens, got {}",
                        seq_len,
                        row.len()
                    ),
                });
            }
            data.extend_from_slice(row);
        }

        Ok(Tensor::from_vec(data, (encodings.len(), seq_len), &self.device)?)
    }

    pub fn is_model_loaded(&self) -> bool {
        self.model.is_some()
    }

    pub fn model_id(&self) -> &str {
        &self.config.model_id
    }

    pub fn config(&self) -> &RerankerConfig {
        &self.config
    }

}

const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had",
    "do", "does", "did", "will", "would", "could", "should", "may", "might", "must", "shall",
    "can", "to", "of", "in", "for", "on", "with", "at", "by", "from", "as", "into", "through",
    "and", "but", "if", "or", "because", "what", "which", "who", "whom", "this", "that",
    "these", "those", "am", "it", "its", "how", "why", "when", "where",
];

fn content_words(text: &str) -> std::collections::HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty() && !STOP_WORDS.contains(w))
        .map(str::to_string)
        .collect()
}

/// Stub relevance: recall and Jaccard overlap of content words, squashed into `[0, 1]`.
fn lexical_overlap_score(query: &str, document: &str) -> f32 {
    let query_words = content_words(query);
    let document_words = content_words(document);

    if query_words.is_empty() {
        let len_ratio = (query.len().min(document.len()) as f32)
            / (query.len().max(document.len()).max(1) as f32);
        return len_ratio * 0.3;
    }

    let matches = query_words.intersection(&document_words).count();
    let recall = matches as f32 / query_words.len() as f32;

    let union = query_words.union(&document_words).count();
    let jaccard = if union > 0 {
        matches as f32 / union as f32
    } else {
        0.0
    };

    let base_score = 0.6 * recall + 0.4 * jaccard;

    ScoreActivation::Sigmoid
        .apply(8.0 * (base_score - 0.5))
        .clamp(0.0, 1.0)
}
