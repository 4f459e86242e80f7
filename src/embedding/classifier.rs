use candle::{DType, Device, Result, Tensor};
use candle_core as candle;
use candle_core::IndexOp;
use candle_nn::{Linear, Module, VarBuilder};
use candle_transformers::models::bert::{self, BertModel};
use candle_transformers::models::xlm_roberta::{self, XLMRobertaForSequenceClassification};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Cross-encoders emit a single relevance logit per pair.
const NUM_LABELS: usize = 1;

/// Tensor prefixes a BERT checkpoint may nest its encoder under.
const BERT_PREFIXES: [&str; 2] = ["bert", ""];

fn scoped<'a>(vb: &VarBuilder<'a>, prefix: &str) -> VarBuilder<'a> {
    if prefix.is_empty() {
        vb.clone()
    } else {
        vb.pp(prefix)
    }
}

struct BertForSequenceClassification {
    bert: BertModel,
    pooler: Option<Linear>,
    classifier: Linear,
}

impl BertForSequenceClassification {
    fn load(vb: VarBuilder, config: &bert::Config) -> Result<Self> {
        let prefix = BERT_PREFIXES
            .into_iter()
            .find(|prefix| {
                scoped(&vb, prefix).contains_tensor("embeddings.word_embeddings.weight")
            })
            .unwrap_or("");
        let encoder_vb = scoped(&vb, prefix);

        let bert = BertModel::load(encoder_vb.clone(), config)?;

        // Exports stripped of the pooler score the raw [CLS] state.
        let pooler = if encoder_vb.contains_tensor("pooler.dense.weight") {
            Some(candle_nn::linear(
                config.hidden_size,
                config.hidden_size,
                encoder_vb.pp("pooler").pp("dense"),
            )?)
        } else {
            debug!(prefix, "No pooler weights found, classifying [CLS] directly");
            None
        };

        let classifier = candle_nn::linear(config.hidden_size, NUM_LABELS, vb.pp("classifier"))?;

        Ok(Self {
            bert,
            pooler,
            classifier,
        })
    }

    fn forward(
        &self,
        input_ids: &Tensor,
        token_type_ids: &Tensor,
        attention_mask: &Tensor,
    ) -> Result<Tensor> {
        let output = self
            .bert
            .forward(input_ids, token_type_ids, Some(attention_mask))?;
        let cls_token = output.i((.., 0, ..))?;
        let pooled = match &self.pooler {
            Some(pooler) => pooler.forward(&cls_token)?.tanh()?,
            None => cls_token,
        };
        self.classifier.forward(&pooled)
    }
}

/// Architectures accepted from a model directory's `config.json` (`model_type`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Architecture {
    /// BERT encoders with a pooler and a linear head over `[CLS]`.
    Bert,
    /// RoBERTa and XLM-RoBERTa with the `dense` + `out_proj` classification head.
    XlmRoberta,
}

impl Architecture {
    /// Maps a `model_type` string to an architecture. Missing types default to BERT.
    pub fn from_model_type(model_type: Option<&str>) -> Result<Self> {
        match model_type {
            None | Some("bert") => Ok(Self::Bert),
            Some("roberta") | Some("xlm-roberta") | Some("xlm_roberta") => Ok(Self::XlmRoberta),
            Some(other) => Err(candle::Error::Msg(format!(
                "unsupported model_type '{}'",
                other
            ))),
        }
    }

    /// Reads the architecture from a parsed `config.json`.
    ///
    /// Checkpoints that ship their own modelling code (`auto_map`) are refused by name,
    /// since their weights do not follow the standard layouts.
    pub fn from_config(raw: &Value) -> Result<Self> {
        if let Some(auto_map) = raw.get("auto_map") {
            let classes = raw
                .get("architectures")
                .and_then(Value::as_array)
                .map(|names| {
                    names
                        .iter()
                        .filter_map(Value::as_str)
                        .collect::<Vec<_>>()
                        .join(", ")
                })
                .filter(|names| !names.is_empty())
                .unwrap_or_else(|| auto_map.to_string());
            return Err(candle::Error::Msg(format!(
                "unsupported checkpoint '{}': it requires custom remote code; \
                 use a standard bert, roberta or xlm-roberta export",
                classes
            )));
        }

        Self::from_model_type(raw.get("model_type").and_then(Value::as_str))
    }

    /// Longest token sequence the position table accepts.
    ///
    /// RoBERTa-style position ids start at `pad_token_id + 1`, so that many slots are
    /// never available to tokens.
    fn max_input_len(self, raw: &Value) -> Option<usize> {
        let positions = raw.get("max_position_embeddings")?.as_u64()? as usize;
        match self {
            Self::Bert => Some(positions),
            Self::XlmRoberta => {
                let pad_token_id = raw
                    .get("pad_token_id")
                    .and_then(Value::as_u64)
                    .unwrap_or(1) as usize;
                Some(positions.saturating_sub(pad_token_id + 1))
            }
        }
    }
}

#[derive(Clone)]
enum Head {
    Bert(Arc<BertForSequenceClassification>),
    XlmRoberta(Arc<XLMRobertaForSequenceClassification>),
}

/// Sequence classifier producing one logit per (query, document) row.
#[derive(Clone)]
pub struct SequenceClassifier {
    architecture: Architecture,
    max_input_len: Option<usize>,
    head: Head,
}

fn parse_config<T: serde::de::DeserializeOwned>(raw: Value) -> Result<T> {
    serde_json::from_value(raw)
        .map_err(|e| candle::Error::Msg(format!("Failed to parse config: {}", e)))
}

impl SequenceClassifier {
    /// Loads `config.json` + `model.safetensors` from `model_dir`.
    pub fn load<P: AsRef<Path>>(model_dir: P, device: &Device) -> Result<Self> {
        let model_dir = model_dir.as_ref();
        let config_path = model_dir.join("config.json");
        let weights_path = model_dir.join("model.safetensors");

        let config_content = std::fs::read_to_string(config_path)?;
        let raw: Value = serde_json::from_str(&config_content)
            .map_err(|e| candle::Error::Msg(format!("Failed to parse config: {}", e)))?;
        let architecture = Architecture::from_config(&raw)?;
        let max_input_len = architecture.max_input_len(&raw);

        let vb =
            unsafe { VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, device)? };

        let head = match architecture {
            Architecture::Bert => {
                let config: bert::Config = parse_config(raw)?;
                Head::Bert(Arc::new(BertForSequenceClassification::load(vb, &config)?))
            }
            Architecture::XlmRoberta => {
                let config: xlm_roberta::Config = parse_config(raw)?;
                Head::XlmRoberta(Arc::new(XLMRobertaForSequenceClassification::new(
                    NUM_LABELS, &config, vb,
                )?))
            }
        };

        Ok(Self {
            architecture,
            max_input_len,
            head,
        })
    }

    pub fn architecture(&self) -> Architecture {
        self.architecture
    }

    /// Token limit imposed by the checkpoint's position embeddings, if it declares one.
    pub fn max_input_len(&self) -> Option<usize> {
        self.max_input_len
    }

    /// Runs a padded batch. All inputs are `(batch, seq_len)`; the output is `(batch, 1)`.
    pub fn forward(
        &self,
        input_ids: &Tensor,
        token_type_ids: &Tensor,
        attention_mask: &Tensor,
    ) -> Result<Tensor> {
        match &self.head {
            Head::Bert(model) => model.forward(input_ids, token_type_ids, attention_mask),
            Head::XlmRoberta(model) => model.forward(input_ids, attention_mask, token_type_ids),
        }
    }
}
