//! Tiny randomly initialised checkpoints laid out like a Hugging Face model directory
//! (`config.json`, `model.safetensors`, `tokenizer.json`), for exercising the real
//! inference path in tests.

use candle_core::{DType, Device, Tensor};
use candle_nn::{VarBuilder, VarMap};
use candle_transformers::models::bert::{self, BertModel};
use candle_transformers::models::xlm_roberta::{self, XLMRobertaForSequenceClassification};
use serde_json::{Map, Value, json};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

pub(crate) const HIDDEN_SIZE: usize = 8;

/// Position table size for the BERT checkpoint; the XLM-R one leaves the same number
/// of usable positions after its padding offset.
pub(crate) const MAX_POSITIONS: usize = 16;

const WORDS: [&str; 24] = [
    "capital", "of", "france", "paris", "is", "the", "bananas", "are", "yellow", "rust",
    "a", "language", "what", "borrow", "checker", "ownership", "soup", "recipe", "long",
    "document", "about", "nothing", ".", "?",
];

#[derive(Clone, Copy)]
enum Flavor {
    Bert,
    XlmRoberta,
}

struct Specials {
    cls: &'static str,
    sep: &'static str,
    unk: &'static str,
}

impl Flavor {
    /// Special tokens in id order, matching the real vocabularies' first entries.
    fn special_tokens(self) -> [&'static str; 4] {
        match self {
            Flavor::Bert => ["[PAD]", "[UNK]", "[CLS]", "[SEP]"],
            Flavor::XlmRoberta => ["<s>", "<pad>", "</s>", "<unk>"],
        }
    }

    fn specials(self) -> Specials {
        match self {
            Flavor::Bert => Specials {
                cls: "[CLS]",
                sep: "[SEP]",
                unk: "[UNK]",
            },
            Flavor::XlmRoberta => Specials {
                cls: "<s>",
                sep: "</s>",
                unk: "<unk>",
            },
        }
    }

    fn vocab(self) -> Vec<&'static str> {
        self.special_tokens().into_iter().chain(WORDS).collect()
    }

    fn id(self, token: &str) -> usize {
        self.vocab()
            .iter()
            .position(|t| *t == token)
            .expect("token in fixture vocab")
    }
}

fn model_config(flavor: Flavor, model_type: &str) -> Value {
    let (max_positions, type_vocab_size, pad_token_id) = match flavor {
        Flavor::Bert => (MAX_POSITIONS, 2, 0),
        Flavor::XlmRoberta => (MAX_POSITIONS + 2, 1, 1),
    };

    json!({
        "model_type": model_type,
        "vocab_size": flavor.vocab().len(),
        "hidden_size": HIDDEN_SIZE,
        "num_hidden_layers": 1,
        "num_attention_heads": 2,
        "intermediate_size": 16,
        "hidden_act": "gelu",
        "hidden_dropout_prob": 0.0,
        "attention_probs_dropout_prob": 0.0,
        "max_position_embeddings": max_positions,
        "type_vocab_size": type_vocab_size,
        "initializer_range": 0.02,
        "layer_norm_eps": 1e-12,
        "pad_token_id": pad_token_id,
        "bos_token_id": 0,
        "eos_token_id": 2,
        "position_embedding_type": "absolute",
        "use_cache": true,
        "classifier_dropout": null
    })
}

fn special(token: &str, type_id: u32) -> Value {
    json!({"SpecialToken": {"id": token, "type_id": type_id}})
}

fn sequence(id: &str, type_id: u32) -> Value {
    json!({"Sequence": {"id": id, "type_id": type_id}})
}

fn tokenizer_config(flavor: Flavor) -> Value {
    let vocab: Map<String, Value> = flavor
        .vocab()
        .into_iter()
        .enumerate()
        .map(|(id, token)| (token.to_string(), json!(id)))
        .collect();

    let Specials { cls, sep, unk } = flavor.specials();

    let added_tokens: Vec<Value> = flavor
        .special_tokens()
        .into_iter()
        .map(|token| {
            json!({
                "id": flavor.id(token),
                "content": token,
                "single_word": false,
                "lstrip": false,
                "rstrip": false,
                "normalized": false,
                "special": true
            })
        })
        .collect();

    // BERT marks the document segment with type id 1; XLM-R has a single segment type
    // and separates the pair with a doubled separator.
    let pair = match flavor {
        Flavor::Bert => json!([
            special(cls, 0),
            sequence("A", 0),
            special(sep, 0),
            sequence("B", 1),
            special(sep, 1)
        ]),
        Flavor::XlmRoberta => json!([
            special(cls, 0),
            sequence("A", 0),
            special(sep, 0),
            special(sep, 0),
            sequence("B", 0),
            special(sep, 0)
        ]),
    };

    let special_tokens: Map<String, Value> = [cls, sep]
        .into_iter()
        .map(|token| {
            (
                token.to_string(),
                json!({"id": token, "ids": [flavor.id(token)], "tokens": [token]}),
            )
        })
        .collect();

    json!({
        "version": "1.0",
        "truncation": null,
        "padding": null,
        "added_tokens": added_tokens,
        "normalizer": {"type": "Lowercase"},
        "pre_tokenizer": {"type": "Whitespace"},
        "post_processor": {
            "type": "TemplateProcessing",
            "single": [special(cls, 0), sequence("A", 0), special(sep, 0)],
            "pair": pair,
            "special_tokens": special_tokens
        },
        "decoder": null,
        "model": {
            "type": "WordLevel",
            "vocab": vocab,
            "unk_token": unk
        }
    })
}

/// A model directory on disk plus the weights it was written from.
pub(crate) struct TinyCheckpoint {
    dir: TempDir,
    varmap: VarMap,
    config: Value,
}

impl TinyCheckpoint {
    /// BERT cross-encoder with pooler and single-logit head under the `bert.` prefix.
    pub(crate) fn bert() -> Self {
        Self::build_bert(true)
    }

    /// BERT cross-encoder exported without `bert.pooler.*` tensors.
    pub(crate) fn bert_without_pooler() -> Self {
        Self::build_bert(false)
    }

    /// XLM-RoBERTa cross-encoder in the layout used by `bge-reranker-*`.
    pub(crate) fn xlm_roberta() -> Self {
        Self::xlm_roberta_as("xlm-roberta")
    }

    /// Same weights layout as [`TinyCheckpoint::xlm_roberta`], labelled with `model_type`.
    pub(crate) fn xlm_roberta_as(model_type: &str) -> Self {
        let config = model_config(Flavor::XlmRoberta, model_type);
        let parsed: xlm_roberta::Config =
            serde_json::from_value(config.clone()).expect("xlm-roberta config");

        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        XLMRobertaForSequenceClassification::new(1, &parsed, vb).expect("init xlm-roberta");

        Self::write(Flavor::XlmRoberta, config, varmap)
    }

    fn build_bert(with_pooler: bool) -> Self {
        let config = model_config(Flavor::Bert, "bert");
        let parsed: bert::Config = serde_json::from_value(config.clone()).expect("bert config");

        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        BertModel::load(vb.pp("bert"), &parsed).expect("init bert");
        if with_pooler {
            candle_nn::linear(HIDDEN_SIZE, HIDDEN_SIZE, vb.pp("bert.pooler.dense"))
                .expect("init pooler");
        }
        candle_nn::linear(HIDDEN_SIZE, 1, vb.pp("classifier")).expect("init classifier");

        Self::write(Flavor::Bert, config, varmap)
    }

    fn write(flavor: Flavor, config: Value, varmap: VarMap) -> Self {
        let dir = TempDir::new().expect("create temp dir");

        fs::write(
            dir.path().join("config.json"),
            serde_json::to_string_pretty(&config).expect("serialize config"),
        )
        .expect("write config.json");
        fs::write(
            dir.path().join("tokenizer.json"),
            serde_json::to_string(&tokenizer_config(flavor)).expect("serialize tokenizer"),
        )
        .expect("write tokenizer.json");
        varmap
            .save(dir.path().join("model.safetensors"))
            .expect("write model.safetensors");

        Self {
            dir,
            varmap,
            config,
        }
    }

    pub(crate) fn path(&self) -> &Path {
        self.dir.path()
    }

    pub(crate) fn bert_config(&self) -> bert::Config {
        serde_json::from_value(self.config.clone()).expect("bert config")
    }

    /// Builder over the in-memory weights, identical to what was saved.
    pub(crate) fn var_builder(&self) -> VarBuilder<'_> {
        VarBuilder::from_varmap(&self.varmap, DType::F32, &Device::Cpu)
    }

    /// A saved tensor by its full name, e.g. `classifier.weight`.
    pub(crate) fn tensor(&self, name: &str) -> Tensor {
        self.varmap
            .data()
            .lock()
            .expect("varmap lock")
            .get(name)
            .unwrap_or_else(|| panic!("no tensor named {}", name))
            .as_tensor()
            .clone()
    }

    /// Rewrites `config.json` with extra top-level keys merged in.
    pub(crate) fn patch_config(&self, extra: Value) {
        let mut config = self.config.clone();
        if let (Some(target), Value::Object(extra)) = (config.as_object_mut(), extra) {
            target.extend(extra);
        }
        fs::write(
            self.dir.path().join("config.json"),
            serde_json::to_string_pretty(&config).expect("serialize config"),
        )
        .expect("write config.json");
    }
}
