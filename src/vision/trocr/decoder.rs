// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! TrOCR text decoder
//!
//! Greedy autoregressive decoding over the encoder's patch embeddings.

use anyhow::{Context, Result};
use ndarray::{Array2, Array3, IxDyn};
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use serde::Deserialize;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokenizers::Tokenizer;
use tracing::{debug, info};

/// Default maximum tokens to generate (short handwritten snippets)
pub const DEFAULT_MAX_TOKENS: usize = 64;

/// Minimum tokens to generate
pub const MIN_TOKENS: usize = 8;

/// Maximum tokens to generate
pub const MAX_TOKENS: usize = 256;

/// Special token ids driving generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecialTokens {
    pub decoder_start: u32,
    pub eos: u32,
    pub pad: u32,
}

impl Default for SpecialTokens {
    /// Values used by the published TrOCR checkpoints
    fn default() -> Self {
        Self {
            decoder_start: 2,
            eos: 2,
            pad: 1,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct TokenFields {
    decoder_start_token_id: Option<u32>,
    eos_token_id: Option<u32>,
    pad_token_id: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct ModelConfigFile {
    #[serde(flatten)]
    top: TokenFields,
    #[serde(default)]
    decoder: TokenFields,
}

impl SpecialTokens {
    /// Read special token ids from a HuggingFace `config.json`
    ///
    /// Top-level fields win over the nested `decoder` section; anything
    /// missing falls back to the TrOCR defaults.
    pub fn from_config_json(json: &str) -> Result<Self> {
        let file: ModelConfigFile =
            serde_json::from_str(json).context("Failed to parse model config.json")?;
        let defaults = Self::default();

        Ok(Self {
            decoder_start: file
                .top
                .decoder_start_token_id
                .or(file.decoder.decoder_start_token_id)
                .unwrap_or(defaults.decoder_start),
            eos: file
                .top
                .eos_token_id
                .or(file.decoder.eos_token_id)
                .unwrap_or(defaults.eos),
            pad: file
                .top
                .pad_token_id
                .or(file.decoder.pad_token_id)
                .unwrap_or(defaults.pad),
        })
    }
}

/// TrOCR language decoder
#[derive(Clone)]
pub struct TrOcrDecoder {
    /// ONNX Runtime session (thread-safe)
    session: Arc<Mutex<Session>>,
    /// Tokenizer for id to text decoding
    tokenizer: Arc<Tokenizer>,
    tokens: SpecialTokens,
    max_tokens: usize,
    vocab_size: usize,
}

impl std::fmt::Debug for TrOcrDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrOcrDecoder")
            .field("tokens", &self.tokens)
            .field("max_tokens", &self.max_tokens)
            .field("vocab_size", &self.vocab_size)
            .finish_non_exhaustive()
    }
}

impl TrOcrDecoder {
    /// Load the decoder (decoder_model.onnx) and its tokenizer (tokenizer.json)
    ///
    /// # Errors
    /// Returns error if either file is missing or cannot be loaded
    pub async fn new<P: AsRef<Path>>(
        model_path: P,
        tokenizer_path: P,
        tokens: SpecialTokens,
    ) -> Result<Self> {
        let model_path = model_path.as_ref();
        let tokenizer_path = tokenizer_path.as_ref();

        if !model_path.exists() {
            anyhow::bail!("TrOCR decoder model not found: {}", model_path.display());
        }
        if !tokenizer_path.exists() {
            anyhow::bail!("TrOCR tokenizer not found: {}", tokenizer_path.display());
        }

        info!("Loading TrOCR decoder from {}", model_path.display());

        let tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;
        let vocab_size = tokenizer.get_vocab_size(true);
        info!("Loaded tokenizer with {} tokens", vocab_size);

        let session = Session::builder()
            .context("Failed to create session builder")?
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .context("Failed to set CPU execution provider")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .with_intra_threads(4)
            .context("Failed to set intra threads")?
            .commit_from_file(model_path)
            .context(format!(
                "Failed to load TrOCR decoder model from {}",
                model_path.display()
            ))?;

        let input_names: Vec<_> = session.inputs.iter().map(|i| &i.name).collect();
        debug!("Decoder inputs: {:?}, special tokens: {:?}", input_names, tokens);

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
            tokens,
            max_tokens: DEFAULT_MAX_TOKENS,
            vocab_size,
        })
    }

    /// Set the maximum tokens to generate
    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens.clamp(MIN_TOKENS, MAX_TOKENS);
        self
    }

    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    pub fn vocab_size(&self) -> usize {
        self.vocab_size
    }

    /// Generate text from encoder embeddings [seq_len, hidden]
    pub fn generate(&self, encoder_hidden_states: &Array2<f32>) -> Result<String> {
        let mut tokens = vec![self.tokens.decoder_start];

        for step in 0..self.max_tokens {
            let logits = self.forward(encoder_hidden_states, &tokens)?;
            let next_token = argmax(&logits)
                .ok_or_else(|| anyhow::anyhow!("Decoder returned empty logits"))?;

            if next_token == self.tokens.eos {
                debug!("Generation stopped at EOS after {} steps", step + 1);
                break;
            }
            tokens.push(next_token);
        }

        // Drop the start token; pads never carry text
        let generated: Vec<u32> = tokens
            .into_iter()
            .skip(1)
            .filter(|&t| t != self.tokens.pad)
            .collect();

        let text = self
            .tokenizer
            .decode(&generated, true)
            .map_err(|e| anyhow::anyhow!("Decoding failed: {}", e))?;

        debug!("Generated {} tokens: '{}'", generated.len(), text);
        Ok(text.trim().to_string())
    }

    /// Single decoder pass, returning logits for the last position
    fn forward(&self, encoder_hidden_states: &Array2<f32>, input_ids: &[u32]) -> Result<Vec<f32>> {
        let (seq_len, hidden) = (encoder_hidden_states.nrows(), encoder_hidden_states.ncols());
        let encoder_input: Array3<f32> = encoder_hidden_states
            .to_owned()
            .into_shape_with_order((1, seq_len, hidden))
            .context("Failed to reshape encoder hidden states")?;

        let ids = Array2::from_shape_vec(
            (1, input_ids.len()),
            input_ids.iter().map(|&t| t as i64).collect(),
        )
        .context("Failed to build input ids")?;

        let ids_value = Value::from_array(ids).context("Failed to create input ids tensor")?;
        let encoder_value = Value::from_array(encoder_input)
            .context("Failed to create encoder hidden states tensor")?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("TrOCR decoder session lock poisoned"))?;

        let outputs = session
            .run(ort::inputs![
                "input_ids" => ids_value,
                "encoder_hidden_states" => encoder_value
            ])
            .context("Decoder inference failed")?;

        let output_tensor = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract logits tensor")?;

        // [batch, seq, vocab]
        let shape = output_tensor.shape().to_vec();
        if shape.len() != 3 {
            anyhow::bail!("Unexpected decoder output shape: {:?}", shape);
        }
        let last_pos = shape[1] - 1;
        let logits = (0..shape[2])
            .map(|v| output_tensor[IxDyn(&[0, last_pos, v])])
            .collect();

        Ok(logits)
    }
}

/// Index of the largest logit
pub fn argmax(logits: &[f32]) -> Option<u32> {
    logits
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(idx, _)| idx as u32)
}
