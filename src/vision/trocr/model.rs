// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! TrOCR model wrapper for handwritten line recognition
//!
//! Combines the ViT encoder and the text decoder behind the `Recognizer`
//! trait. Runs on CPU only.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

use super::decoder::{SpecialTokens, TrOcrDecoder};
use super::encoder::TrOcrEncoder;
use super::preprocessing::preprocess_for_trocr;
use crate::vision::normalizer::CanonicalImage;
use crate::vision::recognizer::Recognizer;

/// Encoder file names, in lookup order
const ENCODER_FILES: &[&str] = &["encoder_model.onnx", "encoder.onnx"];

/// Decoder file names, in lookup order
const DECODER_FILES: &[&str] = &["decoder_model.onnx", "decoder.onnx"];

const TOKENIZER_FILE: &str = "tokenizer.json";
const CONFIG_FILE: &str = "config.json";

/// TrOCR encoder-decoder recognizer
#[derive(Clone)]
pub struct TrOcrModel {
    encoder: TrOcrEncoder,
    decoder: TrOcrDecoder,
    model_dir: PathBuf,
}

impl std::fmt::Debug for TrOcrModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrOcrModel")
            .field("model_dir", &self.model_dir)
            .field("max_tokens", &self.decoder.max_tokens())
            .finish_non_exhaustive()
    }
}

impl TrOcrModel {
    /// Load TrOCR models from a directory
    ///
    /// Expected files (directly in `model_dir` or under `model_dir/onnx`):
    /// - encoder_model.onnx
    /// - decoder_model.onnx
    /// - tokenizer.json
    /// - config.json (optional, special token ids)
    ///
    /// # Errors
    /// Returns error if the directory or a required file is missing, or
    /// ONNX Runtime fails to initialize a session
    pub async fn new<P: AsRef<Path>>(model_dir: P) -> Result<Self> {
        let model_dir = model_dir.as_ref();

        if !model_dir.exists() {
            anyhow::bail!("TrOCR model directory not found: {}", model_dir.display());
        }

        info!("Loading TrOCR models from {}", model_dir.display());

        let encoder_path = find_model_file(model_dir, ENCODER_FILES)?;
        let decoder_path = find_model_file(model_dir, DECODER_FILES)?;
        let tokenizer_path = find_model_file(model_dir, &[TOKENIZER_FILE])?;

        let tokens = match find_model_file(model_dir, &[CONFIG_FILE]) {
            Ok(path) => {
                let json = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                SpecialTokens::from_config_json(&json)?
            }
            Err(_) => {
                debug!("No config.json found, using default special tokens");
                SpecialTokens::default()
            }
        };

        let encoder = TrOcrEncoder::new(&encoder_path)
            .await
            .context("Failed to load TrOCR encoder")?;

        let decoder = TrOcrDecoder::new(&decoder_path, &tokenizer_path, tokens)
            .await
            .context("Failed to load TrOCR decoder")?;

        info!("TrOCR pipeline ready (CPU-only)");

        Ok(Self {
            encoder,
            decoder,
            model_dir: model_dir.to_path_buf(),
        })
    }

    /// Set the maximum tokens generated per image (clamped to 8..=256)
    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.decoder = self.decoder.with_max_tokens(max_tokens);
        self
    }

    pub fn model_dir(&self) -> &Path {
        &self.model_dir
    }
}

impl Recognizer for TrOcrModel {
    fn recognize(&self, image: &CanonicalImage) -> Result<String> {
        let start = Instant::now();

        let tensor = preprocess_for_trocr(image.image());
        let embeddings = self
            .encoder
            .encode(&tensor)
            .context("Failed to encode image")?;
        debug!(
            "Encoded to {} patches x {} dimensions",
            embeddings.nrows(),
            embeddings.ncols()
        );

        let text = self
            .decoder
            .generate(&embeddings)
            .context("Failed to generate text")?;

        info!(
            "TrOCR recognized {} chars in {}ms",
            text.chars().count(),
            start.elapsed().as_millis()
        );
        Ok(text)
    }

    fn name(&self) -> &str {
        "trocr"
    }
}

/// Find a model file by trying each name in `dir`, then in `dir/onnx`
fn find_model_file(dir: &Path, names: &[&str]) -> Result<PathBuf> {
    for base in [dir.to_path_buf(), dir.join("onnx")] {
        for name in names {
            let path = base.join(name);
            if path.exists() {
                return Ok(path);
            }
        }
    }
    anyhow::bail!(
        "Model file not found in {}. Tried: {:?}",
        dir.display(),
        names
    );
}
