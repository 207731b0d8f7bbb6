// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! TrOCR vision encoder
//!
//! Runs the ViT half of the encoder-decoder and returns the patch
//! embeddings the decoder attends to.

use anyhow::{Context, Result};
use ndarray::{Array2, Array4, IxDyn};
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use super::preprocessing::TROCR_INPUT_SIZE;

/// TrOCR vision encoder model
#[derive(Clone)]
pub struct TrOcrEncoder {
    /// ONNX Runtime session (thread-safe)
    session: Arc<Mutex<Session>>,
    /// Model input name
    input_name: String,
    /// Model output name (patch embeddings)
    output_name: String,
}

impl std::fmt::Debug for TrOcrEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrOcrEncoder")
            .field("input_name", &self.input_name)
            .field("output_name", &self.output_name)
            .finish_non_exhaustive()
    }
}

impl TrOcrEncoder {
    /// Load the encoder from an ONNX file (encoder_model.onnx)
    ///
    /// # Errors
    /// Returns error if the file is missing or ONNX Runtime cannot load it
    pub async fn new<P: AsRef<Path>>(model_path: P) -> Result<Self> {
        let model_path = model_path.as_ref();

        if !model_path.exists() {
            anyhow::bail!("TrOCR encoder model not found: {}", model_path.display());
        }

        info!("Loading TrOCR encoder from {}", model_path.display());

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
                "Failed to load TrOCR encoder model from {}",
                model_path.display()
            ))?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "pixel_values".to_string());

        let output_name = session
            .outputs
            .first()
            .map(|output| output.name.clone())
            .unwrap_or_else(|| "last_hidden_state".to_string());

        debug!(
            "TrOCR encoder loaded - input: {}, output: {}",
            input_name, output_name
        );

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            input_name,
            output_name,
        })
    }

    /// Encode a [1, 3, 384, 384] tensor into [seq_len, hidden] embeddings
    pub fn encode(&self, input: &Array4<f32>) -> Result<Array2<f32>> {
        let shape = input.shape();
        if shape.len() != 4 || shape[0] != 1 || shape[1] != 3 {
            anyhow::bail!("Invalid input shape: {:?}, expected [1, 3, H, W]", shape);
        }
        if shape[2] != TROCR_INPUT_SIZE as usize || shape[3] != TROCR_INPUT_SIZE as usize {
            anyhow::bail!(
                "Invalid input size {}x{}, expected {}x{}",
                shape[3],
                shape[2],
                TROCR_INPUT_SIZE,
                TROCR_INPUT_SIZE
            );
        }

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("TrOCR encoder session lock poisoned"))?;

        let input_value =
            Value::from_array(input.to_owned()).context("Failed to create input tensor")?;

        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input_value])
            .context("Encoder inference failed")?;

        let output_tensor = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract encoder output tensor")?;

        let output_shape = output_tensor.shape().to_vec();
        debug!("Encoder output shape: {:?}", output_shape);

        // [batch, seq_len, hidden]
        if output_shape.len() != 3 {
            anyhow::bail!("Unexpected encoder output shape: {:?}", output_shape);
        }
        let (seq_len, hidden) = (output_shape[1], output_shape[2]);

        let mut embeddings = Array2::<f32>::zeros((seq_len, hidden));
        for s in 0..seq_len {
            for e in 0..hidden {
                embeddings[[s, e]] = output_tensor[IxDyn(&[0, s, e])];
            }
        }

        Ok(embeddings)
    }
}
