// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! TrOCR handwritten text recognition (ONNX, CPU-only)

pub mod decoder;
pub mod encoder;
pub mod model;
pub mod preprocessing;

pub use decoder::{SpecialTokens, TrOcrDecoder};
pub use encoder::TrOcrEncoder;
pub use model::TrOcrModel;
pub use preprocessing::{preprocess_for_trocr, TROCR_INPUT_SIZE};
