// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision side of the transcription pipeline
//!
//! This module provides:
//! - Image decoding with format detection and size limits
//! - Normalization of handwriting photos into canonical model input
//! - The `Recognizer` boundary and a TrOCR implementation
//!
//! Recognition runs on CPU only.

pub mod filters;
pub mod image_utils;
pub mod normalizer;
pub mod recognizer;
pub mod trocr;

pub use image_utils::{decode_image_bytes, decode_image_file, detect_format, DecodeError, ImageInfo};
pub use normalizer::{
    CanonicalImage, ContentRegion, ImageNormalizer, NormalizeWarning, NormalizerConfig,
    ResizePolicy,
};
pub use recognizer::Recognizer;
pub use trocr::TrOcrModel;
