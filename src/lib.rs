// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod cli;
pub mod config;
pub mod lexicon;
pub mod pipeline;
pub mod text;
pub mod vision;

// Re-export main types
pub use config::ScribeConfig;
pub use lexicon::{FrequencyLexicon, Language, Lexicon};
pub use pipeline::{Pipeline, PipelineError, Transcription};
pub use text::{RepairConfig, TextRepairer, TokenRepair};
pub use vision::{
    CanonicalImage, DecodeError, ImageNormalizer, NormalizeWarning, NormalizerConfig, Recognizer,
    TrOcrModel,
};
