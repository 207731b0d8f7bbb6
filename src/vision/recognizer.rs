// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Recognition boundary
//!
//! The pipeline only sees this trait. `TrOcrModel` is the bundled
//! implementation; tests plug in recognizers that return fixed strings.

use anyhow::Result;

use super::normalizer::CanonicalImage;

/// Canonical image to raw text
///
/// Implementations must be shareable across worker tasks. The returned text
/// may be empty and may contain noise; cleanup is the text repairer's job.
pub trait Recognizer: Send + Sync {
    /// Transcribe a canonical image in a single call
    fn recognize(&self, image: &CanonicalImage) -> Result<String>;

    /// Short identifier used in logs
    fn name(&self) -> &str {
        "recognizer"
    }
}

impl<R: Recognizer + ?Sized> Recognizer for std::sync::Arc<R> {
    fn recognize(&self, image: &CanonicalImage) -> Result<String> {
        (**self).recognize(image)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
