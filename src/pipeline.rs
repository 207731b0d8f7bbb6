// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! End-to-end transcription: normalize, recognize, repair

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::text::{render, TextRepairer, TokenRepair};
use crate::vision::{
    decode_image_file, CanonicalImage, DecodeError, ImageNormalizer, NormalizeWarning, Recognizer,
};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("Recognition failed: {0:#}")]
    Recognition(anyhow::Error),

    #[error("Worker task failed: {0}")]
    Worker(String),
}

/// Result of transcribing one image
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcription {
    /// Input path, when the image came from a file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,
    /// Recognizer output before repair
    pub raw_text: String,
    /// Final corrected text
    pub text: String,
    pub repairs: Vec<TokenRepair>,
    pub warnings: Vec<NormalizeWarning>,
    pub elapsed_ms: u64,
}

impl Transcription {
    /// Number of tokens the repairer split or corrected
    pub fn changed_tokens(&self) -> usize {
        self.repairs.iter().filter(|r| r.is_changed()).count()
    }
}

/// Runs ImageNormalizer -> Recognizer -> TextRepairer
#[derive(Clone)]
pub struct Pipeline {
    normalizer: ImageNormalizer,
    recognizer: Arc<dyn Recognizer>,
    repairer: Arc<TextRepairer>,
    debug_dir: Option<PathBuf>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("normalizer", &self.normalizer)
            .field("recognizer", &self.recognizer.name())
            .field("repairer", &self.repairer)
            .field("debug_dir", &self.debug_dir)
            .finish()
    }
}

impl Pipeline {
    pub fn new(
        normalizer: ImageNormalizer,
        recognizer: Arc<dyn Recognizer>,
        repairer: TextRepairer,
    ) -> Self {
        Self {
            normalizer,
            recognizer,
            repairer: Arc::new(repairer),
            debug_dir: None,
        }
    }

    /// Save every canonical image under `dir` for inspection
    pub fn with_debug_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.debug_dir = Some(dir.into());
        self
    }

    pub fn normalizer(&self) -> &ImageNormalizer {
        &self.normalizer
    }

    pub fn repairer(&self) -> &TextRepairer {
        &self.repairer
    }

    /// Decode and transcribe an image file
    pub fn transcribe_path<P: AsRef<Path>>(&self, path: P) -> Result<Transcription, PipelineError> {
        let path = path.as_ref();
        let start = Instant::now();

        let (image, info) = decode_image_file(path)?;
        debug!(
            "Decoded {} ({}x{}, {:?}, {} bytes)",
            path.display(),
            info.width,
            info.height,
            info.format,
            info.size_bytes
        );

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "image".to_string());

        let mut transcription = self.run(&image, &stem, start)?;
        transcription.source = Some(path.to_path_buf());
        Ok(transcription)
    }

    /// Transcribe an already-decoded image
    pub fn transcribe_image(&self, image: &DynamicImage) -> Result<Transcription, PipelineError> {
        self.run(image, "image", Instant::now())
    }

    /// Transcribe many files concurrently, at most `max_concurrent` at a time
    ///
    /// Results come back in input order; one failure does not stop the rest.
    pub async fn transcribe_batch(
        &self,
        paths: Vec<PathBuf>,
        max_concurrent: usize,
    ) -> Vec<Result<Transcription, PipelineError>> {
        let semaphore = Arc::new(Semaphore::new(max_concurrent.max(1)));
        let mut handles = Vec::with_capacity(paths.len());

        info!(
            "Transcribing batch of {} images ({} concurrent)",
            paths.len(),
            max_concurrent.max(1)
        );

        for path in paths {
            let sem = semaphore.clone();
            let pipeline = self.clone();

            handles.push(tokio::spawn(async move {
                let _permit = sem
                    .acquire_owned()
                    .await
                    .map_err(|e| PipelineError::Worker(e.to_string()))?;

                tokio::task::spawn_blocking(move || pipeline.transcribe_path(&path))
                    .await
                    .map_err(|e| PipelineError::Worker(e.to_string()))?
            }));
        }

        futures::future::join_all(handles)
            .await
            .into_iter()
            .map(|joined| joined.unwrap_or_else(|e| Err(PipelineError::Worker(e.to_string()))))
            .collect()
    }

    fn run(
        &self,
        image: &DynamicImage,
        stem: &str,
        start: Instant,
    ) -> Result<Transcription, PipelineError> {
        let canonical = self.normalizer.normalize(image);
        debug!("Normalized in {}ms", start.elapsed().as_millis());

        if let Some(dir) = &self.debug_dir {
            self.save_debug_image(dir, stem, &canonical);
        }

        let raw_text = self
            .recognizer
            .recognize(&canonical)
            .map_err(PipelineError::Recognition)?;
        debug!(
            "{} returned '{}' after {}ms",
            self.recognizer.name(),
            raw_text,
            start.elapsed().as_millis()
        );

        let repairs = self.repairer.repair_detailed(&raw_text);
        let text = render(&repairs);
        let elapsed_ms = start.elapsed().as_millis() as u64;

        info!("Transcribed '{}' -> '{}' in {}ms", stem, text, elapsed_ms);

        Ok(Transcription {
            source: None,
            raw_text,
            text,
            repairs,
            warnings: canonical.warnings().to_vec(),
            elapsed_ms,
        })
    }

    /// Write `<stem>_processed_<unix-ts>.png`; failures are only logged
    fn save_debug_image(&self, dir: &Path, stem: &str, canonical: &CanonicalImage) {
        let path = debug_artifact_path(dir, stem, chrono::Utc::now().timestamp());

        let result = std::fs::create_dir_all(dir)
            .map_err(|e| e.to_string())
            .and_then(|_| canonical.image().save(&path).map_err(|e| e.to_string()));

        match result {
            Ok(()) => debug!("Saved canonical image to {}", path.display()),
            Err(e) => warn!("Failed to save debug image {}: {}", path.display(), e),
        }
    }
}

/// Debug artifact location for an input stem
pub fn debug_artifact_path(dir: &Path, stem: &str, timestamp: i64) -> PathBuf {
    dir.join(format!("{}_processed_{}.png", stem, timestamp))
}
