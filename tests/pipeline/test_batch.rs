// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Concurrent batch transcription tests

use image::{DynamicImage, GrayImage, ImageFormat, Luma};
use inkscribe::text::{RepairConfig, DEFAULT_CUSTOM_WORDS};
use inkscribe::{
    CanonicalImage, FrequencyLexicon, ImageNormalizer, Language, Pipeline, PipelineError,
    Recognizer, TextRepairer,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Tracks peak concurrency; the transcription encodes the image width
struct WidthRecognizer {
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl Recognizer for WidthRecognizer {
    fn recognize(&self, image: &CanonicalImage) -> anyhow::Result<String> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(30));
        self.active.fetch_sub(1, Ordering::SeqCst);

        Ok(format!("mil {}", image.source_dimensions().0))
    }
}

fn pipeline(recognizer: Arc<WidthRecognizer>) -> Pipeline {
    let repairer = TextRepairer::with_vocabulary(
        FrequencyLexicon::new(),
        Language::PtBr,
        DEFAULT_CUSTOM_WORDS,
        RepairConfig::default(),
    )
    .unwrap();
    Pipeline::new(ImageNormalizer::default(), recognizer, repairer)
}

fn write_images(dir: &TempDir, widths: &[u32]) -> Vec<std::path::PathBuf> {
    widths
        .iter()
        .map(|&w| {
            let img = GrayImage::from_fn(w, 60, |x, _| Luma([if x % 7 == 0 { 20 } else { 220 }]));
            let path = dir.path().join(format!("img_{}.png", w));
            DynamicImage::ImageLuma8(img)
                .save_with_format(&path, ImageFormat::Png)
                .unwrap();
            path
        })
        .collect()
}

#[tokio::test]
async fn test_batch_preserves_input_order() {
    let dir = TempDir::new().unwrap();
    let widths = [310, 120, 250, 90, 400, 175];
    let paths = write_images(&dir, &widths);

    let recognizer = Arc::new(WidthRecognizer {
        active: AtomicUsize::new(0),
        peak: AtomicUsize::new(0),
    });
    let results = pipeline(recognizer.clone()).transcribe_batch(paths, 3).await;

    assert_eq!(results.len(), widths.len());
    for (result, width) in results.iter().zip(widths) {
        let transcription = result.as_ref().unwrap();
        assert_eq!(transcription.text, format!("mil {}", width));
    }
    assert!(recognizer.peak.load(Ordering::SeqCst) <= 3);
}

#[tokio::test]
async fn test_batch_isolates_failures() {
    let dir = TempDir::new().unwrap();
    let mut paths = write_images(&dir, &[100, 200]);
    paths.insert(1, dir.path().join("missing.png"));

    let recognizer = Arc::new(WidthRecognizer {
        active: AtomicUsize::new(0),
        peak: AtomicUsize::new(0),
    });
    let results = pipeline(recognizer).transcribe_batch(paths, 2).await;

    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(PipelineError::Decode(_))));
    assert_eq!(results[2].as_ref().unwrap().text, "mil 200");
}

#[tokio::test]
async fn test_zero_concurrency_still_runs() {
    let dir = TempDir::new().unwrap();
    let paths = write_images(&dir, &[80]);

    let recognizer = Arc::new(WidthRecognizer {
        active: AtomicUsize::new(0),
        peak: AtomicUsize::new(0),
    });
    let results = pipeline(recognizer).transcribe_batch(paths, 0).await;
    assert_eq!(results.len(), 1);
    assert!(results[0].is_ok());
}
