// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! End-to-end pipeline tests with a stub recognizer
//!
//! The recognizer records the canonical image it receives and returns a
//! fixed transcription, so these tests exercise the full
//! decode -> normalize -> recognize -> repair path without model files.

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use inkscribe::text::{RepairConfig, DEFAULT_CUSTOM_WORDS};
use inkscribe::{
    CanonicalImage, FrequencyLexicon, ImageNormalizer, Language, Pipeline, Recognizer,
    TextRepairer, TokenRepair,
};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Returns a fixed string and remembers the dimensions it was given
struct FixedRecognizer {
    text: String,
    seen: Mutex<Vec<(u32, u32)>>,
}

impl FixedRecognizer {
    fn new(text: &str) -> Arc<Self> {
        Arc::new(Self {
            text: text.to_string(),
            seen: Mutex::new(Vec::new()),
        })
    }
}

impl Recognizer for FixedRecognizer {
    fn recognize(&self, image: &CanonicalImage) -> anyhow::Result<String> {
        self.seen
            .lock()
            .unwrap()
            .push((image.width(), image.height()));
        Ok(self.text.clone())
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

fn repairer() -> TextRepairer {
    TextRepairer::with_vocabulary(
        FrequencyLexicon::new(),
        Language::PtBr,
        DEFAULT_CUSTOM_WORDS,
        RepairConfig::default(),
    )
    .unwrap()
}

fn write_note(dir: &TempDir, name: &str, width: u32, height: u32) -> std::path::PathBuf {
    let mut img = RgbImage::from_pixel(width, height, Rgb([225, 222, 215]));
    for x in width / 8..width * 7 / 8 {
        for y in height / 2..height / 2 + 6 {
            img.put_pixel(x, y, Rgb([25, 25, 60]));
        }
    }
    let path = dir.path().join(name);
    DynamicImage::ImageRgb8(img)
        .save_with_format(&path, ImageFormat::Png)
        .unwrap();
    path
}

#[test]
fn test_photo_to_corrected_sentence() {
    let dir = TempDir::new().unwrap();
    let path = write_note(&dir, "proverbio.png", 1200, 800);

    let recognizer = FixedRecognizer::new("uma_imagem_vale_mais_que_milpalavras");
    let pipeline = Pipeline::new(ImageNormalizer::default(), recognizer.clone(), repairer());

    let transcription = pipeline.transcribe_path(&path).unwrap();

    assert_eq!(transcription.text, "uma imagem vale mais que mil palavras");
    assert_eq!(transcription.raw_text, "uma_imagem_vale_mais_que_milpalavras");
    assert_eq!(transcription.source.as_deref(), Some(path.as_path()));
    assert!(transcription.warnings.is_empty());
    assert_eq!(*recognizer.seen.lock().unwrap(), vec![(384, 384)]);

    let splits: Vec<_> = transcription
        .repairs
        .iter()
        .filter(|r| matches!(r, TokenRepair::Split { .. }))
        .collect();
    assert_eq!(splits.len(), 1);
    assert_eq!(splits[0].token(), "milpalavras");
}

#[test]
fn test_fully_fused_sentence_is_not_segmented() {
    // A single greedy two-way split cannot recover seven fused words; the
    // token is too long to correct, so it is returned unchanged
    let recognizer = FixedRecognizer::new("uma_imagemvalemaisquemilpalavras");
    let pipeline = Pipeline::new(ImageNormalizer::default(), recognizer, repairer());

    let img = DynamicImage::ImageRgb8(RgbImage::from_fn(300, 100, |x, _| {
        Rgb([(x % 256) as u8, 128, 128])
    }));
    let transcription = pipeline.transcribe_image(&img).unwrap();

    assert_eq!(transcription.text, "uma imagemvalemaisquemilpalavras");
    assert_eq!(
        transcription.repairs[1],
        TokenRepair::Unchanged {
            token: "imagemvalemaisquemilpalavras".into()
        }
    );
}

#[test]
fn test_blank_page_reports_warning() {
    let recognizer = FixedRecognizer::new("");
    let pipeline = Pipeline::new(ImageNormalizer::default(), recognizer, repairer());

    let blank = DynamicImage::ImageRgb8(RgbImage::from_pixel(640, 480, Rgb([240, 240, 240])));
    let transcription = pipeline.transcribe_image(&blank).unwrap();

    assert_eq!(transcription.text, "");
    assert_eq!(transcription.warnings.len(), 1);
}

#[test]
fn test_debug_dir_receives_canonical_image() {
    let input = TempDir::new().unwrap();
    let debug = TempDir::new().unwrap();
    let path = write_note(&input, "lembrete.png", 640, 200);

    let pipeline = Pipeline::new(
        ImageNormalizer::default(),
        FixedRecognizer::new("mil palavras"),
        repairer(),
    )
    .with_debug_dir(debug.path().join("artifacts"));

    pipeline.transcribe_path(&path).unwrap();

    let saved: Vec<_> = std::fs::read_dir(debug.path().join("artifacts"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(saved.len(), 1);
    assert!(saved[0].starts_with("lembrete_processed_"));
    assert!(saved[0].ends_with(".png"));

    let artifact = image::open(debug.path().join("artifacts").join(&saved[0])).unwrap();
    assert_eq!((artifact.width(), artifact.height()), (384, 384));
}

#[test]
fn test_transcription_serializes_to_json() {
    let pipeline = Pipeline::new(
        ImageNormalizer::default(),
        FixedRecognizer::new("milpalavras!"),
        repairer(),
    );
    let img = DynamicImage::ImageRgb8(RgbImage::from_fn(200, 80, |x, y| {
        Rgb([((x + y) % 256) as u8, 100, 100])
    }));

    let transcription = pipeline.transcribe_image(&img).unwrap();
    let value = serde_json::to_value(&transcription).unwrap();

    assert_eq!(value["text"], "mil palavras");
    assert_eq!(value["repairs"][0]["kind"], "split");
    assert!(value.get("source").is_none());
}
