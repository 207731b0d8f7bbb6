// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::ScribeConfig;
use crate::lexicon::{FrequencyLexicon, Language};
use crate::pipeline::{debug_artifact_path, Pipeline};
use crate::text::TextRepairer;
use crate::vision::{decode_image_file, ImageNormalizer, TrOcrModel};

/// Handwritten snippet transcription
#[derive(Parser, Debug)]
#[command(name = "inkscribe")]
#[command(version)]
#[command(about = "Transcribe photos of short handwritten text", long_about = None)]
pub struct Cli {
    /// TOML configuration file
    #[arg(long, env = "INKSCRIBE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory with encoder_model.onnx, decoder_model.onnx and tokenizer.json
    #[arg(long)]
    pub model_dir: Option<PathBuf>,

    /// Frequency dictionary (.json, .json.gz or word list)
    #[arg(long)]
    pub dictionary: Option<PathBuf>,

    /// Language code (pt-br, en, es, fr, de)
    #[arg(long)]
    pub language: Option<Language>,

    /// Extra vocabulary word (repeatable)
    #[arg(long = "word")]
    pub words: Vec<String>,

    /// Save canonical images here
    #[arg(long)]
    pub debug_dir: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,

    /// Only write normalized images to this directory, skip recognition
    #[arg(long, value_name = "OUT_DIR")]
    pub normalize_only: Option<PathBuf>,

    /// Input images
    #[arg(required = true)]
    pub images: Vec<PathBuf>,
}

impl Cli {
    /// File and environment configuration with command-line overrides
    pub fn resolve_config(&self) -> Result<ScribeConfig> {
        let mut config = match &self.config {
            Some(path) => ScribeConfig::from_file(path)?,
            None => ScribeConfig::default(),
        };
        config.apply_env();

        if let Some(dir) = &self.model_dir {
            config.recognizer.model_dir = dir.clone();
        }
        if let Some(path) = &self.dictionary {
            config.lexicon.dictionary = Some(path.clone());
        }
        if let Some(language) = self.language {
            config.lexicon.language = language;
        }
        if let Some(dir) = &self.debug_dir {
            config.pipeline.debug_dir = Some(dir.clone());
        }
        config.lexicon.custom_words.extend(self.words.iter().cloned());

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}

/// Build the frozen lexicon and repairer described by `config`
pub fn build_repairer(config: &ScribeConfig) -> Result<TextRepairer> {
    let language = config.lexicon.language;
    let mut lexicon =
        FrequencyLexicon::new().with_max_edit_distance(config.lexicon.max_edit_distance);

    match &config.lexicon.dictionary {
        Some(path) => {
            lexicon.load_path(path, language)?;
        }
        None => warn!(
            "No dictionary configured; only {} custom words are known",
            config.lexicon.custom_words.len()
        ),
    }

    let words: Vec<&str> = config.lexicon.custom_words.iter().map(String::as_str).collect();
    TextRepairer::with_vocabulary(lexicon, language, &words, config.repair.clone())
}

/// Execute CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    let config = cli.resolve_config()?;
    let normalizer = ImageNormalizer::new(config.normalizer.clone());

    if let Some(out_dir) = &cli.normalize_only {
        return normalize_only(&normalizer, &cli.images, out_dir);
    }

    let repairer = build_repairer(&config)?;
    let model = TrOcrModel::new(&config.recognizer.model_dir)
        .await?
        .with_max_tokens(config.recognizer.max_tokens);

    let mut pipeline = Pipeline::new(normalizer, Arc::new(model), repairer);
    if let Some(dir) = &config.pipeline.debug_dir {
        pipeline = pipeline.with_debug_dir(dir);
    }

    let total = cli.images.len();
    let results = pipeline
        .transcribe_batch(cli.images.clone(), config.pipeline.max_concurrent)
        .await;

    let mut failed = 0;
    let mut entries = Vec::with_capacity(total);
    for (path, result) in cli.images.iter().zip(results) {
        match result {
            Ok(transcription) => {
                if cli.json {
                    entries.push(serde_json::to_value(&transcription)?);
                } else {
                    println!("{}", transcription.text);
                }
            }
            Err(e) => {
                failed += 1;
                if cli.json {
                    entries.push(json!({ "source": path, "error": e.to_string() }));
                } else {
                    eprintln!("{}: {}", path.display(), e);
                }
            }
        }
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    }

    info!("Transcribed {} of {} images", total - failed, total);
    if failed > 0 {
        anyhow::bail!("{} of {} images failed", failed, total);
    }
    Ok(())
}

fn normalize_only(normalizer: &ImageNormalizer, images: &[PathBuf], out_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;

    for path in images {
        let (image, _) = decode_image_file(path)?;
        let canonical = normalizer.normalize(&image);

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "image".to_string());
        let out = debug_artifact_path(out_dir, &stem, chrono::Utc::now().timestamp());

        canonical
            .image()
            .save(&out)
            .with_context(|| format!("Failed to write {}", out.display()))?;
        println!("{}", out.display());
    }
    Ok(())
}
