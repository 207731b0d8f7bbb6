// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Configuration loading
//!
//! A TOML file provides the base values; environment variables override a
//! handful of deployment-specific settings. Every section has defaults, so a
//! partial file (or none at all) works.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::lexicon::{Language, DEFAULT_MAX_EDIT_DISTANCE};
use crate::text::{RepairConfig, DEFAULT_CUSTOM_WORDS};
use crate::vision::trocr::decoder::DEFAULT_MAX_TOKENS;
use crate::vision::NormalizerConfig;

/// Dictionary and vocabulary settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LexiconConfig {
    pub language: Language,
    /// Frequency dictionary (`.json`, `.json.gz` or word list)
    pub dictionary: Option<PathBuf>,
    /// Words registered before the lexicon is frozen
    pub custom_words: Vec<String>,
    pub max_edit_distance: u8,
}

impl Default for LexiconConfig {
    fn default() -> Self {
        Self {
            language: Language::default(),
            dictionary: None,
            custom_words: DEFAULT_CUSTOM_WORDS.iter().map(|w| w.to_string()).collect(),
            max_edit_distance: DEFAULT_MAX_EDIT_DISTANCE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognizerConfig {
    /// Directory holding the TrOCR ONNX export
    pub model_dir: PathBuf,
    pub max_tokens: usize,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("./models/trocr-small-handwritten"),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Where canonical images are saved, if anywhere
    pub debug_dir: Option<PathBuf>,
    pub max_concurrent: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            debug_dir: None,
            max_concurrent: 2,
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScribeConfig {
    pub normalizer: NormalizerConfig,
    pub repair: RepairConfig,
    pub lexicon: LexiconConfig,
    pub recognizer: RecognizerConfig,
    pub pipeline: PipelineConfig,
}

impl ScribeConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Defaults with environment overrides applied
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Override fields from `INKSCRIBE_*` environment variables
    ///
    /// Unparseable values are logged and ignored.
    pub fn apply_env(&mut self) {
        if let Ok(val) = std::env::var("INKSCRIBE_LANGUAGE") {
            match val.parse() {
                Ok(lang) => self.lexicon.language = lang,
                Err(e) => warn!("Ignoring INKSCRIBE_LANGUAGE: {}", e),
            }
        }

        if let Ok(val) = std::env::var("INKSCRIBE_DICTIONARY") {
            self.lexicon.dictionary = Some(PathBuf::from(val));
        }

        if let Ok(val) = std::env::var("INKSCRIBE_MODEL_DIR") {
            self.recognizer.model_dir = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var("INKSCRIBE_DEBUG_DIR") {
            self.pipeline.debug_dir = Some(PathBuf::from(val));
        }

        if let Ok(val) = std::env::var("INKSCRIBE_MAX_CONCURRENT") {
            match val.parse() {
                Ok(num) => self.pipeline.max_concurrent = num,
                Err(_) => warn!("Ignoring INKSCRIBE_MAX_CONCURRENT: '{}' is not a number", val),
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.normalizer.validate()?;
        self.repair.validate()?;
        if self.pipeline.max_concurrent == 0 {
            anyhow::bail!("pipeline.max_concurrent must be at least 1");
        }
        Ok(())
    }
}
