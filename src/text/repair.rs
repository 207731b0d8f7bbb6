// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Word segmentation and spelling repair of raw transcriptions
//!
//! Each token of the cleaned text is handled on its own:
//!
//! 1. Known words are kept verbatim.
//! 2. Unknown tokens longer than `split_min_length` are scanned for the first
//!    split point where both halves are known words. The halves replace the
//!    token; halves are not split further.
//! 3. Anything else is replaced by the lexicon's best correction, or kept
//!    as-is when there is none.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use super::cleaning::{tokenize, TextCleaner};
use crate::lexicon::{Language, Lexicon};

/// Unknown tokens must be longer than this (in characters) to be split
pub const DEFAULT_SPLIT_MIN_LENGTH: usize = 10;

/// Shortest half a split may produce
pub const DEFAULT_MIN_PART_LEN: usize = 3;

/// Words registered by default; the short function words a handwriting
/// model most often fuses
pub const DEFAULT_CUSTOM_WORDS: &[&str] =
    &["imagem", "vale", "mais", "que", "mil", "palavras", "uma"];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RepairConfig {
    pub split_min_length: usize,
    pub min_part_len: usize,
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self {
            split_min_length: DEFAULT_SPLIT_MIN_LENGTH,
            min_part_len: DEFAULT_MIN_PART_LEN,
        }
    }
}

impl RepairConfig {
    pub fn validate(&self) -> Result<()> {
        if self.min_part_len == 0 {
            anyhow::bail!("repair.min_part_len must be at least 1");
        }
        Ok(())
    }
}

/// What happened to one input token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TokenRepair {
    /// In the lexicon, kept verbatim
    Known { token: String },
    /// Fused word separated into two known words
    Split {
        token: String,
        left: String,
        right: String,
    },
    /// Replaced by the lexicon's best correction
    Corrected { token: String, to: String },
    /// No correction available, kept verbatim
    Unchanged { token: String },
}

impl TokenRepair {
    /// The input token this record describes
    pub fn token(&self) -> &str {
        match self {
            TokenRepair::Known { token }
            | TokenRepair::Split { token, .. }
            | TokenRepair::Corrected { token, .. }
            | TokenRepair::Unchanged { token } => token.as_str(),
        }
    }

    /// Output words, in order
    pub fn output(&self) -> Vec<&str> {
        match self {
            TokenRepair::Known { token } | TokenRepair::Unchanged { token } => vec![token.as_str()],
            TokenRepair::Split { left, right, .. } => vec![left.as_str(), right.as_str()],
            TokenRepair::Corrected { to, .. } => vec![to.as_str()],
        }
    }

    pub fn is_changed(&self) -> bool {
        match self {
            TokenRepair::Known { .. } | TokenRepair::Unchanged { .. } => false,
            TokenRepair::Split { .. } => true,
            TokenRepair::Corrected { token, to } => token != to,
        }
    }
}

/// Join repair records into the final text
pub fn render(repairs: &[TokenRepair]) -> String {
    repairs
        .iter()
        .flat_map(TokenRepair::output)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Cleans, segments and corrects raw recognizer output
#[derive(Clone)]
pub struct TextRepairer {
    lexicon: Arc<dyn Lexicon>,
    language: Language,
    config: RepairConfig,
    cleaner: TextCleaner,
}

impl std::fmt::Debug for TextRepairer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextRepairer")
            .field("language", &self.language)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl TextRepairer {
    /// Build a repairer over an already-frozen lexicon
    pub fn new(
        lexicon: Arc<dyn Lexicon>,
        language: Language,
        config: RepairConfig,
    ) -> Result<Self> {
        config.validate()?;
        let cleaner = TextCleaner::new(language).context("Failed to build text cleaner")?;

        Ok(Self {
            lexicon,
            language,
            config,
            cleaner,
        })
    }

    /// Register `words` into `lexicon`, then freeze it and build a repairer
    pub fn with_vocabulary<L>(
        mut lexicon: L,
        language: Language,
        words: &[&str],
        config: RepairConfig,
    ) -> Result<Self>
    where
        L: Lexicon + 'static,
    {
        lexicon.register_words(words, language);
        Self::new(Arc::new(lexicon), language, config)
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn config(&self) -> &RepairConfig {
        &self.config
    }

    pub fn lexicon(&self) -> &Arc<dyn Lexicon> {
        &self.lexicon
    }

    /// Cleanup only, no lexicon lookups
    pub fn clean(&self, raw: &str) -> String {
        self.cleaner.clean(raw)
    }

    /// Repair raw text into space-joined corrected words
    pub fn repair(&self, raw: &str) -> String {
        render(&self.repair_detailed(raw))
    }

    /// Repair raw text, returning the decision taken for each token
    pub fn repair_detailed(&self, raw: &str) -> Vec<TokenRepair> {
        let cleaned = self.cleaner.clean(raw);
        tokenize(&cleaned)
            .into_iter()
            .map(|token| self.repair_token(token))
            .collect()
    }

    /// Decide a single token
    pub fn repair_token(&self, token: &str) -> TokenRepair {
        if self.lexicon.is_known(token, self.language) {
            return TokenRepair::Known {
                token: token.to_string(),
            };
        }

        if token.chars().count() > self.config.split_min_length {
            if let Some((left, right)) = self.find_split(token) {
                debug!("Split '{}' into '{}' + '{}'", token, left, right);
                return TokenRepair::Split {
                    token: token.to_string(),
                    left: left.to_string(),
                    right: right.to_string(),
                };
            }
        }

        match self.lexicon.best_correction(token, self.language) {
            Some(to) => {
                debug!("Corrected '{}' -> '{}'", token, to);
                TokenRepair::Corrected {
                    token: token.to_string(),
                    to,
                }
            }
            None => {
                debug!("No correction for '{}'", token);
                TokenRepair::Unchanged {
                    token: token.to_string(),
                }
            }
        }
    }

    /// First split point, scanning left to right, where both halves are known
    pub fn find_split<'a>(&self, token: &'a str) -> Option<(&'a str, &'a str)> {
        let min_part = self.config.min_part_len;
        let boundaries: Vec<usize> = token
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(token.len()))
            .collect();
        let len = boundaries.len() - 1;

        if len < min_part * 2 {
            return None;
        }

        (min_part..=len - min_part)
            .map(|i| token.split_at(boundaries[i]))
            .find(|(left, right)| {
                self.lexicon.is_known(left, self.language)
                    && self.lexicon.is_known(right, self.language)
            })
    }
}
