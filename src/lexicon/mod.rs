// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Language lexicons used by text repair
//!
//! The repairer only depends on the `Lexicon` trait. `FrequencyLexicon` is
//! the bundled word-frequency implementation.

pub mod edits;
pub mod frequency;
pub mod language;
pub mod loader;

pub use frequency::{FrequencyLexicon, DEFAULT_MAX_EDIT_DISTANCE};
pub use language::{Language, UnsupportedLanguage};

/// Word membership and correction for one or more languages
///
/// Lookups are case-insensitive. After construction a lexicon is shared
/// read-only behind an `Arc`; `register_words` needs `&mut self` so it can
/// only run before that point.
pub trait Lexicon: Send + Sync {
    /// Whether the lowercased `word` is in the dictionary for `language`
    fn is_known(&self, word: &str, language: Language) -> bool;

    /// Best known replacement for `word`, or `None` if no candidate exists
    fn best_correction(&self, word: &str, language: Language) -> Option<String>;

    /// Bulk insert; registering a word twice has no further effect
    fn register_words(&mut self, words: &[&str], language: Language);
}
