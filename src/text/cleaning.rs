// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Raw transcription cleanup and tokenization

use regex::Regex;

use crate::lexicon::Language;

/// Strips recognizer noise from raw text
///
/// Underscores become spaces, anything outside ASCII letters, digits,
/// whitespace and the language's accented letters is dropped, and runs of
/// whitespace collapse to one space.
#[derive(Debug, Clone)]
pub struct TextCleaner {
    language: Language,
    disallowed: Regex,
    whitespace: Regex,
}

impl TextCleaner {
    pub fn new(language: Language) -> Result<Self, regex::Error> {
        let pattern = format!(
            r"[^A-Za-z0-9\s{}]",
            regex::escape(language.accented_letters())
        );

        Ok(Self {
            language,
            disallowed: Regex::new(&pattern)?,
            whitespace: Regex::new(r"\s+")?,
        })
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn clean(&self, text: &str) -> String {
        let spaced = text.replace('_', " ");
        let kept = self.disallowed.replace_all(&spaced, "");
        self.whitespace.replace_all(&kept, " ").trim().to_string()
    }
}

/// Split cleaned text on whitespace
pub fn tokenize(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}
