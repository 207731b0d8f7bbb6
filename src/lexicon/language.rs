// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Transcription languages

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Language a lexicon table and a text repairer work in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum Language {
    /// Brazilian Portuguese
    #[default]
    #[serde(rename = "pt-br", alias = "pt", alias = "pt_br")]
    PtBr,
    #[serde(rename = "en")]
    En,
    #[serde(rename = "es")]
    Es,
    #[serde(rename = "fr")]
    Fr,
    #[serde(rename = "de")]
    De,
}

impl Language {
    pub const ALL: [Language; 5] = [
        Language::PtBr,
        Language::En,
        Language::Es,
        Language::Fr,
        Language::De,
    ];

    /// Lowercase language code
    pub fn code(&self) -> &'static str {
        match self {
            Language::PtBr => "pt-br",
            Language::En => "en",
            Language::Es => "es",
            Language::Fr => "fr",
            Language::De => "de",
        }
    }

    /// Non-ASCII letters that survive text cleaning, both cases
    pub fn accented_letters(&self) -> &'static str {
        match self {
            Language::PtBr => "áéíóúãõâêîôûàèìòùçÁÉÍÓÚÃÕÂÊÎÔÛÀÈÌÒÙÇ",
            Language::En => "",
            Language::Es => "áéíóúüñÁÉÍÓÚÜÑ",
            Language::Fr => "àâæçéèêëîïôœùûüÿÀÂÆÇÉÈÊËÎÏÔŒÙÛÜŸ",
            Language::De => "äöüßÄÖÜ",
        }
    }

    /// Lowercase letter of this language's alphabet
    pub fn is_letter(&self, c: char) -> bool {
        c.is_ascii_lowercase() || (c.is_lowercase() && self.accented_letters().contains(c))
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Unknown language code
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported language: {0}")]
pub struct UnsupportedLanguage(pub String);

impl FromStr for Language {
    type Err = UnsupportedLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "pt-br" | "pt" => Ok(Language::PtBr),
            "en" | "en-us" | "en-gb" => Ok(Language::En),
            "es" => Ok(Language::Es),
            "fr" => Ok(Language::Fr),
            "de" => Ok(Language::De),
            _ => Err(UnsupportedLanguage(s.to_string())),
        }
    }
}
