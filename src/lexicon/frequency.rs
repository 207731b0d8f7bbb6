// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Word-frequency lexicon with edit-distance correction

use std::collections::{BTreeSet, HashMap};
use tracing::debug;

use super::edits::{edits1, known_edits2};
use super::{Language, Lexicon};

/// Default maximum edit distance searched by `best_correction`
pub const DEFAULT_MAX_EDIT_DISTANCE: u8 = 2;

/// Correction is skipped for words this much longer than the longest entry
const LENGTH_SLACK: usize = 3;

/// Word counts for one language
#[derive(Debug, Clone, Default)]
struct WordTable {
    counts: HashMap<String, u64>,
    alphabet: BTreeSet<char>,
    longest: usize,
}

impl WordTable {
    fn add(&mut self, word: String, count: u64) {
        self.alphabet.extend(word.chars());
        self.longest = self.longest.max(word.chars().count());
        *self.counts.entry(word).or_insert(0) += count;
    }

    fn register(&mut self, word: String) {
        self.alphabet.extend(word.chars());
        self.longest = self.longest.max(word.chars().count());
        let count = self.counts.entry(word).or_insert(0);
        if *count == 0 {
            *count = 1;
        }
    }

    /// Highest-count candidate; ties go to the lexicographically smallest word
    fn best<'a, I>(&self, candidates: I) -> Option<String>
    where
        I: IntoIterator<Item = &'a String>,
    {
        candidates
            .into_iter()
            .filter_map(|w| self.counts.get(w).map(|&c| (c, w)))
            .max_by(|(ca, wa), (cb, wb)| ca.cmp(cb).then_with(|| wb.cmp(wa)))
            .map(|(_, w)| w.clone())
    }
}

/// In-memory lexicon keyed by language
///
/// Entries are lowercased word/count pairs. Corrections follow the classic
/// frequency-ranked edit-distance approach: the word itself if known, then
/// known words one edit away, then two.
#[derive(Debug, Clone)]
pub struct FrequencyLexicon {
    tables: HashMap<Language, WordTable>,
    max_edit_distance: u8,
}

impl Default for FrequencyLexicon {
    fn default() -> Self {
        Self::new()
    }
}

impl FrequencyLexicon {
    pub fn new() -> Self {
        Self {
            tables: HashMap::new(),
            max_edit_distance: DEFAULT_MAX_EDIT_DISTANCE,
        }
    }

    /// Limit correction search depth (clamped to 1..=2)
    pub fn with_max_edit_distance(mut self, distance: u8) -> Self {
        self.max_edit_distance = distance.clamp(1, 2);
        self
    }

    /// Build a lexicon from `(word, count)` pairs for one language
    pub fn from_counts<'a, I>(language: Language, counts: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, u64)>,
    {
        let mut lexicon = Self::new();
        for (word, count) in counts {
            lexicon.add_word(word, count, language);
        }
        lexicon
    }

    pub fn max_edit_distance(&self) -> u8 {
        self.max_edit_distance
    }

    /// Add `count` occurrences of `word`
    ///
    /// Unlike `register_words`, repeated adds accumulate. Used by loaders.
    pub fn add_word(&mut self, word: &str, count: u64, language: Language) {
        let word = word.trim().to_lowercase();
        if word.is_empty() {
            return;
        }
        self.tables.entry(language).or_default().add(word, count);
    }

    /// Stored count for `word`, if known
    pub fn frequency(&self, word: &str, language: Language) -> Option<u64> {
        self.tables
            .get(&language)?
            .counts
            .get(&word.to_lowercase())
            .copied()
    }

    /// Number of distinct words for `language`
    pub fn len(&self, language: Language) -> usize {
        self.tables.get(&language).map_or(0, |t| t.counts.len())
    }

    pub fn is_empty(&self, language: Language) -> bool {
        self.len(language) == 0
    }

    /// Languages with at least one word
    pub fn languages(&self) -> Vec<Language> {
        let mut langs: Vec<Language> = self
            .tables
            .iter()
            .filter(|(_, t)| !t.counts.is_empty())
            .map(|(&l, _)| l)
            .collect();
        langs.sort();
        langs
    }
}

impl Lexicon for FrequencyLexicon {
    fn is_known(&self, word: &str, language: Language) -> bool {
        self.tables
            .get(&language)
            .map_or(false, |t| t.counts.contains_key(&word.to_lowercase()))
    }

    fn best_correction(&self, word: &str, language: Language) -> Option<String> {
        let word = word.to_lowercase();
        if word.is_empty() || word.parse::<f64>().is_ok() {
            return None;
        }

        let table = self.tables.get(&language)?;
        if word.chars().count() > table.longest + LENGTH_SLACK {
            debug!("Skipping correction for overlong word '{}'", word);
            return None;
        }

        if table.counts.contains_key(&word) {
            return Some(word);
        }

        // Only letters of the language are tried as substitutions and insertions
        let alphabet: Vec<char> = table
            .alphabet
            .iter()
            .copied()
            .filter(|&c| language.is_letter(c))
            .collect();

        let near = edits1(&word, &alphabet);
        if let Some(best) = table.best(&near) {
            return Some(best);
        }

        if self.max_edit_distance >= 2 {
            let far = known_edits2(&word, &alphabet, |w| table.counts.contains_key(w));
            return table.best(&far);
        }

        None
    }

    fn register_words(&mut self, words: &[&str], language: Language) {
        let table = self.tables.entry(language).or_default();
        for word in words {
            let word = word.trim().to_lowercase();
            if !word.is_empty() {
                table.register(word);
            }
        }
    }
}
