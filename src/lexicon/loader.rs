// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Dictionary file loading
//!
//! Two formats are accepted:
//! - JSON object `{ "word": count, ... }`, optionally gzip-compressed
//!   (detected by a `.gz` extension)
//! - Plain word lists, one `word [count]` per line; `#` starts a comment

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use tracing::info;

use super::{FrequencyLexicon, Language};

impl FrequencyLexicon {
    /// Load a JSON frequency dictionary, returning the number of entries read
    pub fn load_json<P: AsRef<Path>>(&mut self, path: P, language: Language) -> Result<usize> {
        let path = path.as_ref();
        let reader = open(path)?;
        let added = self
            .read_json(reader, language)
            .with_context(|| format!("Failed to parse dictionary {}", path.display()))?;

        info!("Loaded {} {} dictionary entries from {}", added, language, path.display());
        Ok(added)
    }

    /// Read a JSON `{ word: count }` object from any reader
    pub fn read_json<R: Read>(&mut self, reader: R, language: Language) -> Result<usize> {
        let counts: HashMap<String, u64> =
            serde_json::from_reader(reader).context("Expected a JSON object of word counts")?;
        let added = counts.len();
        for (word, count) in counts {
            self.add_word(&word, count, language);
        }
        Ok(added)
    }

    /// Load a plain-text word list, returning the number of entries read
    pub fn load_word_list<P: AsRef<Path>>(&mut self, path: P, language: Language) -> Result<usize> {
        let path = path.as_ref();
        let reader = BufReader::new(open(path)?);
        let added = self
            .read_word_list(reader, language)
            .with_context(|| format!("Failed to parse word list {}", path.display()))?;

        info!("Loaded {} {} words from {}", added, language, path.display());
        Ok(added)
    }

    /// Read `word [count]` lines from any buffered reader
    pub fn read_word_list<R: BufRead>(&mut self, reader: R, language: Language) -> Result<usize> {
        let mut added = 0;
        for (idx, line) in reader.lines().enumerate() {
            let line = line.context("Failed to read line")?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut fields = line.split_whitespace();
            let Some(word) = fields.next() else { continue };
            let count = match fields.next() {
                Some(raw) => raw
                    .parse::<u64>()
                    .with_context(|| format!("Invalid count '{}' on line {}", raw, idx + 1))?,
                None => 1,
            };

            self.add_word(word, count, language);
            added += 1;
        }
        Ok(added)
    }

    /// Load either format, picking by extension (`.json`, `.json.gz` or text)
    pub fn load_path<P: AsRef<Path>>(&mut self, path: P, language: Language) -> Result<usize> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        if name.ends_with(".json") || name.ends_with(".json.gz") {
            self.load_json(path, language)
        } else {
            self.load_word_list(path, language)
        }
    }
}

/// Open a file, transparently gunzipping `.gz` paths
fn open(path: &Path) -> Result<Box<dyn Read>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open dictionary {}", path.display()))?;

    let gzipped = path
        .extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("gz"));

    if gzipped {
        Ok(Box::new(GzDecoder::new(file)))
    } else {
        Ok(Box::new(file))
    }
}
