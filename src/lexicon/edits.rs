// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Edit-distance candidate generation (delete, transpose, replace, insert)

use std::collections::HashSet;

/// All strings one edit away from `word`, over `alphabet`
pub fn edits1(word: &str, alphabet: &[char]) -> HashSet<String> {
    let chars: Vec<char> = word.chars().collect();
    let n = chars.len();
    let mut out = HashSet::with_capacity(n * 2 + alphabet.len() * (2 * n + 1));

    for i in 0..=n {
        let (left, right) = chars.split_at(i);

        if !right.is_empty() {
            // delete
            out.insert(join(left, &[], &right[1..]));

            // transpose
            if right.len() > 1 {
                out.insert(join(left, &[right[1], right[0]], &right[2..]));
            }

            // replace
            for &c in alphabet {
                if c != right[0] {
                    out.insert(join(left, &[c], &right[1..]));
                }
            }
        }

        // insert
        for &c in alphabet {
            out.insert(join(left, &[c], right));
        }
    }

    out
}

/// Strings two edits away, filtered through `keep` as they are generated
///
/// The full distance-2 neighbourhood is large; filtering inline keeps memory
/// bounded by the number of matches.
pub fn known_edits2<F>(word: &str, alphabet: &[char], keep: F) -> HashSet<String>
where
    F: Fn(&str) -> bool,
{
    let mut out = HashSet::new();
    for e1 in edits1(word, alphabet) {
        for e2 in edits1(&e1, alphabet) {
            if keep(&e2) {
                out.insert(e2);
            }
        }
    }
    out
}

fn join(a: &[char], mid: &[char], b: &[char]) -> String {
    a.iter().chain(mid).chain(b).collect()
}
