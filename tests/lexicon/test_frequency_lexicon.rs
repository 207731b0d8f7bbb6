// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! FrequencyLexicon tests: loading, lookups and correction ranking

use inkscribe::{FrequencyLexicon, Language, Lexicon};
use std::sync::Arc;
use tempfile::TempDir;

#[test]
fn test_load_json_dictionary_from_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("pt_br.json");
    std::fs::write(&path, r#"{"mesa": 30, "mesma": 90, "massa": 15}"#).unwrap();

    let mut lexicon = FrequencyLexicon::new();
    assert_eq!(lexicon.load_path(&path, Language::PtBr).unwrap(), 3);

    assert!(lexicon.is_known("Mesa", Language::PtBr));
    // "mesna" is one edit from both "mesa" (30) and "mesma" (90)
    assert_eq!(
        lexicon.best_correction("mesna", Language::PtBr),
        Some("mesma".to_string())
    );
}

#[test]
fn test_languages_are_isolated() {
    let mut lexicon = FrequencyLexicon::new();
    lexicon.add_word("house", 10, Language::En);
    lexicon.add_word("casa", 10, Language::PtBr);

    assert!(lexicon.is_known("house", Language::En));
    assert!(!lexicon.is_known("house", Language::PtBr));
    assert_eq!(lexicon.best_correction("hous", Language::PtBr), None);
    assert_eq!(lexicon.languages(), vec![Language::PtBr, Language::En]);
}

#[test]
fn test_accented_candidates() {
    let lexicon =
        FrequencyLexicon::from_counts(Language::PtBr, [("coração", 10), ("ação", 40)]);
    assert_eq!(
        lexicon.best_correction("coracão", Language::PtBr),
        Some("coração".to_string())
    );
}

#[test]
fn test_correction_is_deterministic_on_ties() {
    let lexicon =
        FrequencyLexicon::from_counts(Language::PtBr, [("lata", 5), ("gata", 5), ("pata", 5)]);
    for _ in 0..5 {
        assert_eq!(
            lexicon.best_correction("xata", Language::PtBr),
            Some("gata".to_string())
        );
    }
}

#[test]
fn test_shared_read_only_across_threads() {
    let mut lexicon = FrequencyLexicon::from_counts(Language::PtBr, [("nota", 3)]);
    lexicon.register_words(&["lembrete"], Language::PtBr);
    let shared: Arc<dyn Lexicon> = Arc::new(lexicon);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let lex = shared.clone();
            std::thread::spawn(move || {
                lex.is_known("lembrete", Language::PtBr)
                    && lex.best_correction("nota", Language::PtBr).as_deref() == Some("nota")
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap());
    }
}
