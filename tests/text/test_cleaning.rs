// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Text cleaning and tokenization tests

use inkscribe::text::{tokenize, TextCleaner};
use inkscribe::Language;

fn clean(raw: &str) -> String {
    TextCleaner::new(Language::PtBr).unwrap().clean(raw)
}

#[test]
fn test_underscore_separates_words() {
    assert_eq!(tokenize(&clean("hello_world")), vec!["hello", "world"]);
    assert_eq!(tokenize(&clean("__uma___imagem__")), vec!["uma", "imagem"]);
}

#[test]
fn test_exclamation_removed_from_accented_word() {
    assert_eq!(clean("café!!"), "café");
}

#[test]
fn test_empty_input() {
    assert_eq!(clean(""), "");
    assert!(tokenize(&clean("")).is_empty());
}

#[test]
fn test_recognizer_noise() {
    assert_eq!(clean("\"Olá,\" disse ela... (sorrindo)"), "Olá disse ela sorrindo");
    assert_eq!(clean("«mil» — palavras"), "mil palavras");
}

#[test]
fn test_tokens_have_no_whitespace() {
    let cleaned = clean(" a\u{00A0}b\t\tc\r\nd ");
    for token in tokenize(&cleaned) {
        assert!(!token.chars().any(char::is_whitespace));
        assert!(!token.is_empty());
    }
    assert_eq!(cleaned, "a b c d");
}
