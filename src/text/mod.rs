// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Post-processing of recognizer output

pub mod cleaning;
pub mod repair;

pub use cleaning::{tokenize, TextCleaner};
pub use repair::{
    render, RepairConfig, TextRepairer, TokenRepair, DEFAULT_CUSTOM_WORDS, DEFAULT_MIN_PART_LEN,
    DEFAULT_SPLIT_MIN_LENGTH,
};
