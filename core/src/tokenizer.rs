use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use unicode_normalization::UnicodeNormalization;
use std::collections::BTreeSet;

lazy_static! {
    static ref CLEAN: Regex = Regex::new(r"[^\p{Alphabetic}\p{White_Space}]+").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
}

/// Split a line into cleaned lowercase words.
///
/// The line is NFD-decomposed so accents become separate combining marks, then
/// everything that is neither a letter nor whitespace is dropped. Punctuation
/// inside a word is removed rather than treated as a separator ("don't" -> "dont").
pub fn normalize(line: &str) -> Vec<String> {
    let decomposed = line.nfd().collect::<String>();
    let cleaned = CLEAN.replace_all(&decomposed, "").to_lowercase();
    cleaned.split_whitespace().map(str::to_string).collect()
}

/// Reduce a single cleaned token to its Snowball English stem.
pub fn stem(token: &str) -> String {
    STEMMER.stem(token).into_owned()
}

/// Stems of every token in the line, in appearance order, duplicates kept.
pub fn stems(line: &str) -> Vec<String> {
    normalize(line).iter().map(|t| stem(t)).collect()
}

/// Sorted, deduplicated stems of the line.
pub fn unique_stems(line: &str) -> BTreeSet<String> {
    normalize(line).iter().map(|t| stem(t)).collect()
}
