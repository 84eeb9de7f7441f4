// Tokenizer: lowercase alphanumeric runs, stop words removed, optionally
// Snowball-stemmed, counted as unigrams and optionally word n-grams.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex_lite::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use stop_words::{get, LANGUAGE};

use crate::featureset::TermCounts;

static TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-z0-9]+").unwrap());

/// Tokens that are noise in URLs and page chrome but missing from the
/// standard English list.
const EXTRA_STOP_WORDS: [&str; 3] = ["i", "http", "www"];

pub struct Tokenizer {
    stop_words: HashSet<String>,
    stemmer: Option<Stemmer>,
    /// Longest n-gram counted; 1 means unigrams only
    ngram_max: usize,
}

impl Tokenizer {
    pub fn new(stem: bool) -> Self {
        let mut stop_words: HashSet<String> = get(LANGUAGE::English).into_iter().collect();
        stop_words.extend(EXTRA_STOP_WORDS.iter().map(|w| w.to_string()));

        Self {
            stop_words,
            stemmer: stem.then(|| Stemmer::create(Algorithm::English)),
            ngram_max: 1,
        }
    }

    /// Also count runs of up to `max` consecutive tokens, joined by a space.
    pub fn ngrams(mut self, max: usize) -> Self {
        self.ngram_max = max.max(1);
        self
    }

    /// Split text into tokens. Single characters and stop words are dropped
    /// before stemming.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let lower = text.to_lowercase();
        TOKEN
            .find_iter(&lower)
            .map(|m| m.as_str())
            .filter(|t| t.len() > 1 && !self.stop_words.contains(*t))
            .map(|t| match &self.stemmer {
                Some(stemmer) => stemmer.stem(t).into_owned(),
                None => t.to_string(),
            })
            .collect()
    }

    /// Token and n-gram counts of a text. N-grams are formed after stop
    /// words are removed.
    pub fn count(&self, text: &str) -> TermCounts {
        let tokens = self.tokenize(text);
        let mut counts = TermCounts::new();
        for n in 1..=self.ngram_max {
            for gram in tokens.windows(n) {
                *counts.entry(gram.join(" ")).or_insert(0.0) += 1.0;
            }
        }
        counts
    }
}
