use std::collections::BTreeSet;

use log::debug;
use serde::{Deserialize, Serialize};

use super::FrequencyCounter;
use crate::data::filter::FilteredView;
use crate::data::model::TextField;

// ---------------------------------------------------------------------------
// Stop-words
// ---------------------------------------------------------------------------

const DEFAULT_STOP_WORDS: [&str; 14] = [
    "the", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by", "a", "an",
];

/// Tokens excluded from frequency analysis regardless of count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StopWords(BTreeSet<String>);

impl Default for StopWords {
    fn default() -> Self {
        StopWords::new(DEFAULT_STOP_WORDS)
    }
}

impl StopWords {
    /// Build a stop-word set. Words are lower-cased to match tokens.
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        StopWords(words.into_iter().map(|w| w.as_ref().to_lowercase()).collect())
    }

    pub fn none() -> Self {
        StopWords(BTreeSet::new())
    }

    pub fn contains(&self, token: &str) -> bool {
        self.0.contains(token)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Word-analysis settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WordOptions {
    /// Entries shown in the ranked word chart.
    pub top_n: usize,
    /// Tokens must be strictly longer than this many characters.
    pub min_length: usize,
    pub stop_words: StopWords,
}

impl Default for WordOptions {
    fn default() -> Self {
        Self {
            top_n: 15,
            min_length: 2,
            stop_words: StopWords::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tokenization
// ---------------------------------------------------------------------------

/// Lower-case and split on whitespace. Punctuation stays attached to words.
pub fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split_whitespace().map(str::to_lowercase)
}

/// Every token of `field` across the view, in view order. Word-cloud input.
pub fn tokens(view: &FilteredView<'_>, field: TextField) -> Vec<String> {
    view.iter()
        .filter_map(|r| field.value(r))
        .flat_map(tokenize)
        .collect()
}

// ---------------------------------------------------------------------------
// WordFrequencyTable
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordCount {
    pub word: String,
    pub count: usize,
}

/// Token counts ordered by descending count, ties in first-encountered order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct WordFrequencyTable {
    entries: Vec<WordCount>,
}

impl WordFrequencyTable {
    /// The `n` most frequent words.
    pub fn top(&self, n: usize) -> &[WordCount] {
        &self.entries[..n.min(self.entries.len())]
    }

    pub fn entries(&self) -> &[WordCount] {
        &self.entries
    }

    pub fn get(&self, word: &str) -> Option<usize> {
        self.entries.iter().find(|e| e.word == word).map(|e| e.count)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Count the words of `field` across the view.
///
/// A token is dropped when it is a stop-word or has `min_length` characters
/// or fewer. Empty text yields an empty table.
pub fn word_frequencies(
    view: &FilteredView<'_>,
    field: TextField,
    stop_words: &StopWords,
    min_length: usize,
) -> WordFrequencyTable {
    let counter: FrequencyCounter<String> = view
        .iter()
        .filter_map(|r| field.value(r))
        .flat_map(tokenize)
        .filter(|token| !stop_words.contains(token) && token.chars().count() > min_length)
        .collect();
    debug!("Counted {} distinct {:?} words", counter.len(), field);

    WordFrequencyTable {
        entries: counter
            .ranked()
            .into_iter()
            .map(|(word, count)| WordCount { word, count })
            .collect(),
    }
}

/// The ranked top words of `field` under `options`.
pub fn top_words(view: &FilteredView<'_>, field: TextField, options: &WordOptions) -> Vec<WordCount> {
    word_frequencies(view, field, &options.stop_words, options.min_length)
        .top(options.top_n)
        .to_vec()
}
