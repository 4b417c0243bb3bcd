use crate::query::Query;
use crate::result::{rank, SearchMode, SearchResult};
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;

/// Positions of a word, keyed by location.
pub type Postings = BTreeMap<String, BTreeSet<usize>>;

/// Word-position inverted index.
///
/// Maps each stemmed word to the locations it occurs in and the 1-based
/// positions within each location. Alongside it, every location carries the
/// number of distinct positions recorded there, which is the denominator for
/// result scores.
///
/// The index only grows. Build it through a single owner (see
/// [`crate::builder::IndexBuilder`]) and share it by `&` reference afterwards;
/// every accessor here is read-only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvertedIndex {
    words: BTreeMap<String, Postings>,
    counts: BTreeMap<String, usize>,
}

impl InvertedIndex {
    pub fn new() -> Self { Self::default() }

    /// Record `word` at `position` in `location`.
    ///
    /// Returns true if the position was new for this word and location. Only
    /// new positions bump the location's word count, so repeating an
    /// insertion leaves both the postings and the count unchanged.
    pub fn add(&mut self, word: &str, location: &str, position: usize) -> bool {
        let positions = self
            .words
            .entry(word.to_string())
            .or_default()
            .entry(location.to_string())
            .or_default();
        if !positions.insert(position) {
            return false;
        }
        *self.counts.entry(location.to_string()).or_insert(0) += 1;
        true
    }

    /// Record every word of `words` at consecutive positions starting from `start`.
    pub fn add_all<I, S>(&mut self, words: I, location: &str, start: usize)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for (offset, word) in words.into_iter().enumerate() {
            self.add(word.as_ref(), location, start + offset);
        }
    }

    pub fn contains_word(&self, word: &str) -> bool {
        self.words.contains_key(word)
    }

    pub fn contains_location(&self, word: &str, location: &str) -> bool {
        self.words.get(word).is_some_and(|p| p.contains_key(location))
    }

    pub fn contains(&self, word: &str, location: &str, position: usize) -> bool {
        self.positions(word, location).is_some_and(|p| p.contains(&position))
    }

    /// All indexed words, in sorted order.
    pub fn words(&self) -> impl Iterator<Item = &str> + '_ {
        self.words.keys().map(String::as_str)
    }

    /// Locations where `word` occurs; empty for unknown words.
    pub fn locations<'a>(&'a self, word: &str) -> impl Iterator<Item = &'a str> + 'a {
        self.words
            .get(word)
            .into_iter()
            .flat_map(|p| p.keys().map(String::as_str))
    }

    pub fn positions(&self, word: &str, location: &str) -> Option<&BTreeSet<usize>> {
        self.words.get(word)?.get(location)
    }

    /// Number of positions of `word` in `location`, zero when absent.
    pub fn occurrences(&self, word: &str, location: &str) -> usize {
        self.positions(word, location).map_or(0, BTreeSet::len)
    }

    /// Distinct positions recorded for `location`, zero for unknown locations.
    pub fn word_count(&self, location: &str) -> usize {
        self.counts.get(location).copied().unwrap_or(0)
    }

    /// Location to word count, sorted by location.
    pub fn counts(&self) -> &BTreeMap<String, usize> {
        &self.counts
    }

    pub fn num_words(&self) -> usize { self.words.len() }

    pub fn num_locations(&self) -> usize { self.counts.len() }

    pub fn is_empty(&self) -> bool { self.words.is_empty() }

    /// Words starting with `prefix`, with their postings.
    fn prefixed<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = (&'a String, &'a Postings)> + 'a {
        self.words
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(move |(w, _)| w.starts_with(prefix))
    }

    /// Rank locations by how often the query's exact terms occur there.
    pub fn exact_search(&self, query: &Query) -> Vec<SearchResult> {
        self.score_locations(|location| {
            query.terms().iter().map(|t| self.occurrences(t, location)).sum()
        })
    }

    /// Rank locations by occurrences of any word that starts with a query term.
    ///
    /// Each query term contributes independently: a word matched by two
    /// different terms is counted once for each of them.
    pub fn partial_search(&self, query: &Query) -> Vec<SearchResult> {
        self.score_locations(|location| {
            query
                .terms()
                .iter()
                .flat_map(|t| self.prefixed(t))
                .map(|(_, postings)| postings.get(location).map_or(0, BTreeSet::len))
                .sum()
        })
    }

    pub fn search(&self, query: &Query, mode: SearchMode) -> Vec<SearchResult> {
        match mode {
            SearchMode::Exact => self.exact_search(query),
            SearchMode::Partial => self.partial_search(query),
        }
    }

    fn score_locations<F>(&self, count_at: F) -> Vec<SearchResult>
    where
        F: Fn(&str) -> usize,
    {
        let mut results: Vec<SearchResult> = self
            .counts
            .iter()
            .filter_map(|(location, &total)| {
                let count = count_at(location.as_str());
                (count > 0).then(|| SearchResult::new(location.clone(), count, total))
            })
            .collect();
        rank(&mut results);
        results
    }
}

impl Serialize for InvertedIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.words.serialize(serializer)
    }
}
