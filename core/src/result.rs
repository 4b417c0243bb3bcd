use crate::cmp_ignore_case;
use crate::index::InvertedIndex;
use crate::query::Query;
use std::cmp::Ordering;

/// How query terms are matched against indexed words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    /// Term must equal an indexed word.
    Exact,
    /// Term is a prefix of the indexed word.
    #[default]
    Partial,
}

/// One matching location for a query.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub location: String,
    /// Matched occurrences at the location.
    pub count: usize,
    /// `count` divided by the location's total word count.
    pub score: f64,
}

impl SearchResult {
    pub fn new(location: String, count: usize, total_words: usize) -> Self {
        let score = count as f64 / total_words as f64;
        Self { location, count, score }
    }

    /// Location with path separators normalized to `/`.
    pub fn display_location(&self) -> String {
        self.location.replace('\\', "/")
    }

    /// Score with exactly eight decimals, as written to results files.
    pub fn formatted_score(&self) -> String {
        format!("{:.8}", self.score)
    }
}

/// Relevance order: higher score, then higher count, then location
/// compared case-insensitively.
pub fn by_relevance(a: &SearchResult, b: &SearchResult) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| b.count.cmp(&a.count))
        .then_with(|| cmp_ignore_case(&a.location, &b.location))
}

/// Stable sort by [`by_relevance`]; full ties keep their current order.
pub fn rank(results: &mut [SearchResult]) {
    results.sort_by(by_relevance);
}

/// Ranked results for a single query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResults {
    pub query: Query,
    pub results: Vec<SearchResult>,
}

/// Evaluate every query against a fully built index.
///
/// With `threads > 1` the queries are split into contiguous chunks and
/// searched on scoped threads that share the index read-only. Output order
/// always matches `queries`.
pub fn search_all(index: &InvertedIndex, queries: &[Query], mode: SearchMode, threads: usize) -> Vec<QueryResults> {
    let run = |chunk: &[Query]| -> Vec<QueryResults> {
        chunk
            .iter()
            .map(|q| QueryResults { query: q.clone(), results: index.search(q, mode) })
            .collect()
    };

    if threads <= 1 || queries.len() <= 1 {
        return run(queries);
    }

    let run = &run;
    let chunk_size = queries.len().div_ceil(threads);
    std::thread::scope(|s| {
        let handles: Vec<_> = queries
            .chunks(chunk_size)
            .map(|chunk| s.spawn(move || run(chunk)))
            .collect();
        handles
            .into_iter()
            .flat_map(|h| match h.join() {
                Ok(out) => out,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect()
    })
}
