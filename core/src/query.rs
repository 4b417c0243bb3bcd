use crate::tokenizer::unique_stems;
use crate::cmp_ignore_case;
use anyhow::{Context, Result};
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// A search request: distinct stemmed terms kept in sorted order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Query {
    terms: Vec<String>,
    text: String,
}

impl Query {
    /// Builds a query from an already stemmed term set. Returns `None` when empty.
    pub fn from_terms(terms: BTreeSet<String>) -> Option<Self> {
        if terms.is_empty() {
            return None;
        }
        let terms: Vec<String> = terms.into_iter().collect();
        let text = terms.join(" ");
        Some(Self { terms, text })
    }

    /// Normalizes and stems a raw line into a query.
    pub fn parse(line: &str) -> Option<Self> {
        Self::from_terms(unique_stems(line))
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Canonical form: sorted terms joined by single spaces.
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Orders queries by canonical string, ignoring case.
pub fn by_canonical(a: &Query, b: &Query) -> std::cmp::Ordering {
    cmp_ignore_case(a.as_str(), b.as_str())
}

/// Collects distinct queries, deduplicating on the canonical term set.
#[derive(Debug, Default)]
pub struct QuerySet {
    seen: HashSet<String>,
    queries: Vec<Query>,
}

impl QuerySet {
    pub fn new() -> Self { Self::default() }

    /// Adds the query for `line`. Returns false if the line had no terms
    /// or an equivalent query is already present.
    pub fn add_line(&mut self, line: &str) -> bool {
        match Query::parse(line) {
            Some(q) => self.add(q),
            None => false,
        }
    }

    pub fn add(&mut self, query: Query) -> bool {
        if !self.seen.insert(query.as_str().to_string()) {
            return false;
        }
        self.queries.push(query);
        true
    }

    /// Reads `path` line by line, adding one query per line with terms.
    pub fn add_file(&mut self, path: &Path) -> Result<usize> {
        let f = File::open(path).with_context(|| format!("opening query file {}", path.display()))?;
        let reader = BufReader::new(f);
        let mut added = 0;
        for line in reader.lines() {
            let line = line.with_context(|| format!("reading query file {}", path.display()))?;
            if self.add_line(&line) {
                added += 1;
            }
        }
        tracing::debug!(path = %path.display(), added, "parsed query file");
        Ok(added)
    }

    pub fn contains(&self, query: &Query) -> bool {
        self.seen.contains(query.as_str())
    }

    pub fn len(&self) -> usize { self.queries.len() }

    pub fn is_empty(&self) -> bool { self.queries.is_empty() }

    /// Consumes the set, returning queries ordered by [`by_canonical`].
    pub fn into_sorted(self) -> Vec<Query> {
        let mut queries = self.queries;
        queries.sort_by(by_canonical);
        queries
    }
}

/// Parses a query file into its sorted, deduplicated queries.
pub fn parse_queries(path: &Path) -> Result<Vec<Query>> {
    let mut set = QuerySet::new();
    set.add_file(path)?;
    Ok(set.into_sorted())
}
