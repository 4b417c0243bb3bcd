pub mod builder;
pub mod finder;
pub mod index;
pub mod json;
pub mod query;
pub mod result;
pub mod tokenizer;

use std::cmp::Ordering;

pub use builder::{BuildStats, IndexBuilder};
pub use index::InvertedIndex;
pub use query::{parse_queries, Query, QuerySet};
pub use result::{by_relevance, search_all, QueryResults, SearchMode, SearchResult};

/// Compare two strings character by character after lowercasing.
pub fn cmp_ignore_case(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}
