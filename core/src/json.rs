//! Tab-indented JSON output for the index, word counts and search results.
//!
//! Everything goes through `serde_json` with a `PrettyFormatter` indenting by
//! one tab. Maps come out in the order they are given, so callers hand over
//! already sorted data; empty maps and arrays render as `{}` and `[]`.
//! Scores are written as strings with exactly eight decimals.

use crate::index::InvertedIndex;
use crate::result::{QueryResults, SearchResult};
use anyhow::{Context, Result};
use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};
use serde_json::ser::PrettyFormatter;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Serialize `value` as tab-indented JSON into `writer`.
pub fn to_writer_pretty<W: Write, T: Serialize + ?Sized>(writer: W, value: &T) -> serde_json::Result<()> {
    let mut ser = serde_json::Serializer::with_formatter(writer, PrettyFormatter::with_indent(b"\t"));
    value.serialize(&mut ser)
}

pub fn to_string_pretty<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    let mut buf = Vec::new();
    to_writer_pretty(&mut buf, value)?;
    // serde_json only emits valid UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

fn write_file<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let f = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut out = BufWriter::new(f);
    to_writer_pretty(&mut out, value).with_context(|| format!("writing {}", path.display()))?;
    out.flush().with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

impl Serialize for SearchResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut st = serializer.serialize_struct("SearchResult", 3)?;
        st.serialize_field("where", &self.display_location())?;
        st.serialize_field("count", &self.count)?;
        st.serialize_field("score", &self.formatted_score())?;
        st.end()
    }
}

/// Query string to ranked results, in the order given.
struct ResultsDoc<'a>(&'a [QueryResults]);

impl Serialize for ResultsDoc<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for qr in self.0 {
            map.serialize_entry(qr.query.as_str(), &qr.results)?;
        }
        map.end()
    }
}

pub fn index_to_string(index: &InvertedIndex) -> Result<String> {
    Ok(to_string_pretty(index)?)
}

pub fn counts_to_string(counts: &BTreeMap<String, usize>) -> Result<String> {
    Ok(to_string_pretty(counts)?)
}

pub fn results_to_string(results: &[QueryResults]) -> Result<String> {
    Ok(to_string_pretty(&ResultsDoc(results))?)
}

/// Write word -> location -> positions.
pub fn write_index(index: &InvertedIndex, path: &Path) -> Result<()> {
    write_file(path, index)?;
    tracing::info!(path = %path.display(), words = index.num_words(), "wrote index");
    Ok(())
}

/// Write location -> word count.
pub fn write_counts(index: &InvertedIndex, path: &Path) -> Result<()> {
    write_file(path, index.counts())?;
    tracing::info!(path = %path.display(), locations = index.num_locations(), "wrote counts");
    Ok(())
}

/// Write query -> ranked results.
pub fn write_results(results: &[QueryResults], path: &Path) -> Result<()> {
    write_file(path, &ResultsDoc(results))?;
    tracing::info!(path = %path.display(), queries = results.len(), "wrote results");
    Ok(())
}
