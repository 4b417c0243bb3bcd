use posindex_core::builder::{location_of, IndexBuilder};
use posindex_core::json::{index_to_string, results_to_string, write_counts, write_index, write_results};
use posindex_core::{parse_queries, search_all, InvertedIndex, SearchMode};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn build(root: &Path) -> InvertedIndex {
    let mut builder = IndexBuilder::new();
    let stats = builder.build(root).unwrap();
    assert!(stats.failures.is_empty());
    builder.finish()
}

fn corpus(dir: &Path) {
    fs::create_dir_all(dir.join("docs")).unwrap();
    fs::write(dir.join("docs/runners.txt"), "the running runner runs").unwrap();
    fs::write(dir.join("docs/walks.TEXT"), "walking is not running\nrunning is not walking").unwrap();
    fs::write(dir.join("docs/readme.md"), "running running running").unwrap();
    fs::write(dir.join("empty.txt"), "\n  \n").unwrap();
}

#[test]
fn exact_and_partial_counts() {
    let dir = tempdir().unwrap();
    corpus(dir.path());
    let index = build(dir.path());
    let runners = location_of(&dir.path().join("docs/runners.txt"));

    assert_eq!(index.word_count(&runners), 4);
    assert!(index.contains("run", &runners, 2));
    assert!(index.contains("run", &runners, 4));
    // blank file contributes no location
    assert_eq!(index.num_locations(), 2);

    let q = posindex_core::Query::parse("run").unwrap();
    let exact = index.exact_search(&q);
    let hit = exact.iter().find(|r| r.location == runners).unwrap();
    assert_eq!(hit.count, 2);

    let partial = index.partial_search(&q);
    let hit = partial.iter().find(|r| r.location == runners).unwrap();
    assert_eq!(hit.count, 3);
    assert_eq!(hit.score, 0.75);
}

#[test]
fn ranking_across_files() {
    let dir = tempdir().unwrap();
    corpus(dir.path());
    let index = build(dir.path());
    let q = posindex_core::Query::parse("walk running").unwrap();
    let results = index.exact_search(&q);
    // walks: 2 walk + 2 run out of 8 = 0.5; runners: 2 run out of 4 = 0.5
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].count, 4);
    assert!(results[0].location.ends_with("walks.TEXT"));
    assert!(results[1].location.ends_with("runners.txt"));
    assert_eq!(results[0].score, results[1].score);
}

#[test]
fn index_json_round_trips() {
    let dir = tempdir().unwrap();
    corpus(dir.path());
    let index = build(dir.path());
    let parsed: Value = serde_json::from_str(&index_to_string(&index).unwrap()).unwrap();

    let mut rebuilt: BTreeMap<String, BTreeMap<String, BTreeSet<usize>>> = BTreeMap::new();
    for (word, locations) in parsed.as_object().unwrap() {
        for (location, positions) in locations.as_object().unwrap() {
            let set = positions.as_array().unwrap().iter().map(|p| p.as_u64().unwrap() as usize).collect();
            rebuilt.entry(word.clone()).or_default().insert(location.clone(), set);
        }
    }

    let words: Vec<&str> = index.words().collect();
    assert_eq!(rebuilt.keys().map(String::as_str).collect::<Vec<_>>(), words);
    for word in words {
        for location in index.locations(word) {
            assert_eq!(Some(&rebuilt[word][location]), index.positions(word, location));
        }
    }
}

#[test]
fn queries_file_to_results_file() {
    let dir = tempdir().unwrap();
    corpus(dir.path());
    let index = build(dir.path());
    let query_file = dir.path().join("queries.list");
    fs::write(&query_file, "walking running\n\nrunning walking\n!!!\nzzz\nRUN\n").unwrap();

    let queries = parse_queries(&query_file).unwrap();
    let texts: Vec<&str> = queries.iter().map(|q| q.as_str()).collect();
    assert_eq!(texts, vec!["run", "run walk", "zzz"]);

    let results = search_all(&index, &queries, SearchMode::Partial, 2);
    let out = dir.path().join("results.json");
    write_results(&results, &out).unwrap();
    let parsed: Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    let obj = parsed.as_object().unwrap();
    assert_eq!(obj.len(), 3);
    assert!(obj["zzz"].as_array().unwrap().is_empty());

    // runners: run + runner = 3 of 4; walks: run + walk = 4 of 8
    let ranked = obj["run walk"].as_array().unwrap();
    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0]["count"], 3);
    assert_eq!(ranked[0]["score"], "0.75000000");
    assert!(ranked[0]["where"].as_str().unwrap().ends_with("docs/runners.txt"));
    assert_eq!(ranked[1]["count"], 4);
    let text = fs::read_to_string(&out).unwrap();
    assert!(text.contains("\"score\": \"0.75000000\""));
    assert!(text.contains("\"score\": \"0.50000000\""));
}

#[test]
fn empty_inputs_write_empty_objects() {
    let dir = tempdir().unwrap();
    let index = InvertedIndex::new();
    let query_file = dir.path().join("queries.txt");
    fs::write(&query_file, "").unwrap();
    let queries = parse_queries(&query_file).unwrap();
    assert!(queries.is_empty());

    let results = search_all(&index, &queries, SearchMode::Exact, 1);
    assert_eq!(results_to_string(&results).unwrap(), "{}");

    let index_path = dir.path().join("index.json");
    let counts_path = dir.path().join("counts.json");
    write_index(&index, &index_path).unwrap();
    write_counts(&index, &counts_path).unwrap();
    assert_eq!(fs::read_to_string(index_path).unwrap(), "{}");
    assert_eq!(fs::read_to_string(counts_path).unwrap(), "{}");
}

#[test]
fn unwritable_output_is_error() {
    let dir = tempdir().unwrap();
    let index = InvertedIndex::new();
    assert!(write_index(&index, &dir.path().join("missing/dir/index.json")).is_err());
}
