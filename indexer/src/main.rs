use clap::Parser;
use posindex_core::json::{write_counts, write_index, write_results};
use posindex_core::{parse_queries, search_all, IndexBuilder, InvertedIndex, Query, SearchMode};
use tracing_subscriber::{fmt, EnvFilter};

use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Instant;

const DEFAULT_THREADS: usize = 5;

#[derive(Parser, Debug)]
#[command(name = "posindex")]
#[command(about = "Build a word-position inverted index over text files and search it", long_about = None)]
#[command(args_override_self = true)]
struct Cli {
    /// Text file or directory to index
    #[arg(long, value_name = "PATH")]
    path: Option<Option<PathBuf>>,
    /// Write the index as JSON [default: index.json]
    #[arg(long, value_name = "FILE")]
    index: Option<Option<PathBuf>>,
    /// Write per-file word counts as JSON [default: counts.json]
    #[arg(long, value_name = "FILE")]
    counts: Option<Option<PathBuf>>,
    /// File with one query per line
    #[arg(long, value_name = "FILE")]
    query: Option<Option<PathBuf>>,
    /// Match query terms exactly instead of as prefixes
    #[arg(long)]
    exact: bool,
    /// Write ranked search results as JSON [default: results.json]
    #[arg(long, value_name = "FILE")]
    results: Option<Option<PathBuf>>,
    /// Worker threads for building and searching [default: 5]
    #[arg(long, value_name = "N")]
    threads: Option<Option<usize>>,
}

impl Cli {
    fn threads(&self) -> usize {
        match self.threads {
            None => 1,
            Some(Some(n)) if n >= 1 => n,
            Some(_) => DEFAULT_THREADS,
        }
    }

    fn mode(&self) -> SearchMode {
        if self.exact { SearchMode::Exact } else { SearchMode::Partial }
    }
}

/// Flags that take an optional value.
const VALUE_FLAGS: [&str; 6] = ["path", "index", "counts", "query", "results", "threads"];

/// Name of a `-flag` or `--flag` token. Values never start with a dash and a letter.
fn flag_name(arg: &str) -> Option<&str> {
    let name = arg.strip_prefix("--").or_else(|| arg.strip_prefix('-'))?;
    name.starts_with(|c: char| c.is_ascii_alphabetic()).then_some(name)
}

/// Rewrite known flags (`-path` or `--path`) into `--path[=value]` form and
/// drop everything else, so unknown flags and stray values never abort the run.
/// A `-threads` value that is not a number is dropped as well.
fn normalize_flags<I: IntoIterator<Item = OsString>>(args: I) -> Vec<OsString> {
    let mut args = args.into_iter().peekable();
    let mut out: Vec<OsString> = args.next().into_iter().collect();

    while let Some(arg) = args.next() {
        let Some(name) = arg.to_str().and_then(flag_name).map(str::to_string) else {
            tracing::debug!(?arg, "ignoring value without a flag");
            continue;
        };
        match name.as_str() {
            "h" | "help" => out.push(OsString::from("--help")),
            "exact" => out.push(OsString::from("--exact")),
            n if VALUE_FLAGS.contains(&n) => {
                let has_value = args
                    .peek()
                    .is_some_and(|v| v.to_str().map_or(true, |s| flag_name(s).is_none()));
                let value = if has_value { args.next() } else { None };
                let value = value
                    .filter(|v| !v.is_empty())
                    .filter(|v| n != "threads" || v.to_str().is_some_and(|s| s.parse::<usize>().is_ok()));
                let mut flag = OsString::from(format!("--{n}"));
                if let Some(v) = value {
                    flag.push("=");
                    flag.push(v);
                }
                out.push(flag);
            }
            _ => tracing::warn!(flag = %name, "ignoring unknown flag"),
        }
    }
    out
}

/// Flag present with or without a value: use the value or fall back to `default`.
fn output_path(flag: &Option<Option<PathBuf>>, default: &str) -> Option<PathBuf> {
    flag.as_ref().map(|p| p.clone().unwrap_or_else(|| PathBuf::from(default)))
}

fn report(err: &anyhow::Error, message: String) {
    tracing::warn!(error = %format!("{err:#}"), "{message}");
    println!("{message}");
}

fn build_index(cli: &Cli) -> InvertedIndex {
    let mut builder = IndexBuilder::new();
    if let Some(Some(root)) = &cli.path {
        match builder.build_parallel(root, cli.threads()) {
            Ok(stats) => {
                for (file, err) in &stats.failures {
                    report(err, format!("Unable to read file while building index: {}", file.display()));
                }
            }
            Err(e) => report(&e, format!("Unable to generate index from path: {}", root.display())),
        }
    }
    builder.finish()
}

fn read_queries(cli: &Cli) -> Vec<Query> {
    match &cli.query {
        Some(Some(file)) => parse_queries(file).unwrap_or_else(|e| {
            report(&e, format!("Query file ({}) could not be read.", file.display()));
            Vec::new()
        }),
        _ => Vec::new(),
    }
}

fn run(cli: &Cli) {
    let index = build_index(cli);

    if let Some(path) = output_path(&cli.index, "index.json") {
        if let Err(e) = write_index(&index, &path) {
            report(&e, format!("Unable to write index to file at: {}", path.display()));
        }
    }

    if let Some(path) = output_path(&cli.counts, "counts.json") {
        if let Err(e) = write_counts(&index, &path) {
            report(&e, format!("Unable to write counts to file at: {}", path.display()));
        }
    }

    let queries = read_queries(cli);

    if let Some(path) = output_path(&cli.results, "results.json") {
        let results = search_all(&index, &queries, cli.mode(), cli.threads());
        if let Err(e) = write_results(&results, &path) {
            report(&e, format!("Unable to write search results to file at: {}", path.display()));
        }
    }
}

fn main() {
    let start = Instant::now();
    fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(std::io::stderr).init();
    let cli = Cli::parse_from(normalize_flags(std::env::args_os()));

    run(&cli);

    println!("Elapsed: {:.6} seconds", start.elapsed().as_secs_f64());
}
