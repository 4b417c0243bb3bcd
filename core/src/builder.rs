use crate::finder::find_text_files;
use crate::index::InvertedIndex;
use crate::tokenizer::stems;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;

/// Outcome of a build over a directory tree.
#[derive(Debug, Default)]
pub struct BuildStats {
    /// Files read and indexed.
    pub files: usize,
    /// Words inserted across all files.
    pub words: usize,
    /// Files that were discovered but could not be read.
    pub failures: Vec<(PathBuf, anyhow::Error)>,
}

/// Location key used for a file: its path as given.
pub fn location_of(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn for_each_stem<R: BufRead>(reader: R, mut f: impl FnMut(String)) -> io::Result<()> {
    for line in reader.lines() {
        for stem in stems(&line?) {
            f(stem);
        }
    }
    Ok(())
}

/// Index everything readable from `reader` under `location`.
///
/// Positions start at 1 and advance once per token across all lines.
/// Returns the number of tokens seen.
pub fn add_reader<R: BufRead>(reader: R, location: &str, index: &mut InvertedIndex) -> io::Result<usize> {
    let mut position = 0;
    for_each_stem(reader, |stem| {
        position += 1;
        index.add(&stem, location, position);
    })?;
    Ok(position)
}

/// Index a single file, keyed by its path.
///
/// The whole file is read before anything is inserted, so a file that fails
/// partway through leaves the index untouched.
pub fn add_file(path: &Path, index: &mut InvertedIndex) -> Result<usize> {
    let words = read_stems(path)?;
    index.add_all(&words, &location_of(path), 1);
    tracing::debug!(path = %path.display(), words = words.len(), "indexed file");
    Ok(words.len())
}

fn read_stems(path: &Path) -> Result<Vec<String>> {
    let f = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut out = Vec::new();
    for_each_stem(BufReader::new(f), |stem| out.push(stem))
        .with_context(|| format!("reading {}", path.display()))?;
    Ok(out)
}

/// Sole writer of an [`InvertedIndex`] during the build phase.
///
/// Call [`IndexBuilder::finish`] to hand the completed index to readers.
#[derive(Debug, Default)]
pub struct IndexBuilder {
    index: InvertedIndex,
}

impl IndexBuilder {
    pub fn new() -> Self { Self::default() }

    pub fn add_file(&mut self, path: &Path) -> Result<usize> {
        add_file(path, &mut self.index)
    }

    /// Index every text file under `root` in discovery order.
    ///
    /// Discovery errors abort. Unreadable files are logged, recorded in the
    /// returned stats, and skipped.
    pub fn build(&mut self, root: &Path) -> Result<BuildStats> {
        let files = find_text_files(root)?;
        let mut stats = BuildStats::default();
        for file in files {
            match self.add_file(&file) {
                Ok(words) => {
                    stats.files += 1;
                    stats.words += words;
                }
                Err(e) => {
                    tracing::warn!(path = %file.display(), error = %e, "skipping unreadable file");
                    stats.failures.push((file, e));
                }
            }
        }
        tracing::info!(files = stats.files, words = stats.words, "index build complete");
        Ok(stats)
    }

    /// Like [`IndexBuilder::build`], but files are read and tokenized on
    /// `threads` workers. Stems are sent back over a channel and inserted by
    /// the calling thread only, so the index has a single writer throughout.
    /// Both builds skip a failing file entirely and produce the same index.
    pub fn build_parallel(&mut self, root: &Path, threads: usize) -> Result<BuildStats> {
        if threads <= 1 {
            return self.build(root);
        }
        let files = find_text_files(root)?;
        let next = AtomicUsize::new(0);
        let (tx, rx) = mpsc::channel::<(usize, Result<Vec<String>>)>();
        let mut stats = BuildStats::default();

        std::thread::scope(|s| {
            for _ in 0..threads.min(files.len()) {
                let tx = tx.clone();
                let (next, files) = (&next, &files);
                s.spawn(move || loop {
                    let i = next.fetch_add(1, Ordering::Relaxed);
                    let Some(path) = files.get(i) else { break };
                    if tx.send((i, read_stems(path))).is_err() {
                        break;
                    }
                });
            }
            drop(tx);

            for (i, outcome) in rx {
                let path = &files[i];
                match outcome {
                    Ok(words) => {
                        let location = location_of(path);
                        stats.files += 1;
                        stats.words += words.len();
                        self.index.add_all(&words, &location, 1);
                        tracing::debug!(path = %path.display(), words = words.len(), "indexed file");
                    }
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "skipping unreadable file");
                        stats.failures.push((path.clone(), e));
                    }
                }
            }
        });

        tracing::info!(files = stats.files, words = stats.words, threads, "index build complete");
        Ok(stats)
    }

    pub fn index(&self) -> &InvertedIndex {
        &self.index
    }

    pub fn finish(self) -> InvertedIndex {
        self.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Cursor;

    #[test]
    fn positions_continue_across_lines() {
        let mut idx = InvertedIndex::new();
        let text = "The running\n\n42 !!\nrunner RUNS";
        let n = add_reader(Cursor::new(text), "mem", &mut idx).unwrap();
        assert_eq!(n, 4);
        assert!(idx.contains("the", "mem", 1));
        assert!(idx.contains("run", "mem", 2));
        assert!(idx.contains("runner", "mem", 3));
        assert!(idx.contains("run", "mem", 4));
        assert_eq!(idx.word_count("mem"), 4);
    }

    #[test]
    fn missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut idx = InvertedIndex::new();
        assert!(add_file(&dir.path().join("gone.txt"), &mut idx).is_err());
        assert!(idx.is_empty());
    }

    #[test]
    fn parallel_build_matches_sequential() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("one.txt"), "apple banana apple\ncherry").unwrap();
        fs::write(dir.path().join("two.txt"), "banana bread").unwrap();
        fs::write(dir.path().join("sub/three.text"), "cherry pie\napple tart").unwrap();
        fs::write(dir.path().join("skip.md"), "ignored words").unwrap();

        let mut seq = IndexBuilder::new();
        let seq_stats = seq.build(dir.path()).unwrap();
        let mut par = IndexBuilder::new();
        let par_stats = par.build_parallel(dir.path(), 4).unwrap();

        assert_eq!(seq_stats.files, 3);
        assert_eq!(par_stats.files, 3);
        assert_eq!(seq_stats.words, par_stats.words);
        assert_eq!(seq.finish(), par.finish());
    }

    #[test]
    fn file_failing_midway_is_skipped_by_both_builds() {
        let dir = tempfile::tempdir().unwrap();
        let mut bad = b"alpha beta\n".to_vec();
        bad.extend_from_slice(&[0xff, 0xfe]);
        fs::write(dir.path().join("bad.txt"), bad).unwrap();
        fs::write(dir.path().join("good.txt"), "gamma").unwrap();

        let mut seq = IndexBuilder::new();
        let seq_stats = seq.build(dir.path()).unwrap();
        let mut par = IndexBuilder::new();
        let par_stats = par.build_parallel(dir.path(), 3).unwrap();

        for stats in [&seq_stats, &par_stats] {
            assert_eq!(stats.files, 1);
            assert_eq!(stats.failures.len(), 1);
            assert!(stats.failures[0].0.ends_with("bad.txt"));
        }

        let seq = seq.finish();
        assert_eq!(seq.num_locations(), 1);
        assert!(!seq.contains_word("alpha"));
        assert_eq!(seq.word_count(&location_of(&dir.path().join("good.txt"))), 1);
        assert_eq!(seq, par.finish());
    }
}
