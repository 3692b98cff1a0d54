// Dweve Logbench - Log Analytics Benchmark Harness
//
// Copyright (c) 2025 Dweve IP B.V. and individual contributors.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository or at: http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Parallel status-code aggregation.
//!
//! Map: every input file is classified by one worker into its own
//! [`PartialResult`]. Reduce: after all workers have finished, the
//! controller sums the partials key-wise. Files are never split between
//! workers and partials are never shared while being built.

use crate::batch::{BatchConfig, BatchProcessor, FileOperation};
use crate::config::{FailurePolicy, HarnessConfig};
use logbench_core::{classify_line, Classification, LogbenchError, RecordTally, Result, StatusCounts};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// File extensions treated as NDJSON inputs.
pub const INPUT_EXTENSIONS: &[&str] = &["json", "jsonl", "ndjson"];

/// Counts produced by one worker for one file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialResult {
    /// The file this partial covers
    pub path: PathBuf,
    /// Status code counts
    pub counts: StatusCounts,
    /// Record accounting
    pub tally: RecordTally,
}

/// A file left out of the merge under [`FailurePolicy::Skip`].
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedInput {
    pub path: PathBuf,
    pub error: LogbenchError,
}

/// Result of one aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateReport {
    /// Merged counts over every processed file
    pub counts: StatusCounts,
    /// Merged record accounting
    pub tally: RecordTally,
    /// Files that contributed
    pub files: usize,
    /// Files dropped under the skip policy
    pub skipped: Vec<SkippedInput>,
    /// Worker pool size
    pub workers: usize,
    /// Wall time from dispatch to merged result
    pub elapsed: Duration,
}

/// Classifies every line of `reader`.
pub fn classify_reader<R: Read>(reader: R) -> std::io::Result<(StatusCounts, RecordTally)> {
    let mut reader = BufReader::new(reader);
    let mut counts = StatusCounts::new();
    let mut tally = RecordTally::default();
    let mut line = Vec::with_capacity(256);

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        let classification = classify_line(&line);
        if let Classification::Matched(code) = classification {
            counts.record(code);
        }
        tally.observe(classification);
    }

    Ok((counts, tally))
}

/// Streams one file into a [`PartialResult`].
pub fn classify_file(path: &Path) -> Result<PartialResult> {
    let file = File::open(path).map_err(|e| LogbenchError::io_error(path, e))?;
    let (counts, tally) = classify_reader(file).map_err(|e| LogbenchError::io_error(path, e))?;
    debug!(
        file = %path.display(),
        matched = tally.matched,
        excluded = tally.excluded(),
        "file classified"
    );
    Ok(PartialResult {
        path: path.to_path_buf(),
        counts,
        tally,
    })
}

/// Key-wise sum of partials. Order does not matter.
pub fn merge_partials<'a, I>(partials: I) -> (StatusCounts, RecordTally)
where
    I: IntoIterator<Item = &'a PartialResult>,
{
    let mut counts = StatusCounts::new();
    let mut tally = RecordTally::default();
    for partial in partials {
        counts.merge(&partial.counts);
        tally += partial.tally;
    }
    (counts, tally)
}

/// Lists the NDJSON files directly inside `dir`, sorted by path.
///
/// # Errors
///
/// `Input` when `dir` is missing, is not a directory, or holds no input
/// files.
pub fn discover_inputs(dir: &Path) -> Result<Vec<PathBuf>> {
    let metadata = std::fs::metadata(dir)
        .map_err(|e| LogbenchError::input(dir, format!("cannot access location: {}", e)))?;
    if !metadata.is_dir() {
        return Err(LogbenchError::input(dir, "not a directory"));
    }

    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(|e| LogbenchError::input(dir, e.to_string()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && has_input_extension(path))
        .collect();

    if files.is_empty() {
        return Err(LogbenchError::input(
            dir,
            format!("no {} files found", INPUT_EXTENSIONS.join("/")),
        ));
    }
    files.sort();
    Ok(files)
}

fn has_input_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| INPUT_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)))
        .unwrap_or(false)
}

struct ClassifyOperation;

impl FileOperation for ClassifyOperation {
    type Output = PartialResult;

    fn process_file(&self, path: &Path) -> Result<PartialResult> {
        classify_file(path)
    }

    fn name(&self) -> &str {
        "classify"
    }
}

/// Parallel map/reduce over NDJSON files.
#[derive(Debug)]
pub struct StatusAggregator {
    processor: BatchProcessor,
    policy: FailurePolicy,
}

impl StatusAggregator {
    /// Aggregator with `workers` threads (`None`: available parallelism).
    pub fn new(workers: Option<usize>, policy: FailurePolicy) -> Result<Self> {
        let config = BatchConfig {
            max_threads: workers,
        };
        Ok(Self {
            processor: BatchProcessor::new(config)?,
            policy,
        })
    }

    pub fn from_config(config: &HarnessConfig) -> Result<Self> {
        Self::new(config.workers, config.failure_policy)
    }

    pub fn workers(&self) -> usize {
        self.processor.threads()
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Classifies `files` in parallel and merges the partials.
    ///
    /// # Errors
    ///
    /// Under [`FailurePolicy::Abort`], the first failing file's error,
    /// wrapped as `Worker` with its path.
    pub fn aggregate(&self, files: &[PathBuf]) -> Result<AggregateReport> {
        let start = Instant::now();

        let (partials, skipped) = match self.policy {
            FailurePolicy::Abort => (self.processor.try_process(files, &ClassifyOperation)?, Vec::new()),
            FailurePolicy::Skip => {
                let results = self.processor.process(files, &ClassifyOperation);
                let mut partials = Vec::with_capacity(results.total_files());
                let mut skipped = Vec::new();
                for file in results.results {
                    match file.result {
                        Ok(partial) => partials.push(partial),
                        Err(error) => {
                            warn!(file = %file.path.display(), error = %error, "skipping input");
                            skipped.push(SkippedInput {
                                path: file.path,
                                error,
                            });
                        }
                    }
                }
                (partials, skipped)
            }
        };

        let (counts, tally) = merge_partials(&partials);
        let elapsed = start.elapsed();

        info!(
            files = partials.len(),
            skipped = skipped.len(),
            workers = self.workers(),
            matched = tally.matched,
            excluded = tally.excluded(),
            elapsed_s = elapsed.as_secs_f64(),
            "aggregation finished"
        );

        Ok(AggregateReport {
            counts,
            tally,
            files: partials.len(),
            skipped,
            workers: self.workers(),
            elapsed,
        })
    }

    /// [`discover_inputs`] then [`aggregate`](Self::aggregate).
    pub fn aggregate_dir(&self, dir: &Path) -> Result<AggregateReport> {
        let files = discover_inputs(dir)?;
        debug!(dir = %dir.display(), files = files.len(), "inputs discovered");
        self.aggregate(&files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const RECORD_200: &str = r#"{"service":"auth","timestamp":1.0,"message":"HTTP Status Code: 200"}"#;
    const RECORD_404: &str = r#"{"service":"search","timestamp":2.0,"message":"HTTP Status Code: 404"}"#;

    fn write(dir: &Path, name: &str, lines: &[&str]) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, lines.join("\n")).unwrap();
        path
    }

    #[test]
    fn test_classify_reader_counts_and_tally() {
        let input = format!(
            "{}\n{}\n\n{}\nplain text without code\n{{\"message\": 7}}\n",
            RECORD_200, RECORD_404, RECORD_200
        );
        let (counts, tally) = classify_reader(input.as_bytes()).unwrap();
        assert_eq!(counts.to_literal(), "{'200': 2, '404': 1}");
        assert_eq!(tally.records, 5);
        assert_eq!(tally.matched, 3);
        assert_eq!(tally.unmatched, 1);
        assert_eq!(tally.unparseable, 1);
    }

    #[test]
    fn test_last_line_without_newline_is_counted() {
        let (counts, _) = classify_reader(RECORD_404.as_bytes()).unwrap();
        assert_eq!(counts.total(), 1);
    }

    #[test]
    fn test_discover_inputs_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "b.json", &[RECORD_200]);
        write(dir.path(), "a.jsonl", &[RECORD_200]);
        write(dir.path(), "notes.txt", &["ignored"]);
        fs::create_dir(dir.path().join("nested.json")).unwrap();

        let files = discover_inputs(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.jsonl", "b.json"]);
    }

    #[test]
    fn test_discover_inputs_errors() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing");
        assert!(matches!(
            discover_inputs(&missing),
            Err(LogbenchError::Input { .. })
        ));

        let file = write(dir.path(), "x.json", &[RECORD_200]);
        assert!(matches!(discover_inputs(&file), Err(LogbenchError::Input { .. })));

        let empty = dir.path().join("empty");
        fs::create_dir(&empty).unwrap();
        let err = discover_inputs(&empty).unwrap_err();
        assert_eq!(err.exit_code(), logbench_core::error::EXIT_INPUT);
    }

    #[test]
    fn test_aggregate_merges_all_files() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.json", &[RECORD_200, RECORD_200, RECORD_404]);
        write(dir.path(), "b.json", &[RECORD_404, "no code here"]);
        write(dir.path(), "c.json", &[RECORD_200]);

        let aggregator = StatusAggregator::new(Some(2), FailurePolicy::Abort).unwrap();
        let report = aggregator.aggregate_dir(dir.path()).unwrap();
        assert_eq!(report.files, 3);
        assert_eq!(report.workers, 2);
        assert!(report.skipped.is_empty());
        assert_eq!(report.counts.to_literal(), "{'200': 3, '404': 2}");
        assert_eq!(report.tally.matched, report.counts.total());
        assert_eq!(report.tally.unmatched, 1);
    }

    #[test]
    fn test_merge_partials_order_independent() {
        let dir = TempDir::new().unwrap();
        let a = classify_file(&write(dir.path(), "a.json", &[RECORD_200, RECORD_404])).unwrap();
        let b = classify_file(&write(dir.path(), "b.json", &[RECORD_404])).unwrap();

        let forward = merge_partials([&a, &b]);
        let backward = merge_partials([&b, &a]);
        assert_eq!(forward, backward);
        assert_eq!(forward.0.total(), a.counts.total() + b.counts.total());
    }

    #[test]
    fn test_abort_policy_names_failing_file() {
        let dir = TempDir::new().unwrap();
        let good = write(dir.path(), "a.json", &[RECORD_200]);
        let missing = dir.path().join("vanished.json");

        let aggregator = StatusAggregator::new(Some(2), FailurePolicy::Abort).unwrap();
        let err = aggregator.aggregate(&[good, missing]).unwrap_err();
        match err {
            LogbenchError::Worker { input, .. } => assert!(input.ends_with("vanished.json")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_skip_policy_reports_skipped_file() {
        let dir = TempDir::new().unwrap();
        let good = write(dir.path(), "a.json", &[RECORD_200, RECORD_404]);
        let missing = dir.path().join("vanished.json");

        let aggregator = StatusAggregator::new(Some(2), FailurePolicy::Skip).unwrap();
        let report = aggregator.aggregate(&[good, missing.clone()]).unwrap();
        assert_eq!(report.files, 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].path, missing);
        assert_eq!(report.counts.total(), 2);
    }
}
