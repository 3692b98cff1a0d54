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

//! Per-file operations on a dedicated worker pool.
//!
//! Every file is one task handled by exactly one worker. Workers share
//! nothing; each returns its own output, and the
//! caller only sees the outputs once every task has finished (the `collect`
//! at the end of [`BatchProcessor::process`] is the barrier).
//!
//! # Examples
//!
//! ```rust,no_run
//! use logbench_core::{LogbenchError, Result};
//! use logbench_harness::batch::{BatchConfig, BatchProcessor, FileOperation};
//! use std::path::{Path, PathBuf};
//!
//! struct LineCount;
//!
//! impl FileOperation for LineCount {
//!     type Output = usize;
//!
//!     fn process_file(&self, path: &Path) -> Result<usize> {
//!         let text = std::fs::read_to_string(path)
//!             .map_err(|e| LogbenchError::io_error(path, e))?;
//!         Ok(text.lines().count())
//!     }
//!
//!     fn name(&self) -> &str {
//!         "line-count"
//!     }
//! }
//!
//! # fn main() -> Result<()> {
//! let processor = BatchProcessor::new(BatchConfig::default().with_max_threads(4))?;
//! let files = vec![PathBuf::from("a.jsonl"), PathBuf::from("b.jsonl")];
//! let results = processor.process(&files, &LineCount);
//! println!("{} of {} files read", results.success_count(), results.total_files());
//! # Ok(())
//! # }
//! ```

use logbench_core::{LogbenchError, Result};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::debug;

/// Configuration for a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchConfig {
    /// Worker pool size. `None` means the available parallelism.
    pub max_threads: Option<usize>,
}

impl BatchConfig {
    /// Sets the worker pool size.
    pub fn with_max_threads(mut self, threads: usize) -> Self {
        self.max_threads = Some(threads);
        self
    }
}

/// Outcome for one file.
#[derive(Debug, Clone)]
pub struct FileResult<T> {
    /// The file that was processed
    pub path: PathBuf,
    /// Output or the error the worker raised
    pub result: Result<T>,
}

impl<T> FileResult<T> {
    /// Check if the result is successful.
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// Check if the result is a failure.
    pub fn is_failure(&self) -> bool {
        self.result.is_err()
    }
}

/// All file outcomes of one batch run, in input order.
#[derive(Debug, Clone)]
pub struct BatchResults<T> {
    /// One entry per input file
    pub results: Vec<FileResult<T>>,
    /// Wall time of the whole batch
    pub elapsed: Duration,
}

impl<T> BatchResults<T> {
    /// Create batch results.
    pub fn new(results: Vec<FileResult<T>>, elapsed: Duration) -> Self {
        Self { results, elapsed }
    }

    /// Number of files processed.
    pub fn total_files(&self) -> usize {
        self.results.len()
    }

    /// Number of files that succeeded.
    pub fn success_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    /// Number of files that failed.
    pub fn failure_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_failure()).count()
    }

    /// True when no file failed.
    pub fn all_succeeded(&self) -> bool {
        self.results.iter().all(|r| r.is_success())
    }

    /// Iterator over failed results.
    pub fn failures(&self) -> impl Iterator<Item = &FileResult<T>> {
        self.results.iter().filter(|r| r.is_failure())
    }
}

/// An operation applied independently to each file of a batch.
///
/// Implementations must be `Send + Sync`; one instance is shared by every
/// worker and must not hold per-file state.
pub trait FileOperation: Send + Sync {
    /// Per-file output
    type Output: Send;

    /// Process one file.
    ///
    /// # Errors
    ///
    /// Any error is attached to the file's [`FileResult`]; other files are
    /// unaffected.
    fn process_file(&self, path: &Path) -> Result<Self::Output>;

    /// Operation name used in log output.
    fn name(&self) -> &str;
}

fn log_outcome<T>(path: &Path, result: &Result<T>) {
    match result {
        Ok(_) => debug!(file = %path.display(), "processed"),
        Err(e) => debug!(file = %path.display(), error = %e, "failed"),
    }
}

/// Runs a [`FileOperation`] over many files on its own rayon pool.
///
/// The pool is local to the processor, so two processors with different
/// worker counts can coexist in one process.
pub struct BatchProcessor {
    config: BatchConfig,
    pool: ThreadPool,
}

impl std::fmt::Debug for BatchProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchProcessor")
            .field("config", &self.config)
            .field("threads", &self.pool.current_num_threads())
            .finish()
    }
}

impl BatchProcessor {
    /// Builds the worker pool.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` when `max_threads` is zero or the pool cannot be built.
    pub fn new(config: BatchConfig) -> Result<Self> {
        let threads = match config.max_threads {
            Some(0) => {
                return Err(LogbenchError::invalid_config(
                    "max_threads",
                    "must be at least 1",
                ))
            }
            Some(n) => n,
            None => crate::config::available_workers(),
        };

        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("logbench-worker-{}", i))
            .build()
            .map_err(|e| LogbenchError::invalid_config("max_threads", e.to_string()))?;

        Ok(Self { config, pool })
    }

    /// Number of worker threads.
    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Processes every file and returns all outcomes.
    ///
    /// Never fails as a whole; per-file errors are in the results.
    pub fn process<O>(&self, files: &[PathBuf], operation: &O) -> BatchResults<O::Output>
    where
        O: FileOperation,
    {
        let start = Instant::now();

        let results: Vec<FileResult<O::Output>> = self.pool.install(|| {
            files
                .par_iter()
                .map(|path| {
                    let result = operation.process_file(path);
                    log_outcome(path, &result);
                    FileResult {
                        path: path.clone(),
                        result,
                    }
                })
                .collect()
        });

        let elapsed = start.elapsed();
        let results = BatchResults::new(results, elapsed);
        debug!(
            operation = operation.name(),
            files = files.len(),
            failed = results.failure_count(),
            elapsed_s = elapsed.as_secs_f64(),
            "batch finished"
        );
        results
    }

    /// Processes every file, stopping at the first failure.
    ///
    /// Outstanding tasks are not started once one has failed; the error is
    /// wrapped with the failing file's path.
    pub fn try_process<O>(&self, files: &[PathBuf], operation: &O) -> Result<Vec<O::Output>>
    where
        O: FileOperation,
    {
        self.pool.install(|| {
            files
                .par_iter()
                .map(|path| {
                    let result = operation.process_file(path);
                    log_outcome(path, &result);
                    result.map_err(|e| LogbenchError::worker(path.display().to_string(), e))
                })
                .collect::<Result<Vec<_>>>()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    struct ByteLen;

    impl FileOperation for ByteLen {
        type Output = u64;

        fn process_file(&self, path: &Path) -> Result<u64> {
            std::fs::metadata(path)
                .map(|m| m.len())
                .map_err(|e| LogbenchError::io_error(path, e))
        }

        fn name(&self) -> &str {
            "byte-len"
        }
    }

    fn write_files(dir: &TempDir, sizes: &[usize]) -> Vec<PathBuf> {
        sizes
            .iter()
            .enumerate()
            .map(|(i, &size)| {
                let path = dir.path().join(format!("f{}.jsonl", i));
                let mut file = std::fs::File::create(&path).unwrap();
                file.write_all(&vec![b'x'; size]).unwrap();
                path
            })
            .collect()
    }

    #[test]
    fn test_zero_threads_rejected() {
        let err = BatchProcessor::new(BatchConfig::default().with_max_threads(0)).unwrap_err();
        assert!(matches!(err, LogbenchError::InvalidConfig { .. }));
    }

    #[test]
    fn test_process_keeps_input_order() {
        let dir = TempDir::new().unwrap();
        let files = write_files(&dir, &[3, 1, 4, 1, 5]);
        let processor = BatchProcessor::new(BatchConfig::default().with_max_threads(3)).unwrap();
        assert_eq!(processor.threads(), 3);

        let results = processor.process(&files, &ByteLen);
        assert!(results.all_succeeded());
        let sizes: Vec<u64> = results
            .results
            .iter()
            .map(|r| *r.result.as_ref().unwrap())
            .collect();
        assert_eq!(sizes, vec![3, 1, 4, 1, 5]);
    }

    #[test]
    fn test_process_collects_failures() {
        let dir = TempDir::new().unwrap();
        let mut files = write_files(&dir, &[2, 2]);
        files.push(dir.path().join("missing.jsonl"));

        let processor = BatchProcessor::new(BatchConfig::default().with_max_threads(2)).unwrap();
        let results = processor.process(&files, &ByteLen);
        assert_eq!(results.total_files(), 3);
        assert_eq!(results.success_count(), 2);
        assert_eq!(results.failure_count(), 1);
        let failure = results.failures().next().unwrap();
        assert!(failure.path.ends_with("missing.jsonl"));
    }

    #[test]
    fn test_try_process_reports_failing_path() {
        let dir = TempDir::new().unwrap();
        let mut files = write_files(&dir, &[1]);
        files.push(dir.path().join("gone.jsonl"));

        let processor = BatchProcessor::new(BatchConfig::default().with_max_threads(2)).unwrap();
        let err = processor.try_process(&files, &ByteLen).unwrap_err();
        match err {
            LogbenchError::Worker { input, .. } => assert!(input.ends_with("gone.jsonl")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_default_pool_uses_available_parallelism() {
        let processor = BatchProcessor::new(BatchConfig::default()).unwrap();
        assert_eq!(processor.threads(), crate::config::available_workers());
    }

    #[test]
    fn test_empty_batch() {
        let processor = BatchProcessor::new(BatchConfig::default().with_max_threads(1)).unwrap();
        let results = processor.process(&[], &ByteLen);
        assert_eq!(results.total_files(), 0);
        assert!(results.all_succeeded());
        assert!(processor.try_process(&[], &ByteLen).unwrap().is_empty());
    }
}
