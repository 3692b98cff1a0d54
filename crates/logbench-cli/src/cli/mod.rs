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

//! CLI command definitions and argument parsing.
//!
//! ```text
//! Commands
//! ├── generate   synthetic NDJSON shards into a directory store
//! ├── count      one measured trial of an engine over a source directory
//! ├── report     statistics over captured run logs
//! └── history    records of one experiment
//! ```

use crate::commands::{self, CountOptions, GenerateOptions, OutputFormat};
use clap::{Subcommand, ValueEnum};
use logbench_core::Result;
use logbench_harness::FailurePolicy;
use std::path::PathBuf;

/// Engine selection for `count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EngineKind {
    /// Parallel map/reduce over a worker pool
    Parallel,
    /// Single-threaded streaming baseline
    Serial,
}

/// Worker failure handling for `count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OnError {
    /// Fail the run with the failing file's error
    Abort,
    /// Leave the file out and report it
    Skip,
}

impl From<OnError> for FailurePolicy {
    fn from(value: OnError) -> Self {
        match value {
            OnError::Abort => FailurePolicy::Abort,
            OnError::Skip => FailurePolicy::Skip,
        }
    }
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Generate synthetic log shards
    ///
    /// Writes `{prefix}/part-{timestamp}-{index}.json` objects below OUT in
    /// rounds of concurrent shards until the target size is reached.
    Generate {
        /// Output directory acting as the object store
        #[arg(short, long, value_name = "DIR")]
        out: PathBuf,

        /// Key prefix
        #[arg(long, default_value = logbench_gen::generator::DEFAULT_PREFIX)]
        prefix: String,

        /// Approximate total size in GiB
        #[arg(long, default_value_t = 10.0, conflicts_with = "target_bytes")]
        target_gb: f64,

        /// Exact total size in bytes (overrides --target-gb)
        #[arg(long)]
        target_bytes: Option<u64>,

        /// Shards per round
        #[arg(long, default_value_t = 64)]
        shards: usize,

        /// Minimum shard size in bytes
        #[arg(long, default_value_t = logbench_gen::DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,

        /// Maximum concurrent shard writers
        #[arg(long, default_value_t = logbench_gen::DEFAULT_MAX_WORKERS)]
        max_workers: usize,

        /// Seed for reproducible event content
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Count status codes over a directory of NDJSON files
    ///
    /// Prints exactly two lines to stdout: the execution time and the
    /// status-code mapping. Diagnostics go to stderr.
    Count {
        /// Directory holding *.json / *.jsonl / *.ndjson inputs
        #[arg(value_name = "SOURCE")]
        source: PathBuf,

        /// Engine to run
        #[arg(short, long, value_enum, default_value_t = EngineKind::Parallel)]
        engine: EngineKind,

        /// Experiment name for the CSV and run history (defaults to the engine name)
        #[arg(short = 'x', long)]
        experiment: Option<String>,

        /// Worker pool size
        #[arg(short, long)]
        workers: Option<usize>,

        /// Results directory
        #[arg(long, value_name = "DIR")]
        results_dir: Option<PathBuf>,

        /// Resource sampling interval in milliseconds
        #[arg(long, value_name = "MS")]
        sample_interval_ms: Option<u64>,

        /// What to do when one input file cannot be processed
        #[arg(long, value_enum)]
        on_error: Option<OnError>,

        /// Do not write the CSV or the run history
        #[arg(long)]
        no_record: bool,
    },

    /// Summarise captured run logs (root/<records>/<experiment>/<size>/*.log)
    Report {
        /// Root directory of the captured logs
        #[arg(value_name = "ROOT")]
        root: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Show the run history of an experiment
    History {
        /// Experiment name
        #[arg(value_name = "EXPERIMENT")]
        experiment: String,

        /// Results directory
        #[arg(long, value_name = "DIR")]
        results_dir: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

impl Commands {
    /// Executes the command.
    pub fn execute(self) -> Result<()> {
        match self {
            Commands::Generate {
                out,
                prefix,
                target_gb,
                target_bytes,
                shards,
                chunk_size,
                max_workers,
                seed,
            } => commands::generate(GenerateOptions {
                out,
                prefix,
                target_bytes: target_bytes.unwrap_or_else(|| gib_to_bytes(target_gb)),
                shards,
                chunk_size,
                max_workers,
                seed,
            }),
            Commands::Count {
                source,
                engine,
                experiment,
                workers,
                results_dir,
                sample_interval_ms,
                on_error,
                no_record,
            } => commands::count(CountOptions {
                source,
                engine,
                experiment,
                workers,
                results_dir,
                sample_interval_ms,
                failure_policy: on_error.map(FailurePolicy::from),
                record: !no_record,
            }),
            Commands::Report { root, format } => commands::report(&root, format),
            Commands::History {
                experiment,
                results_dir,
                format,
            } => commands::history(&experiment, results_dir, format),
        }
    }
}

fn gib_to_bytes(gib: f64) -> u64 {
    (gib.max(0.0) * 1024.0 * 1024.0 * 1024.0) as u64
}
