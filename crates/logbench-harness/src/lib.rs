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

//! Logbench measurement harness.
//!
//! # Modules
//!
//! - `sampler`: background CPU / RSS / I/O sampler with scoped acquisition
//! - `batch`: per-file operations on a dedicated worker pool
//! - `aggregate`: parallel status-code classification and merge
//! - `engine`: the capability trait every engine adapter implements
//! - `runner`: one measured trial, persisted to the run history
//! - `history`: append-only run records per experiment
//! - `config`: harness configuration and environment overrides
//! - `logs` / `stats`: offline parsing of captured run logs
//!
//! # Example
//!
//! ```rust,no_run
//! use logbench_harness::{HarnessConfig, HarnessRunner, ParallelEngine};
//! use std::path::Path;
//!
//! # fn main() -> logbench_core::Result<()> {
//! let config = HarnessConfig::from_env()?;
//! let runner = HarnessRunner::new("reference", config.clone())?;
//! let engine = ParallelEngine::from_config(&config)?;
//!
//! let trial = runner.run_engine(&engine, Path::new("data/logs"))?;
//! print!("{}", trial.report());
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod batch;
pub mod config;
pub mod engine;
pub mod history;
pub mod logs;
pub mod runner;
pub mod sampler;
pub mod stats;

pub use aggregate::{
    classify_file, discover_inputs, merge_partials, AggregateReport, PartialResult,
    SkippedInput, StatusAggregator,
};
pub use batch::{BatchConfig, BatchProcessor, BatchResults, FileOperation, FileResult};
pub use config::{FailurePolicy, HarnessConfig};
pub use engine::{Engine, EngineOutput, ParallelEngine, SerialEngine};
pub use history::{ResourceReport, RunHistory, RunRecord, RunStatus};
pub use logs::{parse_log_text, parse_record_label, scan_logs, LogEntry};
pub use runner::{HarnessRunner, Trial};
pub use sampler::{
    ProbeError, ProcessProbe, ResourceSampler, ResourceSummary, Sample, SampleSeries,
    SamplerGuard, SamplerState, SysinfoProbe,
};
pub use stats::{describe, describe_history, ExperimentStats};
