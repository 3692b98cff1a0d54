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

//! Trial orchestration.
//!
//! A trial is one measured execution of a workload: the sampler runs for
//! exactly the duration of the workload, and the outcome (successful or
//! not) is appended to the experiment's run history. Rejected input is not
//! an outcome and is never recorded.

use crate::config::HarnessConfig;
use crate::aggregate::discover_inputs;
use crate::engine::{Engine, EngineOutput};
use crate::history::{counts_csv_path, RunHistory, RunRecord};
use crate::sampler::{ResourceSampler, ResourceSummary};
use logbench_core::{ExecutionReport, LogbenchError, Result, StatusCounts};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// A completed trial.
#[derive(Debug, Clone)]
pub struct Trial<T> {
    /// Workload output
    pub output: T,
    /// Workload wall time
    pub elapsed: Duration,
    /// Resource usage over the workload
    pub summary: ResourceSummary,
    /// The record appended to the history
    pub record: RunRecord,
}

impl Trial<EngineOutput> {
    /// The two-line stdout report.
    pub fn report(&self) -> ExecutionReport {
        ExecutionReport::new(self.elapsed, self.output.counts.clone())
    }

    /// Writes this trial's counts CSV through `runner`.
    pub fn write_counts(&self, runner: &HarnessRunner) -> Result<PathBuf> {
        runner.write_counts(&self.output.counts, self.output.tally.records)
    }
}

/// Runs measured trials for one experiment.
#[derive(Debug, Clone)]
pub struct HarnessRunner {
    experiment: String,
    config: HarnessConfig,
    history: RunHistory,
}

impl HarnessRunner {
    /// Runner persisting to `{results_dir}/metrics_{experiment}.json`.
    pub fn new(experiment: impl Into<String>, config: HarnessConfig) -> Result<Self> {
        let experiment = experiment.into();
        config.validate()?;
        let history = RunHistory::for_experiment(&config.results_dir, &experiment)?;
        Ok(Self {
            experiment,
            config,
            history,
        })
    }

    pub fn experiment(&self) -> &str {
        &self.experiment
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn history(&self) -> &RunHistory {
        &self.history
    }

    /// Runs `workload` under a resource sampler and records the outcome.
    ///
    /// The sampler is stopped on every path out of the workload. When the
    /// workload fails, a `failed` record is appended and the workload's
    /// error is returned unchanged. An `Input` error is returned without a
    /// record: nothing was measured against a usable source.
    pub fn run_trial<T, F>(&self, dataset: &str, workload: F) -> Result<Trial<T>>
    where
        F: FnOnce() -> Result<T>,
    {
        self.measure(dataset, workload, |_| Vec::new())
    }

    /// Runs `engine` over `source` as one trial.
    ///
    /// Inputs are discovered before the sampler starts, so a missing or
    /// empty source fails with `Input` and leaves the history untouched.
    pub fn run_engine<E>(&self, engine: &E, source: &Path) -> Result<Trial<EngineOutput>>
    where
        E: Engine + ?Sized,
    {
        let files = discover_inputs(source)?;
        let dataset = source.display().to_string();
        info!(engine = engine.name(), source = %dataset, files = files.len(), "starting trial");
        self.measure(&dataset, || engine.run(&files), EngineOutput::skipped_paths)
    }

    fn measure<T, F, S>(&self, dataset: &str, workload: F, skipped: S) -> Result<Trial<T>>
    where
        F: FnOnce() -> Result<T>,
        S: FnOnce(&T) -> Vec<String>,
    {
        let mut sampler = ResourceSampler::new(self.config.sample_interval)?;

        let guard = sampler.guard()?;
        let start = Instant::now();
        let outcome = workload();
        let elapsed = start.elapsed();
        let summary = guard.finish()?;

        let wall_time_s = elapsed.as_secs_f64();
        match outcome {
            Ok(output) => {
                let record = RunRecord::succeeded(dataset, wall_time_s, summary.report())
                    .with_skipped(skipped(&output));
                self.history.append(&record)?;
                info!(
                    experiment = %self.experiment,
                    dataset,
                    wall_time_s,
                    samples = summary.sample_count,
                    skipped = record.skipped.len(),
                    "trial recorded"
                );
                Ok(Trial {
                    output,
                    elapsed,
                    summary,
                    record,
                })
            }
            Err(error @ LogbenchError::Input { .. }) => {
                warn!(experiment = %self.experiment, dataset, error = %error, "trial rejected its input");
                Err(error)
            }
            Err(error) => {
                let record =
                    RunRecord::failed(dataset, wall_time_s, summary.report(), error.to_string());
                if let Err(history_error) = self.history.append(&record) {
                    warn!(error = %history_error, "failed trial could not be recorded");
                }
                warn!(experiment = %self.experiment, dataset, error = %error, "trial failed");
                Err(error)
            }
        }
    }

    /// Writes `counts` to `{results_dir}/{experiment}.csv`.
    ///
    /// `records` is the number of records processed, matched or not.
    pub fn write_counts(&self, counts: &StatusCounts, records: u64) -> Result<PathBuf> {
        let path = counts_csv_path(&self.config.results_dir, &self.experiment)?;
        fs::create_dir_all(&self.config.results_dir)
            .map_err(|e| LogbenchError::io_error(&self.config.results_dir, e))?;
        let file = File::create(&path).map_err(|e| LogbenchError::io_error(&path, e))?;
        counts.write_csv(BufWriter::new(file), records)?;
        Ok(path)
    }
}
