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

//! Count command - one measured trial of an engine

use super::write_stdout;
use crate::cli::EngineKind;
use logbench_core::{ExecutionReport, Result};
use logbench_harness::{
    discover_inputs, Engine, FailurePolicy, HarnessConfig, HarnessRunner, ParallelEngine,
    SerialEngine,
};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::info;

/// Arguments of the count command, layered over the environment config.
#[derive(Debug, Clone)]
pub struct CountOptions {
    pub source: PathBuf,
    pub engine: EngineKind,
    pub experiment: Option<String>,
    pub workers: Option<usize>,
    pub results_dir: Option<PathBuf>,
    pub sample_interval_ms: Option<u64>,
    pub failure_policy: Option<FailurePolicy>,
    /// Write the CSV and append to the run history.
    pub record: bool,
}

impl CountOptions {
    fn harness_config(&self) -> Result<HarnessConfig> {
        let mut config = HarnessConfig::from_env()?;
        if let Some(dir) = &self.results_dir {
            config = config.with_results_dir(dir);
        }
        if let Some(workers) = self.workers {
            config = config.with_workers(workers);
        }
        if let Some(ms) = self.sample_interval_ms {
            config = config.with_sample_interval(Duration::from_millis(ms));
        }
        if let Some(policy) = self.failure_policy {
            config = config.with_failure_policy(policy);
        }
        config.validate()?;
        Ok(config)
    }
}

/// Runs the selected engine over `source` and prints the two-line report.
///
/// # Errors
///
/// `Input` (exit code 2) when the source is missing, not a directory or
/// empty; any other error exits with 1.
pub fn count(options: CountOptions) -> Result<()> {
    let config = options.harness_config()?;

    let engine: Box<dyn Engine> = match options.engine {
        EngineKind::Parallel => Box::new(ParallelEngine::from_config(&config)?),
        EngineKind::Serial => Box::new(SerialEngine),
    };
    let experiment = options
        .experiment
        .clone()
        .unwrap_or_else(|| engine.name().to_string());

    let report = if options.record {
        let runner = HarnessRunner::new(experiment, config)?;
        let trial = runner.run_engine(engine.as_ref(), &options.source)?;
        let csv = trial.write_counts(&runner)?;
        info!(
            csv = %csv.display(),
            records = trial.output.tally.records,
            history = %runner.history().path().display(),
            "results written"
        );
        trial.report()
    } else {
        let files = discover_inputs(&options.source)?;
        let start = Instant::now();
        let output = engine.run(&files)?;
        ExecutionReport::new(start.elapsed(), output.counts)
    };

    write_stdout(&report.to_string())
}
