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

//! Engine capability interface.
//!
//! An engine turns a set of input files into a [`StatusCounts`]. Anything
//! that can do that (an embedded SQL engine, a dataframe library, a cluster
//! client) plugs into the harness by implementing [`Engine`]; the runner
//! only measures the call.

use crate::aggregate::{classify_file, discover_inputs, AggregateReport, SkippedInput, StatusAggregator};
use crate::config::HarnessConfig;
use logbench_core::{LogbenchError, RecordTally, Result, StatusCounts};
use std::path::{Path, PathBuf};

/// What an engine produced for one set of inputs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineOutput {
    /// Status code counts
    pub counts: StatusCounts,
    /// Record accounting, the denominator of the CSV rates
    pub tally: RecordTally,
    /// Inputs left out under the skip policy
    pub skipped: Vec<SkippedInput>,
}

impl EngineOutput {
    /// Display paths of the skipped inputs.
    pub fn skipped_paths(&self) -> Vec<String> {
        self.skipped
            .iter()
            .map(|s| s.path.display().to_string())
            .collect()
    }
}

impl From<AggregateReport> for EngineOutput {
    fn from(report: AggregateReport) -> Self {
        Self {
            counts: report.counts,
            tally: report.tally,
            skipped: report.skipped,
        }
    }
}

/// A status-code counting engine under benchmark.
pub trait Engine: Send + Sync {
    /// Short identifier used in logs and experiment names.
    fn name(&self) -> &str;

    /// Counts status codes over already discovered input files.
    fn run(&self, files: &[PathBuf]) -> Result<EngineOutput>;

    /// Counts status codes over every input under `source`.
    fn count(&self, source: &Path) -> Result<StatusCounts> {
        let files = discover_inputs(source)?;
        Ok(self.run(&files)?.counts)
    }
}

/// Reference engine: the parallel map/reduce aggregator.
#[derive(Debug)]
pub struct ParallelEngine {
    aggregator: StatusAggregator,
}

impl ParallelEngine {
    pub fn new(aggregator: StatusAggregator) -> Self {
        Self { aggregator }
    }

    pub fn from_config(config: &HarnessConfig) -> Result<Self> {
        Ok(Self::new(StatusAggregator::from_config(config)?))
    }

    pub fn aggregator(&self) -> &StatusAggregator {
        &self.aggregator
    }
}

impl Engine for ParallelEngine {
    fn name(&self) -> &str {
        "parallel"
    }

    fn run(&self, files: &[PathBuf]) -> Result<EngineOutput> {
        self.aggregator.aggregate(files).map(EngineOutput::from)
    }
}

/// Single-threaded baseline reading one file after another.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialEngine;

impl Engine for SerialEngine {
    fn name(&self) -> &str {
        "serial"
    }

    fn run(&self, files: &[PathBuf]) -> Result<EngineOutput> {
        let mut output = EngineOutput::default();
        for path in files {
            let partial = classify_file(path)
                .map_err(|e| LogbenchError::worker(path.display().to_string(), e))?;
            output.counts.merge(&partial.counts);
            output.tally += partial.tally;
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FailurePolicy;
    use std::fs;
    use tempfile::TempDir;

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        for (i, codes) in [[200, 404, 200], [500, 200, 301], [404, 404, 201]]
            .iter()
            .enumerate()
        {
            let body: String = codes
                .iter()
                .map(|c| {
                    format!(
                        "{{\"service\":\"orders\",\"timestamp\":{}.0,\"message\":\"HTTP Status Code: {}\"}}\n",
                        i, c
                    )
                })
                .collect();
            fs::write(dir.path().join(format!("part-{}.json", i)), body).unwrap();
        }
        dir
    }

    #[test]
    fn test_engines_agree() {
        let dir = fixture();
        let parallel =
            ParallelEngine::new(StatusAggregator::new(Some(3), FailurePolicy::Abort).unwrap());
        let serial = SerialEngine;

        let a = parallel.count(dir.path()).unwrap();
        let b = serial.count(dir.path()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.total(), 9);
        assert_eq!(
            a.to_literal(),
            "{'200': 3, '201': 1, '301': 1, '404': 3, '500': 1}"
        );
    }

    #[test]
    fn test_engines_are_object_safe() {
        let engines: Vec<Box<dyn Engine>> = vec![
            Box::new(SerialEngine),
            Box::new(ParallelEngine::from_config(&HarnessConfig::default().with_workers(1)).unwrap()),
        ];
        let names: Vec<&str> = engines.iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["serial", "parallel"]);
    }

    #[test]
    fn test_engines_report_records_processed() {
        let dir = fixture();
        fs::write(
            dir.path().join("part-3.json"),
            "{\"service\":\"orders\",\"timestamp\":3.0,\"message\":\"cache warmed\"}\n\n",
        )
        .unwrap();
        let files = discover_inputs(dir.path()).unwrap();
        let parallel =
            ParallelEngine::new(StatusAggregator::new(Some(2), FailurePolicy::Abort).unwrap());

        let a = parallel.run(&files).unwrap();
        let b = SerialEngine.run(&files).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.tally.records, 10);
        assert_eq!(a.tally.matched, 9);
        assert_eq!(a.tally.unmatched, 1);
        assert!(a.skipped.is_empty());
    }

    #[test]
    fn test_parallel_engine_keeps_skipped_inputs() {
        let dir = fixture();
        let mut files = discover_inputs(dir.path()).unwrap();
        files.push(dir.path().join("vanished.json"));
        let parallel =
            ParallelEngine::new(StatusAggregator::new(Some(2), FailurePolicy::Skip).unwrap());

        let output = parallel.run(&files).unwrap();
        assert_eq!(output.counts.total(), 9);
        assert_eq!(output.skipped.len(), 1);
        assert!(output.skipped_paths()[0].ends_with("vanished.json"));
    }

    #[test]
    fn test_missing_source_is_input_error() {
        let dir = TempDir::new().unwrap();
        let err = SerialEngine.count(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, LogbenchError::Input { .. }));
    }
}
