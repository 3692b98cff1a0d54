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

//! Harness configuration.
//!
//! Defaults can be overridden from the environment:
//!
//! | variable                      | field             |
//! |-------------------------------|-------------------|
//! | `LOGBENCH_RESULTS_DIR`        | `results_dir`     |
//! | `LOGBENCH_WORKERS`            | `workers`         |
//! | `LOGBENCH_SAMPLE_INTERVAL_MS` | `sample_interval` |
//! | `LOGBENCH_FAILURE_POLICY`     | `failure_policy`  |

use logbench_core::{LogbenchError, Result};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Default directory for CSV results and run history.
pub const DEFAULT_RESULTS_DIR: &str = "results";

/// Default resource sampling interval.
pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_millis(500);

/// What the aggregator does when one input file cannot be processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Fail the whole aggregation with the originating error.
    #[default]
    Abort,
    /// Count the file as zero, report it as skipped and carry on.
    Skip,
}

impl FromStr for FailurePolicy {
    type Err = LogbenchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(Self::Abort),
            "skip" => Ok(Self::Skip),
            other => Err(LogbenchError::invalid_config(
                "failure_policy",
                format!("expected 'abort' or 'skip', got '{}'", other),
            )),
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Abort => f.write_str("abort"),
            Self::Skip => f.write_str("skip"),
        }
    }
}

/// Configuration shared by the aggregator and the trial runner.
///
/// # Example
///
/// ```rust
/// use logbench_harness::{FailurePolicy, HarnessConfig};
/// use std::time::Duration;
///
/// let config = HarnessConfig::default()
///     .with_workers(4)
///     .with_sample_interval(Duration::from_millis(250))
///     .with_failure_policy(FailurePolicy::Skip);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct HarnessConfig {
    /// Directory receiving `{experiment}.csv` and `metrics_{experiment}.json`.
    pub results_dir: PathBuf,
    /// Resource sampling interval.
    pub sample_interval: Duration,
    /// Worker pool size; `None` uses the available parallelism.
    pub workers: Option<usize>,
    /// Per-file failure handling.
    pub failure_policy: FailurePolicy,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            results_dir: PathBuf::from(DEFAULT_RESULTS_DIR),
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
            workers: None,
            failure_policy: FailurePolicy::Abort,
        }
    }
}

impl HarnessConfig {
    /// Defaults overridden by `LOGBENCH_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(dir) = lookup("LOGBENCH_RESULTS_DIR") {
            config.results_dir = PathBuf::from(dir);
        }
        if let Some(raw) = lookup("LOGBENCH_WORKERS") {
            let workers = raw.trim().parse::<usize>().map_err(|_| {
                LogbenchError::invalid_config("workers", format!("'{}' is not a number", raw))
            })?;
            config.workers = Some(workers);
        }
        if let Some(raw) = lookup("LOGBENCH_SAMPLE_INTERVAL_MS") {
            let millis = raw.trim().parse::<u64>().map_err(|_| {
                LogbenchError::invalid_config(
                    "sample_interval",
                    format!("'{}' is not a number of milliseconds", raw),
                )
            })?;
            config.sample_interval = Duration::from_millis(millis);
        }
        if let Some(raw) = lookup("LOGBENCH_FAILURE_POLICY") {
            config.failure_policy = raw.parse()?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Sets the results directory.
    pub fn with_results_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.results_dir = dir.into();
        self
    }

    /// Sets the sampling interval.
    pub fn with_sample_interval(mut self, interval: Duration) -> Self {
        self.sample_interval = interval;
        self
    }

    /// Sets the worker pool size.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    /// Sets the failure policy.
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Worker count actually used.
    pub fn effective_workers(&self) -> usize {
        self.workers.unwrap_or_else(available_workers)
    }

    /// Rejects zero workers and a zero sampling interval.
    pub fn validate(&self) -> Result<()> {
        if self.workers == Some(0) {
            return Err(LogbenchError::invalid_config(
                "workers",
                "must be at least 1",
            ));
        }
        if self.sample_interval.is_zero() {
            return Err(LogbenchError::invalid_config(
                "sample_interval",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// Available parallelism, falling back to one worker.
pub fn available_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = HarnessConfig::default();
        assert_eq!(config.results_dir, PathBuf::from("results"));
        assert_eq!(config.sample_interval, Duration::from_millis(500));
        assert_eq!(config.workers, None);
        assert_eq!(config.failure_policy, FailurePolicy::Abort);
        assert!(config.effective_workers() >= 1);
    }

    #[test]
    fn test_env_overrides() {
        let config = HarnessConfig::from_lookup(lookup_from(&[
            ("LOGBENCH_RESULTS_DIR", "/tmp/out"),
            ("LOGBENCH_WORKERS", "3"),
            ("LOGBENCH_SAMPLE_INTERVAL_MS", "100"),
            ("LOGBENCH_FAILURE_POLICY", "Skip"),
        ]))
        .unwrap();

        assert_eq!(config.results_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.workers, Some(3));
        assert_eq!(config.effective_workers(), 3);
        assert_eq!(config.sample_interval, Duration::from_millis(100));
        assert_eq!(config.failure_policy, FailurePolicy::Skip);
    }

    #[test]
    fn test_env_invalid_values() {
        let err = HarnessConfig::from_lookup(lookup_from(&[("LOGBENCH_WORKERS", "many")]))
            .unwrap_err();
        assert!(matches!(err, LogbenchError::InvalidConfig { .. }));

        let err = HarnessConfig::from_lookup(lookup_from(&[("LOGBENCH_WORKERS", "0")]))
            .unwrap_err();
        assert!(err.to_string().contains("at least 1"));

        let err =
            HarnessConfig::from_lookup(lookup_from(&[("LOGBENCH_FAILURE_POLICY", "retry")]))
                .unwrap_err();
        assert!(err.to_string().contains("retry"));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let config = HarnessConfig::default().with_sample_interval(Duration::ZERO);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_policy_display_round_trip() {
        for policy in [FailurePolicy::Abort, FailurePolicy::Skip] {
            assert_eq!(policy.to_string().parse::<FailurePolicy>().unwrap(), policy);
        }
    }
}
