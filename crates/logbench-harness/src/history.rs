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

//! Append-only run history.
//!
//! Each experiment keeps one JSON array of [`RunRecord`]s at
//! `{results_dir}/metrics_{experiment}.json`. Appending rewrites the whole
//! file through a temporary file in the same directory followed by a rename,
//! so readers see either the old array or the new one.

use logbench_core::{LogbenchError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Resource figures persisted with each run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceReport {
    pub cpu_percent_avg: f64,
    pub rss_mb_max: f64,
    pub read_bytes: u64,
    pub write_bytes: u64,
    pub samples: u64,
}

/// Outcome of a trial.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    #[default]
    Ok,
    Failed,
}

/// One persisted trial.
///
/// Serialized flat: `dataset, wall_time_s, cpu_percent_avg, rss_mb_max,
/// read_bytes, write_bytes, samples, timestamp, status`, `error` when the
/// trial failed and `skipped` when inputs were left out of the counts.
/// Records written before `status` existed load as `ok`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    /// Dataset label, usually the input location.
    pub dataset: String,
    /// Workload wall time in seconds.
    pub wall_time_s: f64,
    #[serde(flatten)]
    pub resources: ResourceReport,
    /// Unix time in fractional seconds at record creation.
    pub timestamp: f64,
    #[serde(default)]
    pub status: RunStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Inputs dropped under the skip policy.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<String>,
}

impl RunRecord {
    /// Record for a successful trial, stamped now.
    pub fn succeeded(dataset: impl Into<String>, wall_time_s: f64, resources: ResourceReport) -> Self {
        Self {
            dataset: dataset.into(),
            wall_time_s,
            resources,
            timestamp: unix_now(),
            status: RunStatus::Ok,
            error: None,
            skipped: Vec::new(),
        }
    }

    /// Attaches the inputs left out of this trial's counts.
    pub fn with_skipped(mut self, skipped: Vec<String>) -> Self {
        self.skipped = skipped;
        self
    }

    /// Record for a failed trial, stamped now.
    pub fn failed(
        dataset: impl Into<String>,
        wall_time_s: f64,
        resources: ResourceReport,
        error: impl Into<String>,
    ) -> Self {
        Self {
            status: RunStatus::Failed,
            error: Some(error.into()),
            ..Self::succeeded(dataset, wall_time_s, resources)
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == RunStatus::Ok
    }
}

fn unix_now() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// Checks that an experiment name is usable as a file name component.
pub fn validate_experiment_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name != "."
        && name != ".."
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(LogbenchError::invalid_config(
            "experiment",
            format!(
                "'{}' must be non-empty and use only letters, digits, '-', '_' or '.'",
                name
            ),
        ))
    }
}

/// Run history of one experiment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunHistory {
    path: PathBuf,
}

impl RunHistory {
    /// History at an explicit path.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `{results_dir}/metrics_{experiment}.json`.
    pub fn for_experiment(results_dir: &Path, experiment: &str) -> Result<Self> {
        validate_experiment_name(experiment)?;
        Ok(Self::at(
            results_dir.join(format!("metrics_{}.json", experiment)),
        ))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All records, oldest first. A missing file is an empty history.
    ///
    /// # Errors
    ///
    /// `History` when the file exists but is not a record array (a single
    /// record object is accepted).
    pub fn load(&self) -> Result<Vec<RunRecord>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(LogbenchError::history(&self.path, e.to_string())),
        };
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Stored {
            Many(Vec<RunRecord>),
            One(Box<RunRecord>),
        }

        match serde_json::from_str::<Stored>(&text) {
            Ok(Stored::Many(records)) => Ok(records),
            Ok(Stored::One(record)) => Ok(vec![*record]),
            Err(e) => Err(LogbenchError::history(
                &self.path,
                format!("not a run record array: {}", e),
            )),
        }
    }

    /// Appends one record, keeping every earlier one.
    pub fn append(&self, record: &RunRecord) -> Result<()> {
        let mut records = self.load()?;
        records.push(record.clone());
        self.write_all(&records)?;
        debug!(
            path = %self.path.display(),
            records = records.len(),
            "run history updated"
        );
        Ok(())
    }

    fn write_all(&self, records: &[RunRecord]) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(|e| LogbenchError::history(dir, e.to_string()))?;

        let mut tmp =
            NamedTempFile::new_in(dir).map_err(|e| LogbenchError::history(dir, e.to_string()))?;
        serde_json::to_writer_pretty(&mut tmp, records)
            .map_err(|e| LogbenchError::history(&self.path, e.to_string()))?;
        tmp.write_all(b"\n")
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| LogbenchError::history(&self.path, e.to_string()))?;
        tmp.persist(&self.path)
            .map_err(|e| LogbenchError::history(&self.path, e.error.to_string()))?;
        Ok(())
    }
}

/// `{results_dir}/{experiment}.csv`.
pub fn counts_csv_path(results_dir: &Path, experiment: &str) -> Result<PathBuf> {
    validate_experiment_name(experiment)?;
    Ok(results_dir.join(format!("{}.csv", experiment)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn resources() -> ResourceReport {
        ResourceReport {
            cpu_percent_avg: 42.5,
            rss_mb_max: 128.0,
            read_bytes: 4096,
            write_bytes: 512,
            samples: 7,
        }
    }

    #[test]
    fn test_flat_serialization() {
        let record = RunRecord::succeeded("data/logs", 1.25, resources());
        let value = serde_json::to_value(&record).unwrap();
        let obj = value.as_object().unwrap();
        for key in [
            "dataset",
            "wall_time_s",
            "cpu_percent_avg",
            "rss_mb_max",
            "read_bytes",
            "write_bytes",
            "samples",
            "timestamp",
            "status",
        ] {
            assert!(obj.contains_key(key), "missing {}", key);
        }
        assert!(!obj.contains_key("error"));
        assert!(!obj.contains_key("skipped"));
        assert_eq!(obj["status"], "ok");
        assert!(record.timestamp > 1_600_000_000.0);
    }

    #[test]
    fn test_legacy_record_defaults_to_ok() {
        let json = r#"{"dataset":"d","wall_time_s":1.0,"cpu_percent_avg":0.0,
            "rss_mb_max":0.0,"read_bytes":0,"write_bytes":0,"samples":0,"timestamp":1.0}"#;
        let record: RunRecord = serde_json::from_str(json).unwrap();
        assert!(record.is_ok());
        assert_eq!(record.error, None);
    }

    #[test]
    fn test_skipped_inputs_round_trip_through_history() {
        let dir = TempDir::new().unwrap();
        let history = RunHistory::at(dir.path().join("metrics_x.json"));
        let record = RunRecord::succeeded("d", 1.0, resources())
            .with_skipped(vec!["d/part-3.json".to_string()]);
        history.append(&record).unwrap();

        let text = fs::read_to_string(history.path()).unwrap();
        assert!(text.contains("\"skipped\""));
        assert_eq!(history.load().unwrap()[0].skipped, vec!["d/part-3.json"]);
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let history = RunHistory::for_experiment(dir.path(), "reference").unwrap();
        assert!(history.path().ends_with("metrics_reference.json"));
        assert!(history.load().unwrap().is_empty());
    }

    #[test]
    fn test_append_keeps_earlier_records() {
        let dir = TempDir::new().unwrap();
        let history = RunHistory::for_experiment(&dir.path().join("results"), "duckdb").unwrap();

        history
            .append(&RunRecord::succeeded("a", 1.0, resources()))
            .unwrap();
        history
            .append(&RunRecord::failed("b", 0.5, ResourceReport::default(), "boom"))
            .unwrap();

        let records = history.load().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].dataset, "a");
        assert!(records[0].is_ok());
        assert_eq!(records[1].status, RunStatus::Failed);
        assert_eq!(records[1].error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_single_object_file_is_accepted() {
        let dir = TempDir::new().unwrap();
        let history = RunHistory::at(dir.path().join("metrics_x.json"));
        let record = RunRecord::succeeded("one", 2.0, resources());
        fs::write(history.path(), serde_json::to_string(&record).unwrap()).unwrap();

        history
            .append(&RunRecord::succeeded("two", 3.0, resources()))
            .unwrap();
        let records = history.load().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].dataset, "one");
    }

    #[test]
    fn test_corrupt_file_is_not_overwritten() {
        let dir = TempDir::new().unwrap();
        let history = RunHistory::at(dir.path().join("metrics_x.json"));
        fs::write(history.path(), "{ not json").unwrap();

        let err = history
            .append(&RunRecord::succeeded("a", 1.0, resources()))
            .unwrap_err();
        assert!(matches!(err, LogbenchError::History { .. }));
        assert_eq!(fs::read_to_string(history.path()).unwrap(), "{ not json");
    }

    #[test]
    fn test_experiment_name_validation() {
        let dir = Path::new("results");
        assert!(RunHistory::for_experiment(dir, "spark-3.5_local").is_ok());
        assert!(RunHistory::for_experiment(dir, "").is_err());
        assert!(RunHistory::for_experiment(dir, "../escape").is_err());
        assert!(RunHistory::for_experiment(dir, "a/b").is_err());
        assert_eq!(
            counts_csv_path(dir, "polars").unwrap(),
            PathBuf::from("results/polars.csv")
        );
    }
}
