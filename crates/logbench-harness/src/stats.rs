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

//! Descriptive statistics over execution times.

use crate::history::RunRecord;
use crate::logs::LogEntry;
use serde::Serialize;
use std::collections::BTreeMap;

/// Arithmetic mean, `None` for no values.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Median, averaging the two middle values for an even count.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    Some(if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    })
}

/// Per-experiment execution time statistics.
///
/// `consistency` is `mean - median`: close to zero when runs are evenly
/// spread, positive when a few slow runs drag the mean up.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExperimentStats {
    pub experiment: String,
    pub runs: usize,
    pub mean: f64,
    pub median: f64,
    pub consistency: f64,
    /// `consistency` as a percentage of the mean; 0 when the mean is 0.
    pub consistency_pct: f64,
}

impl ExperimentStats {
    /// Statistics over `times`, `None` when empty.
    pub fn from_times(experiment: impl Into<String>, times: &[f64]) -> Option<Self> {
        let mean = mean(times)?;
        let median = median(times)?;
        let consistency = mean - median;
        let consistency_pct = if mean == 0.0 {
            0.0
        } else {
            consistency / mean * 100.0
        };
        Some(Self {
            experiment: experiment.into(),
            runs: times.len(),
            mean,
            median,
            consistency,
            consistency_pct,
        })
    }
}

fn sorted_by_mean(groups: BTreeMap<String, Vec<f64>>) -> Vec<ExperimentStats> {
    let mut stats: Vec<ExperimentStats> = groups
        .into_iter()
        .filter_map(|(experiment, times)| ExperimentStats::from_times(experiment, &times))
        .collect();
    stats.sort_by(|a, b| a.mean.total_cmp(&b.mean));
    stats
}

/// Groups log entries by experiment, sorted by ascending mean.
///
/// Entries without an experiment label or an execution time are ignored.
pub fn describe(entries: &[LogEntry]) -> Vec<ExperimentStats> {
    let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for entry in entries {
        if let (Some(experiment), Some(time)) = (&entry.experiment, entry.execution_time) {
            groups.entry(experiment.clone()).or_default().push(time);
        }
    }
    sorted_by_mean(groups)
}

/// Wall time statistics of the successful records in a run history,
/// grouped by dataset.
pub fn describe_history(records: &[RunRecord]) -> Vec<ExperimentStats> {
    let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for record in records.iter().filter(|r| r.is_ok()) {
        groups
            .entry(record.dataset.clone())
            .or_default()
            .push(record.wall_time_s);
    }
    sorted_by_mean(groups)
}
