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

//! History command - recorded trials of one experiment

use super::{write_stdout, OutputFormat};
use colored::Colorize;
use logbench_core::Result;
use logbench_harness::{describe_history, HarnessConfig, RunHistory, RunRecord, RunStatus};
use std::fmt::Write as _;
use std::path::PathBuf;

/// Prints every record of `experiment`, oldest first.
pub fn history(experiment: &str, results_dir: Option<PathBuf>, format: OutputFormat) -> Result<()> {
    let results_dir = match results_dir {
        Some(dir) => dir,
        None => HarnessConfig::from_env()?.results_dir,
    };
    let history = RunHistory::for_experiment(&results_dir, experiment)?;
    let records = history.load()?;

    let text = match format {
        OutputFormat::Json => {
            let mut text = serde_json::to_string_pretty(&records)?;
            text.push('\n');
            text
        }
        OutputFormat::Text => render(experiment, &records),
    };
    write_stdout(&text)
}

fn render(experiment: &str, records: &[RunRecord]) -> String {
    let mut out = String::new();
    if records.is_empty() {
        let _ = writeln!(out, "No runs recorded for '{}'", experiment);
        return out;
    }

    let _ = writeln!(
        out,
        "{} {} ({} runs)",
        "Experiment:".bright_blue().bold(),
        experiment.bright_white(),
        records.len()
    );
    for record in records {
        let status = match record.status {
            RunStatus::Ok => "ok".green().bold(),
            RunStatus::Failed => "failed".red().bold(),
        };
        let _ = write!(
            out,
            "  {:<6} {:>12.6}s  cpu {:>6.1}%  rss {:>9.1} MiB  read {:>12}  write {:>12}  samples {:>4}  {}",
            status,
            record.wall_time_s,
            record.resources.cpu_percent_avg,
            record.resources.rss_mb_max,
            record.resources.read_bytes,
            record.resources.write_bytes,
            record.resources.samples,
            record.dataset
        );
        if let Some(error) = &record.error {
            let _ = write!(out, "  ({})", error);
        }
        if !record.skipped.is_empty() {
            let _ = write!(out, "  [{} inputs skipped]", record.skipped.len());
        }
        out.push('\n');
    }

    for stats in describe_history(records) {
        let _ = writeln!(
            out,
            "{} {}: mean {:.6}s, median {:.6}s over {} successful runs",
            "Summary".bright_cyan(),
            stats.experiment,
            stats.mean,
            stats.median,
            stats.runs
        );
    }
    out
}
