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

//! Report command - execution time statistics over captured run logs

use super::{write_stdout, OutputFormat};
use colored::Colorize;
use logbench_core::Result;
use logbench_harness::{describe, scan_logs, ExperimentStats};
use std::fmt::Write as _;
use std::path::Path;

/// Parses every log below `root` and prints per-experiment statistics,
/// fastest mean first.
pub fn report(root: &Path, format: OutputFormat) -> Result<()> {
    let entries = scan_logs(root)?;
    let stats = describe(&entries);

    let text = match format {
        OutputFormat::Json => {
            let value = serde_json::json!({
                "logs": entries.len(),
                "entries": entries,
                "experiments": stats,
            });
            let mut text = serde_json::to_string_pretty(&value)?;
            text.push('\n');
            text
        }
        OutputFormat::Text => render_table(entries.len(), &stats),
    };

    write_stdout(&text)
}

fn render_table(logs: usize, stats: &[ExperimentStats]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} {} logs, {} experiments",
        "Run logs:".bright_blue().bold(),
        logs,
        stats.len()
    );
    if stats.is_empty() {
        return out;
    }

    let width = stats
        .iter()
        .map(|s| s.experiment.len())
        .max()
        .unwrap_or(0)
        .max("Experiment".len());

    let _ = writeln!(
        out,
        "{:<width$}  {:>5}  {:>12}  {:>12}  {:>14}  {:>8}",
        "Experiment",
        "Runs",
        "Mean (s)",
        "Median (s)",
        "Consistency",
        "%",
        width = width
    );
    for s in stats {
        let _ = writeln!(
            out,
            "{:<width$}  {:>5}  {:>12.6}  {:>12.6}  {:>14.6}  {:>7.2}%",
            s.experiment,
            s.runs,
            s.mean,
            s.median,
            s.consistency,
            s.consistency_pct,
            width = width
        );
    }
    out
}
