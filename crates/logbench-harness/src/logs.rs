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

//! Offline parsing of captured run logs.
//!
//! Captured stdout of earlier runs is kept as
//! `root/<records>/<experiment>/<size>/*.log`, e.g.
//! `results/10k/ex-polars/5/run1.log`. Each log holds the two-line report:
//! an `Execution time: X seconds` line and a result mapping, written either
//! as `{'200': 3}`, `{"200": 3}` or `[('200', 3)]`.

use logbench_core::{LogbenchError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Component, Path};
use tracing::debug;
use walkdir::WalkDir;

static TIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Execution time:\s*(\d+\.\d+) seconds").expect("valid execution time regex")
});

static PAIR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?:['"]([^'"]+)['"]|(\d+))\s*[:,]\s*(\d+)"#).expect("valid mapping pair regex")
});

/// One parsed `.log` file.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LogEntry {
    /// First directory below the root (record count label, e.g. `10k`)
    pub records_label: Option<String>,
    /// Second directory (experiment name)
    pub experiment: Option<String>,
    /// Third directory (dataset size label)
    pub size_label: Option<String>,
    /// File name of the log
    pub file: String,
    /// Parsed execution time in seconds
    pub execution_time: Option<f64>,
    /// Parsed result mapping
    pub counts: BTreeMap<String, u64>,
}

impl LogEntry {
    /// Record count from the records label.
    pub fn records(&self) -> Option<f64> {
        self.records_label.as_deref().and_then(parse_record_label)
    }

    /// Dataset size from the size label.
    pub fn size(&self) -> Option<f64> {
        self.size_label.as_deref().and_then(|s| s.trim().parse().ok())
    }
}

/// Parses a record count label: `"10k"` → 10000, `"2M"` → 2000000, `"500"` → 500.
pub fn parse_record_label(label: &str) -> Option<f64> {
    let label = label.trim();
    let (number, factor) = match label.char_indices().last()? {
        (i, 'k' | 'K') => (&label[..i], 1_000.0),
        (i, 'm' | 'M') => (&label[..i], 1_000_000.0),
        _ => (label, 1.0),
    };
    number.trim().parse::<f64>().ok().map(|n| n * factor)
}

/// Extracts the execution time and result mapping from log text.
pub fn parse_log_text(text: &str) -> (Option<f64>, BTreeMap<String, u64>) {
    let execution_time = TIME_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok());

    let counts = mapping_slice(text)
        .map(|slice| {
            PAIR_RE
                .captures_iter(slice)
                .filter_map(|c| {
                    let key = c.get(1).or_else(|| c.get(2))?.as_str().to_string();
                    let value = c.get(3)?.as_str().parse().ok()?;
                    Some((key, value))
                })
                .collect()
        })
        .unwrap_or_default();

    (execution_time, counts)
}

/// From the first `{` or `[` to the last matching closer.
fn mapping_slice(text: &str) -> Option<&str> {
    let start = text.find(&['{', '['][..])?;
    let closer = if text[start..].starts_with('{') { '}' } else { ']' };
    let end = text.rfind(closer)?;
    (end > start).then(|| &text[start..=end])
}

/// Parses every `*.log` below `root`, in path order.
///
/// # Errors
///
/// `Input` when `root` is not a directory, `Io` when a log cannot be read.
pub fn scan_logs(root: &Path) -> Result<Vec<LogEntry>> {
    if !root.is_dir() {
        return Err(LogbenchError::input(root, "log root is not a directory"));
    }

    let mut entries = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            LogbenchError::Io {
                path,
                message: e.to_string(),
            }
        })?;
        if !entry.file_type().is_file()
            || entry.path().extension().and_then(|e| e.to_str()) != Some("log")
        {
            continue;
        }

        let text = std::fs::read_to_string(entry.path())
            .map_err(|e| LogbenchError::io_error(entry.path(), e))?;
        let (execution_time, counts) = parse_log_text(&text);

        let labels: Vec<String> = entry
            .path()
            .strip_prefix(root)
            .ok()
            .and_then(Path::parent)
            .map(|rel| {
                rel.components()
                    .filter_map(|c| match c {
                        Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default();

        debug!(file = %entry.path().display(), ?execution_time, "log parsed");
        entries.push(LogEntry {
            records_label: labels.first().cloned(),
            experiment: labels.get(1).cloned(),
            size_label: labels.get(2).cloned(),
            file: entry.file_name().to_string_lossy().into_owned(),
            execution_time,
            counts,
        });
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_record_labels() {
        assert_eq!(parse_record_label("10k"), Some(10_000.0));
        assert_eq!(parse_record_label("5K"), Some(5_000.0));
        assert_eq!(parse_record_label("2M"), Some(2_000_000.0));
        assert_eq!(parse_record_label("750"), Some(750.0));
        assert_eq!(parse_record_label("k"), None);
        assert_eq!(parse_record_label(""), None);
        assert_eq!(parse_record_label("abc"), None);
    }

    #[test]
    fn test_parse_dict_literal() {
        let (time, counts) =
            parse_log_text("Execution time: 12.345678 seconds\n{'200': 3, '404': 2}\n");
        assert_eq!(time, Some(12.345678));
        assert_eq!(counts.get("200"), Some(&3));
        assert_eq!(counts.get("404"), Some(&2));
    }

    #[test]
    fn test_parse_json_and_tuple_list() {
        let (_, counts) = parse_log_text("{\"2\": 70, \"4\": 20, \"5\": 10}");
        assert_eq!(counts.len(), 3);
        assert_eq!(counts["5"], 10);

        let (_, counts) = parse_log_text("INFO starting\n[('200', 5), ('500', 1)]\ndone");
        assert_eq!(counts["200"], 5);
        assert_eq!(counts["500"], 1);

        let (_, counts) = parse_log_text("[(200, 5), (503, 2)]");
        assert_eq!(counts["503"], 2);
    }

    #[test]
    fn test_parse_without_report() {
        let (time, counts) = parse_log_text("Traceback: engine failed\n");
        assert_eq!(time, None);
        assert!(counts.is_empty());
    }

    #[test]
    fn test_scan_layout() {
        let dir = TempDir::new().unwrap();
        let run_dir = dir.path().join("10k").join("ex-polars").join("5");
        fs::create_dir_all(&run_dir).unwrap();
        fs::write(
            run_dir.join("run1.log"),
            "Execution time: 3.500000 seconds\n{'200': 9}\n",
        )
        .unwrap();
        fs::write(run_dir.join("notes.txt"), "ignored").unwrap();
        fs::write(dir.path().join("top.log"), "Execution time: 1.0 seconds\n").unwrap();

        let entries = scan_logs(dir.path()).unwrap();
        assert_eq!(entries.len(), 2);

        let nested = entries.iter().find(|e| e.file == "run1.log").unwrap();
        assert_eq!(nested.records_label.as_deref(), Some("10k"));
        assert_eq!(nested.experiment.as_deref(), Some("ex-polars"));
        assert_eq!(nested.size_label.as_deref(), Some("5"));
        assert_eq!(nested.records(), Some(10_000.0));
        assert_eq!(nested.size(), Some(5.0));
        assert_eq!(nested.execution_time, Some(3.5));
        assert_eq!(nested.counts["200"], 9);

        let top = entries.iter().find(|e| e.file == "top.log").unwrap();
        assert_eq!(top.experiment, None);
        assert_eq!(top.execution_time, Some(1.0));
    }

    #[test]
    fn test_scan_missing_root() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            scan_logs(&dir.path().join("absent")),
            Err(LogbenchError::Input { .. })
        ));
    }
}
