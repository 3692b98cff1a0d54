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

//! Standard output contract.
//!
//! Downstream log scrapers expect exactly two lines on stdout:
//!
//! ```text
//! Execution time: 1.234567 seconds
//! {'200': 3, '404': 2}
//! ```

use crate::counts::StatusCounts;
use std::fmt;
use std::time::Duration;

/// The two-line report printed by a successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionReport {
    /// Wall time of the measured workload.
    pub elapsed: Duration,
    /// Result mapping.
    pub counts: StatusCounts,
}

impl ExecutionReport {
    /// Creates a report.
    pub fn new(elapsed: Duration, counts: StatusCounts) -> Self {
        Self { elapsed, counts }
    }

    /// The `Execution time: ... seconds` line without newline.
    pub fn time_line(&self) -> String {
        format_execution_time(self.elapsed)
    }
}

/// Formats `Execution time: {seconds:.6} seconds`.
pub fn format_execution_time(elapsed: Duration) -> String {
    format!("Execution time: {:.6} seconds", elapsed.as_secs_f64())
}

impl fmt::Display for ExecutionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.time_line())?;
        writeln!(f, "{}", self.counts)
    }
}
