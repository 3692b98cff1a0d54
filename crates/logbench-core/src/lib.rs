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

//! Logbench core
//!
//! Shared building blocks for the log analytics benchmark harness:
//!
//! - **Extraction**: pull a 3-digit HTTP status code out of a free-text log message
//! - **Records**: classify one NDJSON (or plain text) log line
//! - **Counts**: the status-code → count mapping produced by every engine,
//!   with CSV and mapping-literal rendering
//! - **Output**: the two-line stdout contract consumed by downstream tooling
//!
//! # Example
//!
//! ```rust
//! use logbench_core::{classify_line, Classification, StatusCounts};
//!
//! let mut counts = StatusCounts::new();
//! for line in [
//!     r#"{"service":"auth","timestamp":1.0,"message":"HTTP Status Code: 200"}"#,
//!     "not a log line",
//! ] {
//!     if let Classification::Matched(code) = classify_line(line.as_bytes()) {
//!         counts.record(code);
//!     }
//! }
//! assert_eq!(counts.to_literal(), "{'200': 1}");
//! ```

pub mod counts;
pub mod error;
pub mod extract;
pub mod output;
pub mod record;

pub use counts::StatusCounts;
pub use error::{LogbenchError, Result};
pub use extract::{extract, extract_from_value, StatusCode, STATUS_PATTERN};
pub use output::ExecutionReport;
pub use record::{classify_line, Classification, LogEvent, RecordTally};
