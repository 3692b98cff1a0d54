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

//! Log record model and per-line classification.
//!
//! One line is one record. A line holding a JSON object contributes its
//! `message` field; any other line is taken as a plain-text message. Lines
//! that are not UTF-8, or JSON objects without a textual `message`, are
//! unparseable and excluded from counts.

use crate::extract::{extract, extract_from_value, StatusCode};
use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

/// One synthetic log event, serialized as one NDJSON line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    /// Emitting service name.
    pub service: String,
    /// Unix timestamp in fractional seconds.
    pub timestamp: f64,
    /// Free-text message.
    pub message: String,
}

/// Outcome of classifying one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// The message carries this status code.
    Matched(StatusCode),
    /// The message is text but carries no status code.
    Unmatched,
    /// The line is not text, or is a record without a textual message.
    Unparseable,
    /// Empty or whitespace-only line; not a record.
    Blank,
}

#[derive(Deserialize)]
struct MessageField {
    #[serde(default)]
    message: Option<serde_json::Value>,
}

/// Classifies one line (without its trailing newline).
pub fn classify_line(line: &[u8]) -> Classification {
    let Ok(text) = std::str::from_utf8(line) else {
        return Classification::Unparseable;
    };
    let text = text.trim();
    if text.is_empty() {
        return Classification::Blank;
    }

    if text.starts_with('{') {
        if let Ok(record) = serde_json::from_str::<MessageField>(text) {
            return match record.message {
                Some(value) if value.is_string() => match extract_from_value(&value) {
                    Some(code) => Classification::Matched(code),
                    None => Classification::Unmatched,
                },
                _ => Classification::Unparseable,
            };
        }
        // Broken JSON: fall through and treat the raw line as the message.
        return match extract(text) {
            Some(code) => Classification::Matched(code),
            None => Classification::Unparseable,
        };
    }

    match extract(text) {
        Some(code) => Classification::Matched(code),
        None => Classification::Unmatched,
    }
}

/// Record accounting for one file or one run.
///
/// `matched + unmatched + unparseable == records` and `matched` equals the
/// total of the counts built from the same lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordTally {
    /// Non-blank lines seen.
    pub records: u64,
    /// Records that yielded a status code.
    pub matched: u64,
    /// Text records without a status code.
    pub unmatched: u64,
    /// Records that could not be read as text.
    pub unparseable: u64,
}

impl RecordTally {
    /// Accounts for one classification.
    #[inline]
    pub fn observe(&mut self, classification: Classification) {
        match classification {
            Classification::Blank => return,
            Classification::Matched(_) => self.matched += 1,
            Classification::Unmatched => self.unmatched += 1,
            Classification::Unparseable => self.unparseable += 1,
        }
        self.records += 1;
    }

    /// Records excluded from counts.
    pub fn excluded(&self) -> u64 {
        self.unmatched + self.unparseable
    }
}

impl AddAssign for RecordTally {
    fn add_assign(&mut self, rhs: Self) {
        self.records += rhs.records;
        self.matched += rhs.matched;
        self.unmatched += rhs.unmatched;
        self.unparseable += rhs.unparseable;
    }
}
