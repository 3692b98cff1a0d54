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

//! HTTP status code extraction from free-text log messages.
//!
//! A message carries a status code when it contains the phrase
//! `HTTP Status Code:` followed by three digits. `HTTP`, `Status` and
//! `Code:` are separated by at least one whitespace character; the
//! whitespace before the digits may be empty. The match is case-sensitive.
//! Absence is an expected outcome, not an error.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Pattern applied to every message. Digits are ASCII only.
pub const STATUS_PATTERN: &str = r"HTTP\s+Status\s+Code:\s*([0-9]{3})";

static STATUS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(STATUS_PATTERN).expect("status pattern is a valid regex"));

/// A three-digit HTTP status code.
///
/// Ordered numerically, which is also the lexicographic order of the rendered
/// three-digit form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StatusCode(u16);

impl StatusCode {
    /// Creates a status code from its numeric value (`0..=999`).
    pub fn new(value: u16) -> Option<Self> {
        (value <= 999).then_some(Self(value))
    }

    /// Numeric value.
    pub fn as_u16(self) -> u16 {
        self.0
    }

    /// Status bucket: the leading digit (2 for 2xx, 4 for 4xx, ...).
    pub fn bucket(self) -> u8 {
        (self.0 / 100) as u8
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03}", self.0)
    }
}

/// Error returned when a string is not exactly three ASCII digits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStatusCodeError(String);

impl fmt::Display for ParseStatusCodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not a three-digit status code", self.0)
    }
}

impl std::error::Error for ParseStatusCodeError {}

impl FromStr for StatusCode {
    type Err = ParseStatusCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 3 || !bytes.iter().all(u8::is_ascii_digit) {
            return Err(ParseStatusCodeError(s.to_string()));
        }
        let value = bytes
            .iter()
            .fold(0u16, |acc, b| acc * 10 + u16::from(b - b'0'));
        Ok(Self(value))
    }
}

impl Serialize for StatusCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for StatusCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Extracts the status code embedded in `message`, if any.
///
/// # Examples
///
/// ```rust
/// use logbench_core::extract;
///
/// assert_eq!(extract("HTTP Status Code: 404").unwrap().to_string(), "404");
/// assert_eq!(extract("HTTP  Status\tCode:503").unwrap().to_string(), "503");
/// assert!(extract("http status code: 200").is_none());
/// assert!(extract("").is_none());
/// ```
pub fn extract(message: &str) -> Option<StatusCode> {
    let digits = STATUS_RE.captures(message)?.get(1)?;
    digits.as_str().parse().ok()
}

/// Extracts a status code from a JSON value.
///
/// Only string values are text; anything else yields `None`.
pub fn extract_from_value(value: &serde_json::Value) -> Option<StatusCode> {
    value.as_str().and_then(extract)
}
