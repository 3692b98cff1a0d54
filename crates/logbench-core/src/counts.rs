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

//! Status-code count mapping.
//!
//! [`StatusCounts`] is used for per-worker partial results and for the merged
//! result alike. Merging is a key-wise sum, so it is commutative and
//! associative and the total of a merge always equals the sum of the totals
//! merged into it.

use crate::error::Result;
use crate::extract::StatusCode;
use serde::{Deserialize, Serialize};
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;

/// CSV header written by [`StatusCounts::write_csv`].
pub const CSV_HEADER: [&str; 3] = ["status_code", "count", "rate"];

/// Mapping from status code to occurrence count.
///
/// Keys iterate in ascending code order, which is the order used for every
/// rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusCounts {
    counts: BTreeMap<StatusCode, u64>,
}

impl StatusCounts {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one occurrence of `code`.
    #[inline]
    pub fn record(&mut self, code: StatusCode) {
        *self.counts.entry(code).or_insert(0) += 1;
    }

    /// Adds `count` occurrences of `code`. Adding zero leaves no key behind.
    pub fn add(&mut self, code: StatusCode, count: u64) {
        if count > 0 {
            *self.counts.entry(code).or_insert(0) += count;
        }
    }

    /// Occurrences of `code` (zero when absent).
    pub fn get(&self, code: StatusCode) -> u64 {
        self.counts.get(&code).copied().unwrap_or(0)
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Number of distinct codes.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// True when no code has been recorded.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Iterates `(code, count)` in ascending code order.
    pub fn iter(&self) -> impl Iterator<Item = (StatusCode, u64)> + '_ {
        self.counts.iter().map(|(code, count)| (*code, *count))
    }

    /// Adds every count of `other` into `self`.
    pub fn merge(&mut self, other: &StatusCounts) {
        for (code, count) in other.iter() {
            self.add(code, count);
        }
    }

    /// Merges any number of partial results into one.
    pub fn merged<'a, I>(partials: I) -> Self
    where
        I: IntoIterator<Item = &'a StatusCounts>,
    {
        let mut merged = Self::new();
        for partial in partials {
            merged.merge(partial);
        }
        merged
    }

    /// Share of `code` in the total, or 0.0 when nothing was counted.
    pub fn rate(&self, code: StatusCode) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            self.get(code) as f64 / total as f64
        }
    }

    /// Collapses codes into status buckets (2 → 2xx, 4 → 4xx, ...).
    pub fn by_bucket(&self) -> BTreeMap<u8, u64> {
        let mut buckets = BTreeMap::new();
        for (code, count) in self.iter() {
            *buckets.entry(code.bucket()).or_insert(0) += count;
        }
        buckets
    }

    /// Writes `status_code,count,rate` CSV, rate with six decimals.
    ///
    /// `records` is the number of records processed, matched or not, and is
    /// the denominator of every rate. Rates are 0 when `records` is 0.
    pub fn write_csv<W: Write>(&self, writer: W, records: u64) -> Result<()> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(CSV_HEADER)?;
        for (code, count) in self.iter() {
            let rate = if records == 0 {
                0.0
            } else {
                count as f64 / records as f64
            };
            csv.write_record([code.to_string(), count.to_string(), format!("{:.6}", rate)])?;
        }
        csv.flush()
            .map_err(|e| crate::error::LogbenchError::Csv(e.to_string()))?;
        Ok(())
    }

    /// Renders the CSV into a string.
    pub fn to_csv_string(&self, records: u64) -> Result<String> {
        let mut buf = Vec::new();
        self.write_csv(&mut buf, records)?;
        String::from_utf8(buf).map_err(|e| crate::error::LogbenchError::Csv(e.to_string()))
    }

    /// Renders the plain mapping literal, e.g. `{'200': 3, '404': 2}`.
    pub fn to_literal(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for StatusCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (code, count)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "'{}': {}", code, count)?;
        }
        f.write_str("}")
    }
}

impl FromIterator<StatusCode> for StatusCounts {
    fn from_iter<I: IntoIterator<Item = StatusCode>>(iter: I) -> Self {
        let mut counts = Self::new();
        counts.extend(iter);
        counts
    }
}

impl Extend<StatusCode> for StatusCounts {
    fn extend<I: IntoIterator<Item = StatusCode>>(&mut self, iter: I) {
        for code in iter {
            self.record(code);
        }
    }
}

impl FromIterator<(StatusCode, u64)> for StatusCounts {
    fn from_iter<I: IntoIterator<Item = (StatusCode, u64)>>(iter: I) -> Self {
        let mut counts = Self::new();
        for (code, count) in iter {
            counts.add(code, count);
        }
        counts
    }
}

impl IntoIterator for StatusCounts {
    type Item = (StatusCode, u64);
    type IntoIter = btree_map::IntoIter<StatusCode, u64>;

    fn into_iter(self) -> Self::IntoIter {
        self.counts.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(value: u16) -> StatusCode {
        StatusCode::new(value).unwrap()
    }

    fn counts(pairs: &[(u16, u64)]) -> StatusCounts {
        pairs.iter().map(|&(c, n)| (code(c), n)).collect()
    }

    #[test]
    fn test_record_and_total() {
        let mut c = StatusCounts::new();
        c.record(code(200));
        c.record(code(200));
        c.record(code(404));
        assert_eq!(c.get(code(200)), 2);
        assert_eq!(c.get(code(500)), 0);
        assert_eq!(c.total(), 3);
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn test_add_zero_leaves_no_key() {
        let mut c = StatusCounts::new();
        c.add(code(200), 0);
        assert!(c.is_empty());
    }

    #[test]
    fn test_merge_two_workers() {
        let a = counts(&[(200, 10)]);
        let b = counts(&[(200, 5), (500, 1)]);

        let ab = StatusCounts::merged([&a, &b]);
        let ba = StatusCounts::merged([&b, &a]);

        assert_eq!(ab, counts(&[(200, 15), (500, 1)]));
        assert_eq!(ab, ba);
        assert_eq!(ab.total(), a.total() + b.total());
    }

    #[test]
    fn test_literal_sorted() {
        let c = counts(&[(404, 2), (200, 3)]);
        assert_eq!(c.to_literal(), "{'200': 3, '404': 2}");
        assert_eq!(StatusCounts::new().to_literal(), "{}");
    }

    #[test]
    fn test_csv_rendering() {
        let c = counts(&[(200, 3), (404, 1)]);
        let csv = c.to_csv_string(4).unwrap();
        assert_eq!(
            csv,
            "status_code,count,rate\n200,3,0.750000\n404,1,0.250000\n"
        );
    }

    #[test]
    fn test_csv_rate_counts_unmatched_records() {
        // six records, one without a status code
        let c = counts(&[(200, 3), (404, 2)]);
        let csv = c.to_csv_string(6).unwrap();
        assert_eq!(
            csv,
            "status_code,count,rate\n200,3,0.500000\n404,2,0.333333\n"
        );
    }

    #[test]
    fn test_csv_empty() {
        let csv = StatusCounts::new().to_csv_string(0).unwrap();
        assert_eq!(csv, "status_code,count,rate\n");
        let csv = counts(&[(500, 1)]).to_csv_string(0).unwrap();
        assert_eq!(csv, "status_code,count,rate\n500,1,0.000000\n");
    }

    #[test]
    fn test_rate() {
        let c = counts(&[(200, 1), (500, 3)]);
        assert_eq!(c.rate(code(500)), 0.75);
        assert_eq!(StatusCounts::new().rate(code(200)), 0.0);
    }

    #[test]
    fn test_by_bucket() {
        let c = counts(&[(200, 5), (204, 1), (404, 2), (500, 1), (503, 1)]);
        let buckets = c.by_bucket();
        assert_eq!(buckets.get(&2), Some(&6));
        assert_eq!(buckets.get(&4), Some(&2));
        assert_eq!(buckets.get(&5), Some(&2));
        assert_eq!(buckets.get(&3), None);
    }

    #[test]
    fn test_json_mapping() {
        let c = counts(&[(200, 3), (404, 2)]);
        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(json, r#"{"200":3,"404":2}"#);
        let back: StatusCounts = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
    }
}
