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

//! Byte-budgeted shard generation.
//!
//! Shards are produced in rounds of concurrent tasks. Each task fills a
//! buffer with NDJSON events until it reaches the chunk size, uploads it as
//! one object and adds its size to a shared [`ByteBudget`]. The run ends at
//! the first round boundary where the budget is exhausted; tasks that start
//! after that point do nothing.

use crate::store::ObjectStore;
use logbench_core::{LogEvent, LogbenchError, Result};
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace};

/// Emitting services, picked uniformly.
pub const SERVICES: [&str; 7] = [
    "auth",
    "payments",
    "orders",
    "monitoring",
    "search",
    "catalog",
    "shipping",
];

/// Status codes written into messages.
pub const STATUS_CODES: [u16; 14] = [
    200, 201, 204, 301, 400, 401, 403, 404, 409, 429, 500, 502, 503, 504,
];

/// Relative frequency of each entry of [`STATUS_CODES`].
pub const STATUS_WEIGHTS: [f64; 14] = [
    0.6, 0.05, 0.05, 0.02, 0.05, 0.02, 0.01, 0.06, 0.01, 0.02, 0.07, 0.02, 0.015, 0.005,
];

/// Default shard size: 5 MiB.
pub const DEFAULT_CHUNK_SIZE: usize = 5 * 1024 * 1024;

/// Upper bound on concurrent shard tasks.
pub const DEFAULT_MAX_WORKERS: usize = 32;

/// Default key prefix.
pub const DEFAULT_PREFIX: &str = "logs";

/// Generator settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Key prefix, without trailing slash.
    pub prefix: String,
    /// Minimum bytes per shard; a shard stops at the first line crossing it.
    pub chunk_size: usize,
    /// Cap on the per-round worker pool.
    pub max_workers: usize,
    /// Fixed seed for reproducible event content.
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_workers: DEFAULT_MAX_WORKERS,
            seed: None,
        }
    }
}

impl GeneratorConfig {
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(LogbenchError::invalid_config("chunk_size", "must be at least 1 byte"));
        }
        if self.max_workers == 0 {
            return Err(LogbenchError::invalid_config("max_workers", "must be at least 1"));
        }
        if self.prefix.trim_matches('/').is_empty() {
            return Err(LogbenchError::invalid_config("prefix", "must not be empty"));
        }
        Ok(())
    }

    /// Object key of one shard.
    pub fn key_for(&self, unix_ts: i64, index: u64) -> String {
        format!(
            "{}/part-{}-{:05}.json",
            self.prefix.trim_end_matches('/'),
            unix_ts,
            index
        )
    }

    /// Shard index of a key produced by [`key_for`](Self::key_for).
    pub fn shard_index(&self, key: &str) -> Option<u64> {
        let name = key
            .strip_prefix(self.prefix.trim_end_matches('/'))?
            .strip_prefix('/')?
            .strip_prefix("part-")?
            .strip_suffix(".json")?;
        let (_, index) = name.rsplit_once('-')?;
        index.parse().ok()
    }
}

/// One unit of generation work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShardTask {
    /// Run-global shard index, unique across rounds.
    pub index: u64,
    /// Bytes to reach before the shard is closed.
    pub target_byte_size: usize,
}

/// Shared, monotonically increasing byte counter.
#[derive(Debug)]
pub struct ByteBudget {
    target: u64,
    written: AtomicU64,
}

impl ByteBudget {
    pub fn new(target: u64) -> Self {
        Self {
            target,
            written: AtomicU64::new(0),
        }
    }

    /// Adds `bytes` and returns the total including them.
    pub fn record(&self, bytes: u64) -> u64 {
        self.written.fetch_add(bytes, Ordering::AcqRel) + bytes
    }

    pub fn written(&self) -> u64 {
        self.written.load(Ordering::Acquire)
    }

    pub fn target(&self) -> u64 {
        self.target
    }

    pub fn is_exhausted(&self) -> bool {
        self.written() >= self.target
    }
}

/// Outcome of a generation run.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationReport {
    /// Bytes uploaded, at least the requested total.
    pub bytes_written: u64,
    /// Shards uploaded.
    pub shards_written: u64,
    /// Rounds started.
    pub rounds: u64,
    /// Keys of the uploaded shards, in shard index order.
    pub keys: Vec<String>,
    /// Wall time of the run.
    pub elapsed: Duration,
}

/// Writes synthetic NDJSON shards to an [`ObjectStore`].
pub struct ShardGenerator {
    store: Arc<dyn ObjectStore>,
    config: GeneratorConfig,
    statuses: WeightedIndex<f64>,
}

impl std::fmt::Debug for ShardGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShardGenerator")
            .field("store", &self.store.describe())
            .field("config", &self.config)
            .finish()
    }
}

impl ShardGenerator {
    pub fn new(store: Arc<dyn ObjectStore>, config: GeneratorConfig) -> Result<Self> {
        config.validate()?;
        let statuses = WeightedIndex::new(STATUS_WEIGHTS)
            .map_err(|e| LogbenchError::invalid_config("status_weights", e.to_string()))?;
        Ok(Self {
            store,
            config,
            statuses,
        })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generates at least `total_bytes` in rounds of `shards_per_round`
    /// concurrent shards.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` for zero shards per round; otherwise the first
    /// failing shard's error, wrapped as `Worker` with its key. Shards
    /// uploaded before the failure stay in the store.
    pub fn generate(&self, total_bytes: u64, shards_per_round: usize) -> Result<GenerationReport> {
        if shards_per_round == 0 {
            return Err(LogbenchError::invalid_config(
                "shards_per_round",
                "must be at least 1",
            ));
        }

        let workers = self.config.max_workers.min(shards_per_round);
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("logbench-gen-{}", i))
            .build()
            .map_err(|e| LogbenchError::invalid_config("max_workers", e.to_string()))?;

        let start = Instant::now();
        let budget = ByteBudget::new(total_bytes);
        let mut next_index = self.first_free_index()?;
        let mut rounds = 0u64;
        let mut keys = Vec::new();

        info!(
            store = %self.store.describe(),
            total_bytes,
            shards_per_round,
            workers,
            first_index = next_index,
            "generation started"
        );

        while !budget.is_exhausted() {
            let tasks: Vec<ShardTask> = (next_index..next_index + shards_per_round as u64)
                .map(|index| ShardTask {
                    index,
                    target_byte_size: self.config.chunk_size,
                })
                .collect();
            next_index += shards_per_round as u64;
            rounds += 1;

            let written: Vec<Option<String>> = pool.install(|| {
                tasks
                    .par_iter()
                    .map(|task| self.run_task(task, &budget))
                    .collect::<Result<Vec<_>>>()
            })?;
            keys.extend(written.into_iter().flatten());

            debug!(round = rounds, bytes_written = budget.written(), "round finished");
        }

        let report = GenerationReport {
            bytes_written: budget.written(),
            shards_written: keys.len() as u64,
            rounds,
            keys,
            elapsed: start.elapsed(),
        };
        info!(
            bytes_written = report.bytes_written,
            shards = report.shards_written,
            rounds = report.rounds,
            elapsed_s = report.elapsed.as_secs_f64(),
            "generation finished"
        );
        Ok(report)
    }

    /// One past the highest shard index already under the prefix, so runs
    /// that start within the same second never reuse a key.
    fn first_free_index(&self) -> Result<u64> {
        let prefix = format!("{}/", self.config.prefix.trim_end_matches('/'));
        Ok(self
            .store
            .list(&prefix)?
            .iter()
            .filter_map(|key| self.config.shard_index(key))
            .max()
            .map_or(0, |index| index + 1))
    }

    fn run_task(&self, task: &ShardTask, budget: &ByteBudget) -> Result<Option<String>> {
        if budget.is_exhausted() {
            trace!(shard = task.index, "budget exhausted, shard skipped");
            return Ok(None);
        }

        let now = chrono::Utc::now();
        let ts = now.timestamp_micros() as f64 / 1_000_000.0;
        let key = self.config.key_for(now.timestamp(), task.index);

        let body = self
            .build_shard(task, ts)
            .map_err(|e| LogbenchError::worker(key.as_str(), e))?;
        self.store
            .put(&key, &body)
            .map_err(|e| LogbenchError::worker(key.as_str(), e))?;

        let total = budget.record(body.len() as u64);
        debug!(key = %key, bytes = body.len(), total, "shard uploaded");
        Ok(Some(key))
    }

    /// Fills one shard buffer. Every line is a compact JSON [`LogEvent`].
    pub fn build_shard(&self, task: &ShardTask, base_ts: f64) -> Result<Vec<u8>> {
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(task.index)),
            None => StdRng::from_entropy(),
        };

        let mut buf = Vec::with_capacity(task.target_byte_size + 128);
        while buf.len() < task.target_byte_size {
            let event = LogEvent {
                service: SERVICES[rng.gen_range(0..SERVICES.len())].to_string(),
                timestamp: base_ts + rng.gen::<f64>(),
                message: format!(
                    "HTTP Status Code: {}",
                    STATUS_CODES[self.statuses.sample(&mut rng)]
                ),
            };
            serde_json::to_writer(&mut buf, &event)?;
            buf.push(b'\n');
        }
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use logbench_core::{classify_line, Classification};

    fn generator(chunk: usize) -> (Arc<MemoryStore>, ShardGenerator) {
        let store = Arc::new(MemoryStore::new());
        let config = GeneratorConfig::default()
            .with_chunk_size(chunk)
            .with_seed(7);
        let generator = ShardGenerator::new(store.clone(), config).unwrap();
        (store, generator)
    }

    #[test]
    fn test_weights_cover_codes() {
        assert_eq!(STATUS_CODES.len(), STATUS_WEIGHTS.len());
        let sum: f64 = STATUS_WEIGHTS.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_config_validation() {
        assert!(GeneratorConfig::default().validate().is_ok());
        assert!(GeneratorConfig::default().with_chunk_size(0).validate().is_err());
        assert!(GeneratorConfig::default().with_max_workers(0).validate().is_err());
        assert!(GeneratorConfig::default().with_prefix("/").validate().is_err());
    }

    #[test]
    fn test_key_format() {
        let config = GeneratorConfig::default().with_prefix("raw/");
        assert_eq!(config.key_for(1_700_000_000, 7), "raw/part-1700000000-00007.json");
        assert_eq!(
            GeneratorConfig::default().key_for(1, 123_456),
            "logs/part-1-123456.json"
        );
    }

    #[test]
    fn test_shard_index_parsing() {
        let config = GeneratorConfig::default().with_prefix("raw/");
        assert_eq!(config.shard_index(&config.key_for(1_700_000_000, 42)), Some(42));
        assert_eq!(config.shard_index("raw/part-1-123456.json"), Some(123_456));
        assert_eq!(config.shard_index("raw/notes.txt"), None);
        assert_eq!(config.shard_index("logs/part-1-00001.json"), None);
        assert_eq!(config.shard_index("raw/nested/part-1-00001.json"), None);
    }

    #[test]
    fn test_budget_post_increment() {
        let budget = ByteBudget::new(10);
        assert!(!budget.is_exhausted());
        assert_eq!(budget.record(4), 4);
        assert_eq!(budget.record(6), 10);
        assert!(budget.is_exhausted());
        assert_eq!(budget.target(), 10);
    }

    #[test]
    fn test_shard_lines_are_valid_events() {
        let (_, generator) = generator(4096);
        let task = ShardTask {
            index: 3,
            target_byte_size: 4096,
        };
        let shard = generator.build_shard(&task, 1_700_000_000.0).unwrap();
        assert!(shard.len() >= 4096);
        assert_eq!(shard.last(), Some(&b'\n'));

        for line in shard.split(|&b| b == b'\n').filter(|l| !l.is_empty()) {
            let event: LogEvent = serde_json::from_slice(line).unwrap();
            assert!(SERVICES.contains(&event.service.as_str()));
            assert!(event.timestamp >= 1_700_000_000.0 && event.timestamp <= 1_700_000_001.0);
            match classify_line(line) {
                Classification::Matched(code) => {
                    assert!(STATUS_CODES.contains(&code.as_u16()))
                }
                other => panic!("unexpected classification {:?}", other),
            }
        }
    }

    #[test]
    fn test_seeded_shards_are_reproducible() {
        let (_, generator) = generator(2048);
        let task = ShardTask {
            index: 1,
            target_byte_size: 2048,
        };
        let a = generator.build_shard(&task, 5.0).unwrap();
        let b = generator.build_shard(&task, 5.0).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_zero_shards_per_round_rejected() {
        let (_, generator) = generator(1024);
        assert!(generator.generate(1024, 0).is_err());
    }

    #[test]
    fn test_zero_budget_does_nothing() {
        let (store, generator) = generator(1024);
        let report = generator.generate(0, 4).unwrap();
        assert_eq!(report.rounds, 0);
        assert_eq!(report.shards_written, 0);
        assert!(store.is_empty());
    }
}
