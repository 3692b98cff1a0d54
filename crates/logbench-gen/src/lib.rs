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

//! Synthetic log shard generation.
//!
//! Produces NDJSON shards of `{"service","timestamp","message"}` events with
//! a weighted HTTP status distribution and uploads them to an
//! [`ObjectStore`] until a byte budget is met.
//!
//! # Example
//!
//! ```rust
//! use logbench_gen::{GeneratorConfig, MemoryStore, ShardGenerator};
//! use std::sync::Arc;
//!
//! # fn main() -> logbench_core::Result<()> {
//! let store = Arc::new(MemoryStore::new());
//! let config = GeneratorConfig::default().with_chunk_size(64 * 1024);
//! let generator = ShardGenerator::new(store.clone(), config)?;
//!
//! let report = generator.generate(256 * 1024, 4)?;
//! assert!(report.bytes_written >= 256 * 1024);
//! assert_eq!(store.len() as u64, report.shards_written);
//! # Ok(())
//! # }
//! ```

pub mod generator;
pub mod store;

pub use generator::{
    ByteBudget, GenerationReport, GeneratorConfig, ShardGenerator, ShardTask, DEFAULT_CHUNK_SIZE,
    DEFAULT_MAX_WORKERS, SERVICES, STATUS_CODES, STATUS_WEIGHTS,
};
pub use store::{LocalStore, MemoryStore, ObjectStore};
