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

//! Generate command - synthetic shards into a directory store

use super::write_stdout;
use colored::Colorize;
use logbench_core::Result;
use logbench_gen::{GeneratorConfig, LocalStore, ObjectStore, ShardGenerator};
use std::path::PathBuf;
use std::sync::Arc;

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub out: PathBuf,
    pub prefix: String,
    pub target_bytes: u64,
    pub shards: usize,
    pub chunk_size: usize,
    pub max_workers: usize,
    pub seed: Option<u64>,
}

/// Generates shards below `options.out` and prints a one-line summary.
pub fn generate(options: GenerateOptions) -> Result<()> {
    let store = Arc::new(LocalStore::new(&options.out));
    let location = store.describe();
    let config = GeneratorConfig {
        prefix: options.prefix.clone(),
        chunk_size: options.chunk_size,
        max_workers: options.max_workers,
        seed: options.seed,
    };

    let generator = ShardGenerator::new(store, config)?;
    let report = generator.generate(options.target_bytes, options.shards)?;

    write_stdout(&format!(
        "{} ~{:.2} GiB ({} bytes) in {} shards over {} rounds at {}/{}\n",
        "Generated".green().bold(),
        report.bytes_written as f64 / GIB,
        report.bytes_written,
        report.shards_written,
        report.rounds,
        location,
        options.prefix.trim_end_matches('/'),
    ))
}
