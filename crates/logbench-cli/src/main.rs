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

//! logbench command line interface

use clap::Parser;
use logbench_cli::cli::Commands;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// logbench - log analytics benchmark harness
///
/// # Examples
///
/// ```bash
/// # Generate ~64 MiB of shards
/// logbench generate --out data --target-bytes 67108864 --shards 8
///
/// # Count status codes with the parallel engine
/// logbench count data/logs --workers 8
///
/// # Summarise captured logs
/// logbench report results/
/// ```
#[derive(Parser)]
#[command(name = "logbench")]
#[command(author, version, about = "logbench - log analytics benchmark harness", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

fn main() -> ExitCode {
    // Diagnostics go to stderr; stdout carries command output only.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("logbench=info".parse().expect("valid log directive")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command.execute() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}
