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

//! logbench CLI library.
//!
//! # Commands
//!
//! - **generate**: write synthetic NDJSON log shards until a byte budget is met
//! - **count**: run an engine over a source directory as one measured trial
//! - **report**: execution time statistics over captured run logs
//! - **history**: recorded trials of one experiment
//!
//! # Exit codes
//!
//! `0` on success, `2` when the input location is missing, not a directory
//! or empty, `1` for any other error.

pub mod cli;
pub mod commands;
