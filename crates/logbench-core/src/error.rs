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

//! Structured error types shared by every logbench crate.
//!
//! Record-level problems (a line that is not text, a message without a status
//! code) and failed resource samples are recovered where they happen and never
//! show up here. Everything in [`LogbenchError`] is either fatal to the current
//! run or reported to the controller that decides what to do with it.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for logbench operations.
pub type Result<T> = std::result::Result<T, LogbenchError>;

/// Process exit code for invalid or missing input locations.
pub const EXIT_INPUT: u8 = 2;

/// Process exit code for every other fatal error.
pub const EXIT_FAILURE: u8 = 1;

/// The main error type for logbench operations.
///
/// Implements `Clone` so worker results can be collected across threads and
/// reported more than once (log line plus final summary).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LogbenchError {
    /// The source location is missing, not a directory, or holds no inputs.
    #[error("Invalid input '{path}': {reason}")]
    Input {
        /// The offending location
        path: PathBuf,
        /// Why it was rejected
        reason: String,
    },

    /// I/O operation failed.
    #[error("I/O error for '{path}': {message}")]
    Io {
        /// The file path that caused the error
        path: PathBuf,
        /// The error message
        message: String,
    },

    /// One aggregation or generation worker failed outright.
    #[error("Worker failed on '{input}': {message}")]
    Worker {
        /// The file or shard the worker was handling
        input: String,
        /// The error message
        message: String,
    },

    /// Object store operation failed.
    #[error("Object store error for '{key}': {message}")]
    Store {
        /// The object key
        key: String,
        /// The error message
        message: String,
    },

    /// Run history could not be read or written.
    #[error("Run history error for '{path}': {message}")]
    History {
        /// The history file
        path: PathBuf,
        /// The error message
        message: String,
    },

    /// Invalid configuration parameter.
    #[error("Invalid configuration parameter '{parameter}': {reason}")]
    InvalidConfig {
        /// Parameter name
        parameter: String,
        /// Reason for invalidity
        reason: String,
    },

    /// An operation was called in the wrong lifecycle state.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// The measured workload failed.
    #[error("Workload failed: {0}")]
    Workload(String),

    /// CSV serialization error.
    #[error("CSV error: {0}")]
    Csv(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(String),
}

impl LogbenchError {
    /// Create an input error.
    pub fn input(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Input {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an I/O error with file path context.
    pub fn io_error(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: source.to_string(),
        }
    }

    /// Wrap an error raised while a worker handled `input`.
    ///
    /// Errors that already carry worker context are passed through unchanged.
    pub fn worker(input: impl Into<String>, source: LogbenchError) -> Self {
        match source {
            already @ Self::Worker { .. } => already,
            other => Self::Worker {
                input: input.into(),
                message: other.to_string(),
            },
        }
    }

    /// Create an object store error.
    pub fn store(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Store {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create a run history error.
    pub fn history(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::History {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    /// Create a workload error.
    pub fn workload(msg: impl Into<String>) -> Self {
        Self::Workload(msg.into())
    }

    /// Exit status a binary should report for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Input { .. } => EXIT_INPUT,
            _ => EXIT_FAILURE,
        }
    }
}

impl From<serde_json::Error> for LogbenchError {
    fn from(source: serde_json::Error) -> Self {
        Self::Json(source.to_string())
    }
}

impl From<csv::Error> for LogbenchError {
    fn from(source: csv::Error) -> Self {
        Self::Csv(source.to_string())
    }
}
