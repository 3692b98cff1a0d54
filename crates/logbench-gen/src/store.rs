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

//! Object stores receiving generated shards.
//!
//! Keys are `/`-separated relative paths. Every store refuses to overwrite
//! an existing key.

use logbench_core::{LogbenchError, Result};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A flat key/value blob store.
///
/// Implementations are shared by every generator worker and must be safe
/// to call concurrently.
pub trait ObjectStore: Send + Sync {
    /// Stores `body` under `key`.
    ///
    /// # Errors
    ///
    /// `Store` when the key is invalid, already exists, or the write fails.
    fn put(&self, key: &str, body: &[u8]) -> Result<()>;

    /// Reads the object under `key`.
    fn get(&self, key: &str) -> Result<Vec<u8>>;

    /// Keys starting with `prefix`, sorted.
    fn list(&self, prefix: &str) -> Result<Vec<String>>;

    /// Human-readable location for log output.
    fn describe(&self) -> String;
}

/// Rejects empty keys, absolute keys and `..` segments.
pub fn validate_key(key: &str) -> Result<()> {
    let reason = if key.is_empty() {
        Some("key is empty")
    } else if key.starts_with('/') || key.starts_with('\\') {
        Some("key must be relative")
    } else if key.split(&['/', '\\'][..]).any(|segment| segment == ".." || segment.is_empty()) {
        Some("key has an empty or '..' segment")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(LogbenchError::store(key, reason)),
        None => Ok(()),
    }
}

/// Directory-backed store; keys map to files below `root`.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(key.split('/').fold(self.root.clone(), |path, seg| path.join(seg)))
    }
}

impl ObjectStore for LocalStore {
    fn put(&self, key: &str, body: &[u8]) -> Result<()> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| LogbenchError::store(key, e.to_string()))?;
        }

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => LogbenchError::store(key, "object already exists"),
                _ => LogbenchError::store(key, e.to_string()),
            })?;
        file.write_all(body)
            .and_then(|_| file.flush())
            .map_err(|e| LogbenchError::store(key, e.to_string()))
    }

    fn get(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.path_for(key)?;
        fs::read(&path).map_err(|e| LogbenchError::store(key, e.to_string()))
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut keys = Vec::new();
        for entry in WalkDir::new(&self.root) {
            let entry = entry.map_err(|e| LogbenchError::store(prefix, e.to_string()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            let key = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            if key.starts_with(prefix) {
                keys.push(key);
            }
        }
        keys.sort();
        Ok(keys)
    }

    fn describe(&self) -> String {
        format!("file://{}", self.root.display())
    }
}

/// In-process store, mostly for tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }

    /// Sum of all object sizes.
    pub fn total_bytes(&self) -> u64 {
        self.objects.read().values().map(|v| v.len() as u64).sum()
    }
}

impl ObjectStore for MemoryStore {
    fn put(&self, key: &str, body: &[u8]) -> Result<()> {
        validate_key(key)?;
        let mut objects = self.objects.write();
        if objects.contains_key(key) {
            return Err(LogbenchError::store(key, "object already exists"));
        }
        objects.insert(key.to_string(), body.to_vec());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Vec<u8>> {
        self.objects
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| LogbenchError::store(key, "no such object"))
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .objects
            .read()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }

    fn describe(&self) -> String {
        "memory://".to_string()
    }
}
