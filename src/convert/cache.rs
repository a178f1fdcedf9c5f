// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Memoized conversion results
//!
//! Entries are keyed on a SHA-256 fingerprint of everything a subtree's
//! result depends on: the serialized node, the visible variable bindings,
//! the visible user modules and the converter configuration. Identical
//! inputs always map to the same key, so entries never need invalidating.
//! The key does not cover where the subtree sits, so each entry also
//! records the subtree's height for the depth guard.

use crate::ast::{Node, Value};
use crate::geometry::GeometryDescription;
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Hex-encoded SHA-256 digest
pub type Fingerprint = String;

/// A converted subtree and the number of levels its walk spanned
#[derive(Debug, Clone, PartialEq)]
pub struct CachedSubtree {
    pub description: GeometryDescription,
    /// 1 for a leaf
    pub height: usize,
}

/// Thread-safe result cache shared between converters
#[derive(Debug, Default)]
pub struct ResultCache {
    entries: DashMap<Fingerprint, Arc<CachedSubtree>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

/// Cache counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: usize,
    pub misses: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fingerprint a subtree together with the context it is converted in.
    ///
    /// Returns `None` if the node cannot be serialized, in which case the
    /// subtree is simply not cached.
    pub fn fingerprint(
        node: &Node,
        bindings: &[(String, Value)],
        modules_digest: &str,
        config: &str,
    ) -> Option<Fingerprint> {
        let mut hasher = Sha256::new();
        hasher.update(serde_json::to_vec(node).ok()?);
        hasher.update([0u8]);
        hasher.update(serde_json::to_vec(bindings).ok()?);
        hasher.update([0u8]);
        hasher.update(modules_digest.as_bytes());
        hasher.update([0u8]);
        hasher.update(config.as_bytes());
        Some(hex(&hasher.finalize()))
    }

    pub fn get(&self, key: &str) -> Option<Arc<CachedSubtree>> {
        match self.entries.get(key) {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(Arc::clone(entry.value()))
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub fn insert(&self, key: Fingerprint, subtree: CachedSubtree) {
        self.entries.insert(key, Arc::new(subtree));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all entries and reset the counters
    pub fn clear(&self) {
        self.entries.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

/// Chain a digest with more data; used for the user-module digest stack
pub(crate) fn chain_digest(previous: &str, data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(previous.as_bytes());
    hasher.update([0u8]);
    hasher.update(data);
    hex(&hasher.finalize())
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
