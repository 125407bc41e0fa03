// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! LRU cache for settled decryptions.
//!
//! A ciphertext handle never changes, so the plaintext a given signer
//! obtained for it stays valid within one wallet session; caching it avoids
//! another signature prompt and network round trip. Failures are never cached.

use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use lru::LruCache;

use super::DecryptKey;
use crate::blockchain::DecryptedAmount;

struct CacheEntry {
    amount: DecryptedAmount,
    inserted_at: Instant,
}

/// In-process LRU cache of decrypted plaintexts keyed by [`DecryptKey`].
pub struct DecryptCache {
    cache: Mutex<LruCache<DecryptKey, CacheEntry>>,
    ttl: Duration,
}

impl DecryptCache {
    /// Create a new cache with the given capacity and TTL.
    ///
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    /// Returns `None` if not cached or expired.
    pub fn get(&self, key: &DecryptKey) -> Option<DecryptedAmount> {
        let mut cache = self.cache.lock().ok()?;
        if let Some(entry) = cache.get(key) {
            if entry.inserted_at.elapsed() < self.ttl {
                return Some(entry.amount);
            }
            cache.pop(key);
        }
        None
    }

    pub fn put(&self, key: DecryptKey, amount: DecryptedAmount) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.put(
                key,
                CacheEntry {
                    amount,
                    inserted_at: Instant::now(),
                },
            );
        }
    }

    /// Drop every entry decrypted by `signer`.
    pub fn invalidate_signer(&self, signer: &alloy::primitives::Address) {
        if let Ok(mut cache) = self.cache.lock() {
            let stale: Vec<DecryptKey> = cache
                .iter()
                .filter(|(key, _)| &key.signer == signer)
                .map(|(key, _)| *key)
                .collect();
            for key in stale {
                cache.pop(&key);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.cache.lock().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
