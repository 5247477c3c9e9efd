// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! In-memory cache tier with TTL and a size cap

use serde_json::Value;
use std::collections::HashMap;
use std::time::{Duration, Instant};

struct Slot {
    value: Value,
    inserted: Instant,
}

/// Bounded map whose entries expire after `ttl`
///
/// When over capacity, expired entries go first, then the oldest ones.
pub struct MemoryCache {
    slots: HashMap<String, Slot>,
    capacity: usize,
    ttl: Duration,
}

impl MemoryCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            slots: HashMap::new(),
            capacity: capacity.max(1),
            ttl,
        }
    }

    pub fn get(&mut self, key: &str) -> Option<Value> {
        let expired = match self.slots.get(key) {
            Some(slot) => slot.inserted.elapsed() >= self.ttl,
            None => return None,
        };
        if expired {
            self.slots.remove(key);
            return None;
        }
        self.slots.get(key).map(|slot| slot.value.clone())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.slots
            .get(key)
            .is_some_and(|slot| slot.inserted.elapsed() < self.ttl)
    }

    pub fn insert(&mut self, key: String, value: Value) {
        self.slots.insert(key, Slot { value, inserted: Instant::now() });
        self.enforce_capacity();
    }

    /// Remove expired entries, returning how many were dropped
    pub fn purge_expired(&mut self) -> usize {
        let before = self.slots.len();
        let ttl = self.ttl;
        self.slots.retain(|_, slot| slot.inserted.elapsed() < ttl);
        before - self.slots.len()
    }

    fn enforce_capacity(&mut self) {
        if self.slots.len() <= self.capacity {
            return;
        }
        self.purge_expired();
        while self.slots.len() > self.capacity {
            let oldest = self
                .slots
                .iter()
                .min_by_key(|(_, slot)| slot.inserted)
                .map(|(key, _)| key.clone());
            match oldest {
                Some(key) => {
                    self.slots.remove(&key);
                }
                None => break,
            }
        }
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}
