//! Bantay Cache Core - Staleness-Bounded Read Cache
//!
//! Pure cache bookkeeping shared by Bantay clients. Holds the latest known
//! value per queryable collection together with the monotonic time it was
//! fetched, and answers "is this still fresh?" against a caller-supplied
//! staleness window.
//!
//! Two guards keep concurrent fetches honest:
//!
//! - **Fetch sequencing**: `begin` hands out a ticket for the newest
//!   outstanding fetch of a key; `admit` only stores a completion whose
//!   ticket is still the newest. A slow early fetch completing after a fast
//!   later one is discarded instead of overwriting newer data.
//! - **Epochs**: `clear` bumps a global epoch and drops every slot. Tickets
//!   issued before the bump can never be admitted afterwards, so a fetch
//!   started under one identity cannot write into the next identity's cache.
//!
//! The crate is deliberately synchronous and I/O-free: callers inject the
//! current time in milliseconds, which keeps every path testable without a
//! live clock.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// Slots and tickets
// ============================================================================

/// A stored value plus the monotonic instant it was fetched.
#[derive(Debug, Clone)]
struct Slot<V> {
    value: V,
    fetched_at_ms: u64,
}

/// Handle for one outstanding fetch of one key.
///
/// Opaque to callers; produced by [`StalenessCache::begin`] and consumed by
/// [`StalenessCache::admit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    key: String,
    epoch: u64,
    seq: u64,
}

impl Ticket {
    /// The key this ticket was issued for.
    pub fn key(&self) -> &str {
        &self.key
    }
}

/// Point-in-time counters for observability.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of populated slots.
    pub entries: usize,
    /// Number of keys with an outstanding fetch.
    pub outstanding: usize,
    /// Current epoch (bumped on every `clear`).
    pub epoch: u64,
    /// Completions discarded as superseded or cross-epoch.
    pub discarded: u64,
}

// ============================================================================
// Cache
// ============================================================================

/// Staleness-bounded, fetch-sequenced read cache.
///
/// One instance serves many keys; values are whatever the caller stores
/// (Bantay clients store raw wire documents and decode on read).
#[derive(Debug)]
pub struct StalenessCache<V> {
    slots: HashMap<String, Slot<V>>,
    /// Newest issued fetch sequence per key. Removed once admitted.
    pending: HashMap<String, u64>,
    epoch: u64,
    next_seq: u64,
    discarded: u64,
}

impl<V> Default for StalenessCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> StalenessCache<V> {
    pub fn new() -> Self {
        Self {
            slots: HashMap::new(),
            pending: HashMap::new(),
            epoch: 0,
            next_seq: 0,
            discarded: 0,
        }
    }

    /// Value for `key` if it was fetched within the last `stale_ms`
    /// milliseconds. A zero window never serves from cache.
    pub fn fresh(&self, key: &str, now_ms: u64, stale_ms: u64) -> Option<&V> {
        let slot = self.slots.get(key)?;
        if stale_ms == 0 {
            return None;
        }
        if now_ms.saturating_sub(slot.fetched_at_ms) < stale_ms {
            Some(&slot.value)
        } else {
            None
        }
    }

    /// Value for `key` regardless of age (stale-while-revalidate display).
    pub fn any(&self, key: &str) -> Option<&V> {
        self.slots.get(key).map(|s| &s.value)
    }

    /// Register a new outstanding fetch for `key` and return its ticket.
    ///
    /// Supersedes any previously issued ticket for the same key: the older
    /// ticket will no longer be admitted.
    pub fn begin(&mut self, key: &str) -> Ticket {
        self.next_seq += 1;
        let seq = self.next_seq;
        self.pending.insert(key.to_string(), seq);
        Ticket {
            key: key.to_string(),
            epoch: self.epoch,
            seq,
        }
    }

    /// Store a completed fetch, if its ticket is still the newest outstanding
    /// fetch for the key in the current epoch. Returns whether the value was
    /// admitted; a discarded completion leaves the existing slot untouched.
    pub fn admit(&mut self, ticket: &Ticket, value: V, now_ms: u64) -> bool {
        if ticket.epoch != self.epoch {
            self.discarded += 1;
            return false;
        }
        if self.pending.get(&ticket.key) != Some(&ticket.seq) {
            self.discarded += 1;
            return false;
        }
        self.pending.remove(&ticket.key);
        self.slots.insert(
            ticket.key.clone(),
            Slot {
                value,
                fetched_at_ms: now_ms,
            },
        );
        true
    }

    /// Abandon an outstanding fetch without storing anything. A failed fetch
    /// leaves any previous value in place; this only clears the pending
    /// marker if the ticket is still the newest one.
    pub fn abandon(&mut self, ticket: &Ticket) {
        if ticket.epoch == self.epoch && self.pending.get(&ticket.key) == Some(&ticket.seq) {
            self.pending.remove(&ticket.key);
        }
    }

    /// Drop the slot for one key. Outstanding fetches are unaffected.
    pub fn invalidate(&mut self, key: &str) {
        self.slots.remove(key);
    }

    /// Drop every slot and bump the epoch, invalidating all outstanding
    /// tickets. Used on credential swap.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.pending.clear();
        self.epoch += 1;
    }

    /// True if a slot exists for `key`, fresh or not.
    pub fn contains(&self, key: &str) -> bool {
        self.slots.contains_key(key)
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.slots.len(),
            outstanding: self.pending.len(),
            epoch: self.epoch,
            discarded: self.discarded,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
