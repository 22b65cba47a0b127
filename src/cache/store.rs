//! Entry Store Module
//!
//! Keyed entry table with recency order, size accounting and counters.
//! Not synchronized on its own; `ModelCache` guards it with a single mutex.
//!
//! Store calls happen outside that mutex, so write-throughs and cache fills
//! take a ticket first. A write-through is mirrored only if no other write on
//! the same key overlapped it, and a fill only if no write began or ended
//! while it ran.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use crate::cache::{CacheEntry, CacheStats, EvictionPolicy, LruList};

// == Tickets ==
/// Issued before a write-through store call; redeemed with
/// [`EntryStore::finish_write`] or [`EntryStore::abandon_write`].
#[derive(Debug)]
pub struct WriteTicket(());

/// Issued before a read that fills the cache from the store; redeemed with
/// [`EntryStore::finish_read`] or [`EntryStore::abandon_read`].
#[derive(Debug)]
pub struct ReadTicket {
    seq: u64,
}

/// What happened to a finished write-through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The entry now mirrors this write.
    Applied,
    /// Another write on the key overlapped this one, so the order the store
    /// saw them in is unknown; the entry was removed and the next read goes
    /// back to the store.
    Invalidated,
}

/// How a finished read fills the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fill {
    /// Only if the key is still absent
    IfAbsent,
    /// Unconditionally, counted as a put
    Overwrite,
}

/// Store calls outstanding on one key.
#[derive(Debug, Default)]
struct InFlight {
    /// Outstanding write-throughs
    writers: usize,
    /// Set once two write-throughs overlap; cleared when none are left
    contended: bool,
    /// Sequence of the last write begun or ended
    changed_at: u64,
    /// Outstanding tickets of either kind
    holders: usize,
}

// == Entry Store ==
/// Entries, their recency order and the running total size.
///
/// The running size is the sum of reported sizes of every held entry,
/// `Cached` and `Deleted` alike.
#[derive(Debug)]
pub struct EntryStore<K, V> {
    entries: LruList<K, V>,
    size: u64,
    policy: EvictionPolicy,
    stats: Arc<CacheStats>,
    in_flight: HashMap<K, InFlight>,
    seq: u64,
}

impl<K: Eq + Hash + Clone, V> EntryStore<K, V> {
    // == Constructor ==
    /// Creates an empty store bounded by `policy` and reporting to `stats`.
    pub fn new(policy: EvictionPolicy, stats: Arc<CacheStats>) -> Self {
        Self {
            entries: LruList::new(),
            size: 0,
            policy,
            stats,
            in_flight: HashMap::new(),
            seq: 0,
        }
    }

    // == Lookup ==
    /// Returns what the cache knows about `key`, counting a hit or a miss.
    ///
    /// Known keys move to the most recently used end; a miss leaves the order
    /// untouched.
    pub fn lookup(&mut self, key: &K) -> CacheEntry<V> {
        let entry = match self.entries.touch(key) {
            Some(entry) => entry.clone(),
            None => CacheEntry::NotInCache,
        };
        self.stats.record_lookup(entry.is_known());
        entry
    }

    // == Peek ==
    /// Returns what the cache knows about `key` with no side effects.
    pub fn peek(&self, key: &K) -> CacheEntry<V> {
        self.entries
            .peek(key)
            .cloned()
            .unwrap_or(CacheEntry::NotInCache)
    }

    // == Store ==
    /// Inserts or replaces `key` with a live model, then evicts as needed.
    pub fn store(&mut self, key: K, value: Arc<V>, size: u64) {
        self.stats.record_put();
        self.replace(key, CacheEntry::cached(value, size));
    }

    // == Mark Deleted ==
    /// Replaces any entry for `key` with a tombstone, then evicts as needed.
    pub fn mark_deleted(&mut self, key: K) {
        self.stats.record_delete();
        self.replace(key, CacheEntry::Deleted);
    }

    // == Overwrite ==
    /// Unconditionally writes a retrieval result, counted as a put.
    pub fn overwrite(&mut self, key: K, entry: CacheEntry<V>) {
        self.stats.record_put();
        self.replace(key, entry);
    }

    // == Populate ==
    /// Writes a retrieval result only if `key` is still absent.
    ///
    /// A put or delete that landed while the store was being read wins over
    /// the retrieved value. Returns whether the entry was written.
    pub fn populate(&mut self, key: K, entry: CacheEntry<V>) -> bool {
        if self.entries.contains(&key) {
            return false;
        }
        self.overwrite(key, entry);
        true
    }

    // == Write-through Tickets ==
    /// Registers a write-through on `key` that is about to call the store.
    ///
    /// Fills already outstanding on `key` become stale, and a write
    /// overlapping another write marks the key contended.
    pub fn begin_write(&mut self, key: &K) -> WriteTicket {
        let seq = self.next_seq();
        let flight = self.in_flight.entry(key.clone()).or_default();
        if flight.writers > 0 {
            flight.contended = true;
        }
        flight.writers += 1;
        flight.holders += 1;
        flight.changed_at = seq;
        WriteTicket(())
    }

    /// Mirrors a successful store write in the cache.
    ///
    /// `entry` is a `Cached` model (counted as a put) or a tombstone (counted
    /// as a delete). If another write on the key overlapped this one the
    /// entry is dropped instead, uncounted.
    pub fn finish_write(
        &mut self,
        key: K,
        _ticket: WriteTicket,
        entry: CacheEntry<V>,
    ) -> WriteOutcome {
        let outcome = if self.end_write(&key) {
            WriteOutcome::Invalidated
        } else {
            WriteOutcome::Applied
        };

        match outcome {
            WriteOutcome::Applied => {
                if entry.is_deleted() {
                    self.stats.record_delete();
                } else {
                    self.stats.record_put();
                }
                self.replace(key, entry);
            }
            WriteOutcome::Invalidated => self.invalidate(&key),
        }
        outcome
    }

    /// Releases the ticket of a failed store write. The cache is untouched.
    pub fn abandon_write(&mut self, key: &K, _ticket: WriteTicket) {
        self.end_write(key);
    }

    /// Ends a write on `key`, returning whether it was contended.
    fn end_write(&mut self, key: &K) -> bool {
        let seq = self.next_seq();
        let contended = match self.in_flight.get_mut(key) {
            Some(flight) => {
                let contended = flight.contended;
                flight.changed_at = seq;
                flight.writers = flight.writers.saturating_sub(1);
                if flight.writers == 0 {
                    flight.contended = false;
                }
                contended
            }
            None => false,
        };
        self.release(key);
        contended
    }

    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    /// Registers a read on `key` that will fill the cache from the store.
    pub fn begin_read(&mut self, key: &K) -> ReadTicket {
        self.in_flight.entry(key.clone()).or_default().holders += 1;
        ReadTicket { seq: self.seq }
    }

    /// Fills the cache with a retrieval result unless a write on `key` began
    /// or ended since the read began.
    ///
    /// Returns whether the entry was written.
    pub fn finish_read(
        &mut self,
        key: K,
        ticket: ReadTicket,
        entry: CacheEntry<V>,
        fill: Fill,
    ) -> bool {
        let stale = self
            .in_flight
            .get(&key)
            .map_or(false, |flight| flight.changed_at > ticket.seq);
        self.release(&key);
        if stale {
            return false;
        }

        match fill {
            Fill::IfAbsent => self.populate(key, entry),
            Fill::Overwrite => {
                self.overwrite(key, entry);
                true
            }
        }
    }

    /// Releases the ticket of a failed retrieval.
    pub fn abandon_read(&mut self, key: &K, _ticket: ReadTicket) {
        self.release(key);
    }

    fn release(&mut self, key: &K) {
        if let Some(flight) = self.in_flight.get_mut(key) {
            flight.holders = flight.holders.saturating_sub(1);
            if flight.holders == 0 {
                self.in_flight.remove(key);
            }
        }
    }

    /// Number of keys with store calls outstanding.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    // == Invalidate ==
    /// Drops the entry for `key` without counting an eviction.
    pub fn invalidate(&mut self, key: &K) {
        if let Some(previous) = self.entries.remove(key) {
            self.size -= previous.size();
        }
    }

    fn replace(&mut self, key: K, entry: CacheEntry<V>) {
        if !entry.is_known() {
            self.invalidate(&key);
            return;
        }

        let added = entry.size();
        let removed = self
            .entries
            .insert(key, entry)
            .map_or(0, |previous| previous.size());
        self.size = self.size - removed + added;

        let policy = self.policy;
        policy.enforce(self);
    }

    // == Evict ==
    /// Evicts the least recently used entry, counting the eviction.
    ///
    /// Returns false if the store is empty.
    pub fn evict_one_least_recently_used(&mut self) -> bool {
        match self.discard_least_recently_used() {
            Some(_) => {
                self.stats.record_eviction();
                true
            }
            None => false,
        }
    }

    /// Removes the least recently used entry without counting it.
    pub(crate) fn discard_least_recently_used(&mut self) -> Option<K> {
        let (key, entry) = self.entries.pop_oldest()?;
        self.size -= entry.size();
        Some(key)
    }

    // == Snapshot ==
    /// Copies every entry, least recently used first.
    pub fn snapshot(&self) -> Vec<(K, CacheEntry<V>)> {
        self.entries
            .iter_oldest_first()
            .map(|(key, entry)| (key.clone(), entry.clone()))
            .collect()
    }

    // == Seed ==
    /// Loads entries in the given order without counting, then trims them
    /// against the bound without counting evictions.
    pub fn seed(&mut self, entries: impl IntoIterator<Item = (K, CacheEntry<V>)>) {
        for (key, entry) in entries {
            if !entry.is_known() {
                continue;
            }
            let added = entry.size();
            let removed = self
                .entries
                .insert(key, entry)
                .map_or(0, |previous| previous.size());
            self.size = self.size - removed + added;
        }
        let policy = self.policy;
        policy.trim(self);
    }

    // == Clear ==
    /// Drops every entry. Counters are left as they are.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.size = 0;
    }

    /// Least recently used key, next in line for eviction.
    pub fn oldest_key(&self) -> Option<&K> {
        self.entries.peek_oldest()
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn max_size(&self) -> u64 {
        self.policy.max_size()
    }
}
