// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Deadline queue for keyed, re-armable timers.
//!
//! Each key owns at most one live timer. Re-arming a key supersedes its
//! previous deadline; superseded and cancelled entries stay in the heap and
//! are discarded when they reach the top.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::hash::Hash;

use crate::timing::Micros;

/// Key of a timer in a [`TimerQueue`]
pub trait TimerKey: Clone + Eq + Hash {
    /// Lower priorities fire first among timers with equal deadlines
    fn priority(&self) -> u8 {
        0
    }
}

/// A heap entry
#[derive(Debug, Clone)]
struct Entry<K> {
    deadline: Micros,
    priority: u8,
    seq: u64,
    key: K,
}

impl<K> Entry<K> {
    fn rank(&self) -> (Micros, u8, u64) {
        (self.deadline, self.priority, self.seq)
    }
}

// For BinaryHeap - we want the earliest deadline first
impl<K> PartialEq for Entry<K> {
    fn eq(&self, other: &Self) -> bool {
        self.rank() == other.rank()
    }
}

impl<K> Eq for Entry<K> {}

impl<K> Ord for Entry<K> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap behavior
        other.rank().cmp(&self.rank())
    }
}

impl<K> PartialOrd for Entry<K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Priority queue of keyed timers
#[derive(Debug)]
pub struct TimerQueue<K: TimerKey> {
    /// All entries, including superseded ones
    heap: BinaryHeap<Entry<K>>,
    /// Key -> sequence number of its live entry
    live: HashMap<K, u64>,
    /// Next sequence number, also the tie-break for equal deadlines
    next_seq: u64,
}

impl<K: TimerKey> TimerQueue<K> {
    /// Create an empty queue
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            live: HashMap::new(),
            next_seq: 0,
        }
    }

    /// Arm (or re-arm) the timer for `key`
    pub fn schedule(&mut self, key: K, deadline: Micros) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.live.insert(key.clone(), seq);
        self.heap.push(Entry {
            deadline,
            priority: key.priority(),
            seq,
            key,
        });
    }

    /// Disarm the timer for `key`. Returns whether it was armed.
    pub fn cancel(&mut self, key: &K) -> bool {
        self.live.remove(key).is_some()
    }

    /// Whether `key` has a live timer
    pub fn is_armed(&self, key: &K) -> bool {
        self.live.contains_key(key)
    }

    /// Disarm everything
    pub fn clear(&mut self) {
        self.heap.clear();
        self.live.clear();
    }

    /// Number of live timers
    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Deadline of the earliest live timer
    pub fn next_deadline(&mut self) -> Option<Micros> {
        self.discard_stale();
        self.heap.peek().map(|entry| entry.deadline)
    }

    /// Pop the earliest live timer if `due(deadline, key)` accepts it.
    ///
    /// Only the earliest timer is offered, so `due` must be monotone in
    /// (deadline, priority) order for draining to be complete.
    pub fn pop_due(&mut self, due: impl Fn(Micros, &K) -> bool) -> Option<(Micros, K)> {
        self.discard_stale();
        let top = self.heap.peek()?;
        if !due(top.deadline, &top.key) {
            return None;
        }

        let entry = self.heap.pop()?;
        self.live.remove(&entry.key);
        Some((entry.deadline, entry.key))
    }

    fn discard_stale(&mut self) {
        while let Some(top) = self.heap.peek() {
            if self.live.get(&top.key) == Some(&top.seq) {
                break;
            }
            self.heap.pop();
        }
    }
}

impl<K: TimerKey> Default for TimerQueue<K> {
    fn default() -> Self {
        Self::new()
    }
}
