//! Least-loaded priority index.
//!
//! A min-heap of `(load, id)` snapshots. Entries are never updated in place:
//! the router re-pushes a server after every load mutation, so the heap can
//! hold several stale entries for the same id. A popped id is a candidate, not
//! a guarantee that its load is still minimal.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::load_balancer::error::{RouterError, RouterResult};
use crate::load_balancer::server::{Server, ServerId};

/// Snapshot of a server's load at push time. Ordered by load, then id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PriorityEntry {
    pub load: u32,
    pub id: ServerId,
}

impl From<&Server> for PriorityEntry {
    fn from(server: &Server) -> Self {
        Self {
            load: server.load(),
            id: server.id(),
        }
    }
}

#[derive(Debug, Default)]
pub struct LoadIndex {
    heap: BinaryHeap<Reverse<PriorityEntry>>,
}

impl LoadIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert the server's current `(load, id)` snapshot.
    pub fn push(&mut self, server: &Server) {
        self.heap.push(Reverse(PriorityEntry::from(server)));
    }

    /// Remove and return the smallest entry.
    pub fn pop_min(&mut self) -> RouterResult<PriorityEntry> {
        self.heap
            .pop()
            .map(|Reverse(entry)| entry)
            .ok_or(RouterError::EmptyIndex)
    }

    pub fn peek_min(&self) -> Option<PriorityEntry> {
        self.heap.peek().map(|Reverse(entry)| *entry)
    }

    /// Replace every entry with one fresh snapshot per server.
    ///
    /// Used after membership or out-of-band load changes; drops stale
    /// duplicates and entries of servers no longer present.
    pub fn rebuild<'a>(&mut self, servers: impl IntoIterator<Item = &'a Server>) {
        let entries: Vec<_> = servers
            .into_iter()
            .map(|s| Reverse(PriorityEntry::from(s)))
            .collect();
        self.heap = BinaryHeap::from(entries);
    }

    /// Number of entries, stale ones included.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
