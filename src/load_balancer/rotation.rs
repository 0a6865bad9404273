//! Round-robin rotation sequence.
//!
//! An arena-backed doubly linked list with a persistent cursor. `next()` is
//! O(1) and `remove()` is O(1) through an id → slot index.
//!
//! # Cursor policy
//! Removing the node under the cursor does not move the cursor. The node is
//! unlinked but kept as a tombstone that remembers its successor, and the
//! following `next()` resolves through that link (wrapping to the head when
//! the successor is gone). Later removals patch the tombstone's link so it
//! never points at a freed slot.

use std::collections::HashMap;

use crate::load_balancer::error::{RouterError, RouterResult};
use crate::load_balancer::server::ServerId;

#[derive(Debug)]
struct Node {
    server: ServerId,
    prev: Option<usize>,
    next: Option<usize>,
    live: bool,
}

#[derive(Debug, Default)]
pub struct RotationSequence {
    nodes: Vec<Node>,
    free: Vec<usize>,
    slots: HashMap<ServerId, usize>,
    head: Option<usize>,
    tail: Option<usize>,
    cursor: Option<usize>,
}

impl RotationSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a server at the tail. Returns false if it is already present.
    pub fn append(&mut self, server: ServerId) -> bool {
        if self.slots.contains_key(&server) {
            return false;
        }

        let node = Node {
            server,
            prev: self.tail,
            next: None,
            live: true,
        };
        let slot = match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = node;
                slot
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        };

        match self.tail {
            Some(tail) => self.nodes[tail].next = Some(slot),
            None => self.head = Some(slot),
        }
        self.tail = Some(slot);
        self.slots.insert(server, slot);
        true
    }

    /// Unlink a server. Unknown ids are a no-op and return false.
    pub fn remove(&mut self, server: ServerId) -> bool {
        let Some(slot) = self.slots.remove(&server) else {
            return false;
        };

        let (prev, next) = (self.nodes[slot].prev, self.nodes[slot].next);
        match prev {
            Some(p) => self.nodes[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.nodes[n].prev = prev,
            None => self.tail = prev,
        }
        self.nodes[slot].live = false;

        if let Some(cursor) = self.cursor {
            if cursor != slot && !self.nodes[cursor].live && self.nodes[cursor].next == Some(slot) {
                self.nodes[cursor].next = next;
            }
        }

        if self.cursor != Some(slot) {
            self.free.push(slot);
        }

        if self.slots.is_empty() {
            self.reset();
        }
        true
    }

    /// Advance the cursor and return the server under it.
    pub fn next(&mut self) -> RouterResult<ServerId> {
        let Some(head) = self.head else {
            self.reset();
            return Err(RouterError::EmptySequence);
        };

        let target = match self.cursor {
            Some(cursor) => self.nodes[cursor].next.unwrap_or(head),
            None => head,
        };

        if let Some(cursor) = self.cursor {
            if !self.nodes[cursor].live {
                self.free.push(cursor);
            }
        }
        self.cursor = Some(target);
        Ok(self.nodes[target].server)
    }

    /// Server under the cursor, if it is still in the sequence.
    pub fn current(&self) -> Option<ServerId> {
        let cursor = self.cursor?;
        let node = &self.nodes[cursor];
        node.live.then_some(node.server)
    }

    pub fn contains(&self, server: ServerId) -> bool {
        self.slots.contains_key(&server)
    }

    /// Servers in traversal order, starting at the head.
    pub fn iter(&self) -> impl Iterator<Item = ServerId> + '_ {
        std::iter::successors(self.head, |&slot| self.nodes[slot].next)
            .map(|slot| self.nodes[slot].server)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn reset(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
        self.cursor = None;
    }
}
