//! Session affinity index.
//!
//! An AVL tree mapping session ids to the server they were first routed to.
//! Nodes live in an arena and refer to each other by index; there is no
//! delete, so slots are never recycled.
//!
//! # Design Decisions
//! - Re-binding an existing session overwrites it (last bind wins)
//! - Bindings outlive the server they name; callers re-validate on lookup
//! - Heights are recomputed bottom-up on the insert path only

use std::borrow::Borrow;
use std::cmp::Ordering;

use crate::load_balancer::server::ServerId;

#[derive(Debug)]
struct Node<K> {
    key: K,
    server: ServerId,
    left: Option<usize>,
    right: Option<usize>,
    height: i32,
}

/// Ordered session → server map with O(log n) lookup and insert.
#[derive(Debug)]
pub struct AffinityIndex<K = String> {
    nodes: Vec<Node<K>>,
    root: Option<usize>,
}

impl<K> Default for AffinityIndex<K> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            root: None,
        }
    }
}

impl<K: Ord> AffinityIndex<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Server bound to `session`, if any.
    pub fn lookup<Q>(&self, session: &Q) -> Option<ServerId>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut current = self.root;
        while let Some(index) = current {
            let node = &self.nodes[index];
            current = match session.cmp(node.key.borrow()) {
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
                Ordering::Equal => return Some(node.server),
            };
        }
        None
    }

    /// Bind `session` to `server`, returning the binding it replaced.
    pub fn bind(&mut self, session: K, server: ServerId) -> Option<ServerId> {
        let mut replaced = None;
        let root = self.insert_at(self.root, session, server, &mut replaced);
        self.root = Some(root);
        replaced
    }

    fn insert_at(
        &mut self,
        node: Option<usize>,
        key: K,
        server: ServerId,
        replaced: &mut Option<ServerId>,
    ) -> usize {
        let Some(index) = node else {
            self.nodes.push(Node {
                key,
                server,
                left: None,
                right: None,
                height: 1,
            });
            return self.nodes.len() - 1;
        };

        match key.cmp(&self.nodes[index].key) {
            Ordering::Less => {
                let left = self.insert_at(self.nodes[index].left, key, server, replaced);
                self.nodes[index].left = Some(left);
            }
            Ordering::Greater => {
                let right = self.insert_at(self.nodes[index].right, key, server, replaced);
                self.nodes[index].right = Some(right);
            }
            Ordering::Equal => {
                *replaced = Some(std::mem::replace(&mut self.nodes[index].server, server));
                return index;
            }
        }

        self.update_height(index);
        self.rebalance(index)
    }

    fn rebalance(&mut self, index: usize) -> usize {
        let balance = self.balance_factor(Some(index));

        if balance > 1 {
            let left = self.nodes[index].left;
            // left-right: straighten into left-left first
            if self.balance_factor(left) < 0 {
                if let Some(left) = left {
                    let pivot = self.rotate_left(left);
                    self.nodes[index].left = Some(pivot);
                }
            }
            return self.rotate_right(index);
        }

        if balance < -1 {
            let right = self.nodes[index].right;
            // right-left: straighten into right-right first
            if self.balance_factor(right) > 0 {
                if let Some(right) = right {
                    let pivot = self.rotate_right(right);
                    self.nodes[index].right = Some(pivot);
                }
            }
            return self.rotate_left(index);
        }

        index
    }

    fn rotate_left(&mut self, z: usize) -> usize {
        let Some(y) = self.nodes[z].right else {
            return z;
        };
        self.nodes[z].right = self.nodes[y].left;
        self.nodes[y].left = Some(z);
        self.update_height(z);
        self.update_height(y);
        y
    }

    fn rotate_right(&mut self, z: usize) -> usize {
        let Some(y) = self.nodes[z].left else {
            return z;
        };
        self.nodes[z].left = self.nodes[y].right;
        self.nodes[y].right = Some(z);
        self.update_height(z);
        self.update_height(y);
        y
    }

    /// Every node has balance factor in {-1, 0, 1}, cached heights are
    /// accurate and keys are in strictly ascending in-order sequence.
    pub fn is_balanced(&self) -> bool {
        self.check(self.root).is_some() && {
            let keys: Vec<&K> = self.iter().map(|(k, _)| k).collect();
            keys.windows(2).all(|w| w[0] < w[1])
        }
    }

    fn check(&self, node: Option<usize>) -> Option<i32> {
        let Some(index) = node else {
            return Some(0);
        };
        let n = &self.nodes[index];
        let left = self.check(n.left)?;
        let right = self.check(n.right)?;
        let height = 1 + left.max(right);
        ((left - right).abs() <= 1 && height == n.height).then_some(height)
    }
}

impl<K> AffinityIndex<K> {
    /// Bindings in ascending session order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, ServerId)> + '_ {
        let mut stack = Vec::new();
        let mut current = self.root;
        std::iter::from_fn(move || {
            while let Some(index) = current {
                stack.push(index);
                current = self.nodes[index].left;
            }
            let index = stack.pop()?;
            let node = &self.nodes[index];
            current = node.right;
            Some((&node.key, node.server))
        })
    }

    /// Height of the tree; 0 when empty.
    pub fn height(&self) -> i32 {
        self.height_of(self.root)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn height_of(&self, node: Option<usize>) -> i32 {
        node.map_or(0, |index| self.nodes[index].height)
    }

    fn balance_factor(&self, node: Option<usize>) -> i32 {
        node.map_or(0, |index| {
            let n = &self.nodes[index];
            self.height_of(n.left) - self.height_of(n.right)
        })
    }

    fn update_height(&mut self, index: usize) {
        let n = &self.nodes[index];
        let height = 1 + self.height_of(n.left).max(self.height_of(n.right));
        self.nodes[index].height = height;
    }
}
