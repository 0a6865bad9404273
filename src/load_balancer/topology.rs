//! Latency topology between servers.
//!
//! Undirected weighted graph stored as adjacency lists. Neighbour order is
//! edge insertion order, which decides ties in `nearest`.

use std::collections::HashMap;

use crate::load_balancer::server::{Server, ServerId};

#[derive(Debug, Default)]
pub struct Topology {
    adjacency: HashMap<ServerId, Vec<(ServerId, u32)>>,
}

impl Topology {
    pub fn new() -> Self {
        Self::default()
    }

    /// Complete graph over `servers`. The edge between an earlier and a later
    /// server carries the later server's latency.
    pub fn complete<'a>(servers: impl IntoIterator<Item = &'a Server>) -> Self {
        let mut topology = Self::new();
        let mut seen: Vec<&Server> = Vec::new();
        for server in servers {
            topology.connect(server, seen.iter().copied());
            seen.push(server);
        }
        topology
    }

    /// Wire `server` to each of `existing`, weighted by `server`'s latency.
    pub fn connect<'a>(&mut self, server: &Server, existing: impl IntoIterator<Item = &'a Server>) {
        self.adjacency.entry(server.id()).or_default();
        for other in existing {
            if other.id() != server.id() {
                self.add_edge(other.id(), server.id(), server.latency());
            }
        }
    }

    /// Record an edge in both directions.
    pub fn add_edge(&mut self, a: ServerId, b: ServerId, weight: u32) {
        self.adjacency.entry(a).or_default().push((b, weight));
        self.adjacency.entry(b).or_default().push((a, weight));
    }

    /// Neighbours of `id` with edge weights; empty for unknown ids.
    pub fn neighbors(&self, id: ServerId) -> &[(ServerId, u32)] {
        self.adjacency.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Drop a node and every edge touching it.
    pub fn remove_node(&mut self, id: ServerId) -> bool {
        let Some(edges) = self.adjacency.remove(&id) else {
            return false;
        };
        for (neighbor, _) in edges {
            if let Some(list) = self.adjacency.get_mut(&neighbor) {
                list.retain(|(other, _)| *other != id);
            }
        }
        true
    }

    /// Lowest-weight neighbour of `from` accepted by `eligible`.
    /// The first minimum in neighbour order wins ties.
    pub fn nearest<F>(&self, from: ServerId, mut eligible: F) -> Option<(ServerId, u32)>
    where
        F: FnMut(ServerId) -> bool,
    {
        let mut best: Option<(ServerId, u32)> = None;
        for &(neighbor, weight) in self.neighbors(from) {
            if best.is_some_and(|(_, w)| weight >= w) {
                continue;
            }
            if eligible(neighbor) {
                best = Some((neighbor, weight));
            }
        }
        best
    }

    pub fn contains(&self, id: ServerId) -> bool {
        self.adjacency.contains_key(&id)
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }
}
