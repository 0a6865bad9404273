//! Server registry.
//!
//! # Responsibilities
//! - Own the set of backend servers in insertion order
//! - Reject duplicate ids and zero capacities on insert
//! - Tolerate removal/lookup of unknown ids

use crate::load_balancer::error::{RouterError, RouterResult};
use crate::load_balancer::server::{Server, ServerId, ServerSpec};

/// The set of backend targets and their mutable state.
#[derive(Debug, Default)]
pub struct ServerRegistry {
    servers: Vec<Server>,
}

impl ServerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new server and return its id.
    pub fn add(&mut self, spec: &ServerSpec) -> RouterResult<ServerId> {
        if spec.capacity == 0 {
            return Err(RouterError::InvalidCapacity(spec.id));
        }
        if self.contains(spec.id) {
            return Err(RouterError::DuplicateServer(spec.id));
        }
        self.servers.push(Server::new(spec));
        Ok(spec.id)
    }

    /// Remove a server. Unknown ids are a no-op and yield `None`.
    pub fn remove(&mut self, id: ServerId) -> Option<Server> {
        let index = self.servers.iter().position(|s| s.id() == id)?;
        Some(self.servers.remove(index))
    }

    /// Flip the health flag. Returns false for unknown ids.
    pub fn set_active(&mut self, id: ServerId, active: bool) -> bool {
        match self.get_mut(id) {
            Some(server) => {
                server.set_active(active);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: ServerId) -> Option<&Server> {
        self.servers.iter().find(|s| s.id() == id)
    }

    pub fn get_mut(&mut self, id: ServerId) -> Option<&mut Server> {
        self.servers.iter_mut().find(|s| s.id() == id)
    }

    pub fn contains(&self, id: ServerId) -> bool {
        self.get(id).is_some()
    }

    /// Servers in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Server> {
        self.servers.iter()
    }

    pub fn as_slice(&self) -> &[Server] {
        &self.servers
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(id: u32) -> ServerSpec {
        ServerSpec::new(ServerId(id), 5, 10)
    }

    #[test]
    fn test_add_and_get() {
        let mut registry = ServerRegistry::new();
        assert_eq!(registry.add(&spec(1)).unwrap(), ServerId(1));
        registry.add(&spec(2)).unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get(ServerId(2)).unwrap().capacity(), 5);
        assert!(registry.get(ServerId(3)).is_none());
    }

    #[test]
    fn test_rejects_duplicate_and_zero_capacity() {
        let mut registry = ServerRegistry::new();
        registry.add(&spec(1)).unwrap();

        assert_eq!(
            registry.add(&spec(1)),
            Err(RouterError::DuplicateServer(ServerId(1)))
        );
        assert_eq!(
            registry.add(&ServerSpec::new(ServerId(2), 0, 10)),
            Err(RouterError::InvalidCapacity(ServerId(2)))
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unknown_ids_are_tolerated() {
        let mut registry = ServerRegistry::new();
        registry.add(&spec(1)).unwrap();

        assert!(registry.remove(ServerId(9)).is_none());
        assert!(!registry.set_active(ServerId(9), false));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove_keeps_order() {
        let mut registry = ServerRegistry::new();
        for id in 1..=4 {
            registry.add(&spec(id)).unwrap();
        }
        registry.remove(ServerId(2)).unwrap();

        let ids: Vec<_> = registry.iter().map(|s| s.id().0).collect();
        assert_eq!(ids, vec![1, 3, 4]);
    }
}
