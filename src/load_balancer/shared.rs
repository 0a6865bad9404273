//! Thread-safe router handle.
//!
//! The indexes are not independently synchronised, so the whole router sits
//! behind one mutex and every call holds it for its full duration. Routing and
//! load mutation for a server are therefore linearizable.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::load_balancer::error::RouterResult;
use crate::load_balancer::policy::Policy;
use crate::load_balancer::router::{Assignment, Router, ServerStatus};
use crate::load_balancer::server::{ServerId, ServerSpec};

/// Cloneable handle to a router shared between threads.
#[derive(Debug, Clone)]
pub struct SharedRouter {
    inner: Arc<Mutex<Router>>,
}

impl SharedRouter {
    pub fn new(router: Router) -> Self {
        Self {
            inner: Arc::new(Mutex::new(router)),
        }
    }

    /// Exclusive access for multi-step operations.
    ///
    /// Every mutation is a single in-memory step, so a poisoned lock still
    /// guards consistent state and is recovered.
    pub fn lock(&self) -> MutexGuard<'_, Router> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn route(&self, policy: Policy, session: Option<&str>) -> RouterResult<Assignment> {
        self.lock().route(policy, session)
    }

    pub fn release(&self, id: ServerId) -> bool {
        self.lock().release(id)
    }

    pub fn scale_up(&self, specs: &[ServerSpec]) -> RouterResult<Vec<ServerId>> {
        self.lock().scale_up(specs)
    }

    pub fn scale_down(&self, ids: &[ServerId]) -> Vec<ServerId> {
        self.lock().scale_down(ids)
    }

    pub fn set_health(&self, id: ServerId, active: bool) -> bool {
        self.lock().set_health(id, active)
    }

    pub fn snapshot(&self) -> Vec<ServerStatus> {
        self.lock().snapshot()
    }
}

impl From<Router> for SharedRouter {
    fn from(router: Router) -> Self {
        Self::new(router)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_concurrent_routing_never_exceeds_capacity() {
        let specs: Vec<_> = (1..=4).map(|id| ServerSpec::new(ServerId(id), 25, 10)).collect();
        let shared = SharedRouter::new(Router::new(&specs).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let shared = shared.clone();
                thread::spawn(move || {
                    let mut accepted = 0;
                    for i in 0..20 {
                        let policy = Policy::ALL[(t + i) % 3];
                        let session = format!("client_{}", i % 5);
                        if shared.route(policy, Some(session.as_str())).unwrap().is_accepted() {
                            accepted += 1;
                        }
                    }
                    accepted
                })
            })
            .collect();

        let accepted: u32 = handles.into_iter().map(|h| h.join().unwrap()).sum();
        let snapshot = shared.snapshot();
        let total: u32 = snapshot.iter().map(|s| s.load).sum();

        assert_eq!(total, accepted);
        assert!(snapshot.iter().all(|s| s.load <= s.capacity));
    }
}
