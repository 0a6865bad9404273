//! Policy dispatch and pool lifecycle.
//!
//! # Data Flow
//! ```text
//! route(policy, session)
//!     → select: exactly one of
//!         - priority.rs   (least-loaded)
//!         - rotation.rs   (round-robin)
//!         - affinity.rs   (session lookup, least-loaded on miss)
//!         - topology.rs   (nearest eligible neighbour, least-loaded fallback)
//!     → admit onto the chosen server (or reject at capacity)
//!     → re-push the server into the priority index
//!
//! scale_up / scale_down / set_health / release
//!     → registry + every affected index
//! ```
//!
//! # Design Decisions
//! - Rejections are outcomes, not errors; nothing is queued or retried
//! - Health only filters latency-aware neighbours; other policies may still
//!   return an inactive server
//! - Affinity hits on a removed server count as misses and are rebound

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use std::collections::HashSet;

use crate::config::validation::validate_config;
use crate::config::{RouterConfig, RoutingConfig};
use crate::load_balancer::affinity::AffinityIndex;
use crate::load_balancer::error::{RouterError, RouterResult};
use crate::load_balancer::policy::Policy;
use crate::load_balancer::priority::LoadIndex;
use crate::load_balancer::registry::ServerRegistry;
use crate::load_balancer::rotation::RotationSequence;
use crate::load_balancer::server::{HealthState, Server, ServerId, ServerSpec};
use crate::load_balancer::topology::Topology;
use crate::observability::{metrics, EventLog};

/// Whether the selected server took the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Admission {
    Accepted,
    /// The server was at capacity.
    Rejected,
}

/// Result of routing one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assignment {
    pub server: ServerId,
    pub policy: Policy,
    pub admission: Admission,
    /// Load after admission.
    pub load: u32,
    pub capacity: u32,
}

impl Assignment {
    pub fn is_accepted(&self) -> bool {
        self.admission == Admission::Accepted
    }
}

/// Point-in-time view of one server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerStatus {
    pub id: ServerId,
    pub load: u32,
    pub capacity: u32,
    pub latency: u32,
    pub health: HealthState,
}

impl From<&Server> for ServerStatus {
    fn from(server: &Server) -> Self {
        Self {
            id: server.id(),
            load: server.load(),
            capacity: server.capacity(),
            latency: server.latency(),
            health: server.health(),
        }
    }
}

/// The routing core: registry plus the four policy indexes.
#[derive(Debug)]
pub struct Router {
    registry: ServerRegistry,
    load_index: LoadIndex,
    rotation: RotationSequence,
    affinity: AffinityIndex<String>,
    topology: Topology,
    events: EventLog,
    rng: StdRng,
    default_policy: Policy,
    wire_scale_up: bool,
    highest_id: u32,
}

impl Router {
    /// Router over `specs` with default routing settings.
    pub fn new(specs: &[ServerSpec]) -> RouterResult<Self> {
        Self::with_config(specs, &RoutingConfig::default())
    }

    /// Router over the pool described by `config`.
    ///
    /// The configuration is validated first, so configs built in code get the
    /// same checks as loaded files.
    pub fn from_config(config: &RouterConfig) -> RouterResult<Self> {
        validate_config(config).map_err(RouterError::InvalidConfig)?;
        let mut rng = seeded_rng(config.routing.seed);
        let specs = config.initial_specs(&mut rng);
        let mut router = Self::with_config(&specs, &config.routing)?;
        router.rng = rng;
        Ok(router)
    }

    pub fn with_config(specs: &[ServerSpec], routing: &RoutingConfig) -> RouterResult<Self> {
        let mut registry = ServerRegistry::new();
        let mut load_index = LoadIndex::new();
        let mut rotation = RotationSequence::new();
        let mut highest_id = 0;

        for spec in specs {
            let id = registry.add(spec)?;
            rotation.append(id);
            highest_id = highest_id.max(id.0);
        }
        for server in registry.iter() {
            load_index.push(server);
        }
        let topology = Topology::complete(registry.iter());

        tracing::info!(
            servers = registry.len(),
            default_policy = %routing.default_policy,
            "Router initialised"
        );
        metrics::record_pool_size(registry.len());

        Ok(Self {
            registry,
            load_index,
            rotation,
            affinity: AffinityIndex::new(),
            topology,
            events: EventLog::new(),
            rng: seeded_rng(routing.seed),
            default_policy: routing.default_policy,
            wire_scale_up: routing.wire_scale_up,
            highest_id,
        })
    }

    /// Route one request under `policy` and try to admit it.
    ///
    /// The chosen server is re-pushed into the priority index whether or not
    /// it accepted the request.
    pub fn route(&mut self, policy: Policy, session: Option<&str>) -> RouterResult<Assignment> {
        let id = self.select(policy, session)?;
        let server = self
            .registry
            .get_mut(id)
            .ok_or(RouterError::UnknownServer(id))?;

        let admission = if server.try_admit() {
            Admission::Accepted
        } else {
            Admission::Rejected
        };
        let assignment = Assignment {
            server: id,
            policy,
            admission,
            load: server.load(),
            capacity: server.capacity(),
        };

        match admission {
            Admission::Accepted => {
                tracing::info!(
                    server = %id,
                    load = assignment.load,
                    capacity = assignment.capacity,
                    policy = %policy,
                    "Request assigned"
                );
                self.events.record(format!(
                    "Request assigned to Server {}. Current load: {}/{}",
                    id, assignment.load, assignment.capacity
                ));
            }
            Admission::Rejected => {
                tracing::warn!(server = %id, policy = %policy, "Server at capacity, request rejected");
                self.events.record(format!(
                    "Server {} is overloaded. Request could not be assigned.",
                    id
                ));
            }
        }
        metrics::record_request(policy, assignment.is_accepted());
        metrics::record_server_load(server);

        self.load_index.push(server);
        Ok(assignment)
    }

    /// Route with the configured default policy.
    pub fn route_default(&mut self, session: Option<&str>) -> RouterResult<Assignment> {
        self.route(self.default_policy, session)
    }

    /// Pick a server without admitting anything.
    ///
    /// Least-loaded selection consumes a priority entry; `route` puts it back.
    fn select(&mut self, policy: Policy, session: Option<&str>) -> RouterResult<ServerId> {
        match policy {
            Policy::LeastLoaded => self.least_loaded(),
            Policy::RoundRobin => self.rotation.next(),
            Policy::SessionAffinity => {
                let session = session.ok_or(RouterError::MissingSessionId)?;
                self.sticky(session)
            }
            Policy::LatencyAware => {
                let start = self
                    .registry
                    .as_slice()
                    .choose(&mut self.rng)
                    .map(Server::id)
                    .ok_or(RouterError::EmptyPool)?;
                match self.nearest(start) {
                    Some(id) => Ok(id),
                    None => self.least_loaded(),
                }
            }
        }
    }

    /// Nearest active, non-saturated neighbour of `from`, falling back to
    /// least-loaded when the neighbourhood has none.
    ///
    /// A fallback pick is pushed back into the priority index, so calling
    /// this directly never drains it.
    pub fn latency_route(&mut self, from: ServerId) -> RouterResult<ServerId> {
        if let Some(id) = self.nearest(from) {
            return Ok(id);
        }
        let id = self.least_loaded()?;
        if let Some(server) = self.registry.get(id) {
            self.load_index.push(server);
        }
        Ok(id)
    }

    fn nearest(&self, from: ServerId) -> Option<ServerId> {
        let registry = &self.registry;
        let nearest = self.topology.nearest(from, |id| {
            registry
                .get(id)
                .is_some_and(|s| s.is_active() && !s.is_overloaded())
        });

        match nearest {
            Some((id, weight)) => {
                tracing::debug!(from = %from, server = %id, weight, "Nearest neighbour selected");
                Some(id)
            }
            None => {
                tracing::debug!(from = %from, "No eligible neighbour, falling back to least-loaded");
                None
            }
        }
    }

    fn least_loaded(&mut self) -> RouterResult<ServerId> {
        loop {
            let entry = self.load_index.pop_min()?;
            if self.registry.contains(entry.id) {
                return Ok(entry.id);
            }
        }
    }

    fn sticky(&mut self, session: &str) -> RouterResult<ServerId> {
        if let Some(id) = self.affinity.lookup(session) {
            if self.registry.contains(id) {
                return Ok(id);
            }
            tracing::debug!(session, server = %id, "Bound server was removed, rebinding");
        }

        let id = self.least_loaded()?;
        self.affinity.bind(session.to_string(), id);
        Ok(id)
    }

    /// Finish one request on `id`.
    ///
    /// Returns false when the server is unknown or idle; both are tolerated.
    pub fn release(&mut self, id: ServerId) -> bool {
        let Some(server) = self.registry.get_mut(id) else {
            tracing::debug!(server = %id, "Release for unknown server ignored");
            return false;
        };
        if !server.release() {
            tracing::debug!(server = %id, "Server has no requests to release");
            return false;
        }

        tracing::info!(server = %id, load = server.load(), capacity = server.capacity(), "Request released");
        self.events.record(format!(
            "Request removed from Server {}. Current load: {}/{}",
            id,
            server.load(),
            server.capacity()
        ));
        metrics::record_server_load(server);

        self.load_index.rebuild(self.registry.iter());
        true
    }

    /// Add servers to the registry, rotation and priority index.
    ///
    /// The batch is validated up front: on error nothing is added.
    pub fn scale_up(&mut self, specs: &[ServerSpec]) -> RouterResult<Vec<ServerId>> {
        let mut batch = HashSet::new();
        for spec in specs {
            if spec.capacity == 0 {
                return Err(RouterError::InvalidCapacity(spec.id));
            }
            if self.registry.contains(spec.id) || !batch.insert(spec.id) {
                return Err(RouterError::DuplicateServer(spec.id));
            }
        }

        let mut added = Vec::with_capacity(specs.len());
        for spec in specs {
            let id = self.registry.add(spec)?;
            self.rotation.append(id);
            self.highest_id = self.highest_id.max(id.0);

            if let Some(server) = self.registry.get(id) {
                self.load_index.push(server);
                if self.wire_scale_up {
                    let topology = &self.topology;
                    let peers: Vec<&Server> = self
                        .registry
                        .iter()
                        .filter(|s| s.id() != id && topology.contains(s.id()))
                        .collect();
                    self.topology.connect(server, peers);
                }
                metrics::record_server_health(server);
            }

            tracing::info!(server = %id, capacity = spec.capacity, latency = spec.latency, "Server added");
            self.events
                .record(format!("Server {} added to load balancer.", id));
            added.push(id);
        }

        metrics::record_pool_size(self.registry.len());
        Ok(added)
    }

    /// Remove servers from the registry, rotation and topology, then rebuild
    /// the priority index. Unknown ids are skipped.
    pub fn scale_down(&mut self, ids: &[ServerId]) -> Vec<ServerId> {
        let mut removed = Vec::new();
        for &id in ids {
            if self.registry.remove(id).is_none() {
                tracing::debug!(server = %id, "Scale-down for unknown server ignored");
                continue;
            }
            self.rotation.remove(id);
            self.topology.remove_node(id);

            tracing::info!(server = %id, "Server removed");
            self.events
                .record(format!("Server {} removed from load balancer.", id));
            removed.push(id);
        }

        if !removed.is_empty() {
            self.load_index.rebuild(self.registry.iter());
            metrics::record_pool_size(self.registry.len());
        }
        removed
    }

    /// Flip a server's health flag. Indexes are left untouched.
    pub fn set_health(&mut self, id: ServerId, active: bool) -> bool {
        if !self.registry.set_active(id, active) {
            tracing::debug!(server = %id, active, "Health change for unknown server ignored");
            return false;
        }

        if active {
            tracing::info!(server = %id, "Server recovered");
            self.events.record(format!("Server {} is back online.", id));
        } else {
            tracing::warn!(server = %id, "Server failed");
            self.events.record(format!("Server {} is down.", id));
        }
        if let Some(server) = self.registry.get(id) {
            metrics::record_server_health(server);
        }
        true
    }

    pub fn fail(&mut self, id: ServerId) -> bool {
        self.set_health(id, false)
    }

    pub fn recover(&mut self, id: ServerId) -> bool {
        self.set_health(id, true)
    }

    pub fn server(&self, id: ServerId) -> Option<&Server> {
        self.registry.get(id)
    }

    /// Servers in registration order.
    pub fn servers(&self) -> impl Iterator<Item = &Server> {
        self.registry.iter()
    }

    pub fn snapshot(&self) -> Vec<ServerStatus> {
        self.registry.iter().map(ServerStatus::from).collect()
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Server currently bound to `session`, possibly one already removed.
    pub fn binding(&self, session: &str) -> Option<ServerId> {
        self.affinity.lookup(session)
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Round-robin order, head first.
    pub fn rotation_order(&self) -> Vec<ServerId> {
        self.rotation.iter().collect()
    }

    /// Entries in the priority index, stale ones included.
    pub fn priority_entries(&self) -> usize {
        self.load_index.len()
    }

    pub fn default_policy(&self) -> Policy {
        self.default_policy
    }

    /// Id following the highest one ever registered.
    pub fn next_server_id(&self) -> RouterResult<ServerId> {
        self.highest_id
            .checked_add(1)
            .map(ServerId)
            .ok_or(RouterError::IdsExhausted)
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}
