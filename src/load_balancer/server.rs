//! Server abstraction.
//!
//! # Responsibilities
//! - Represent a single backend server
//! - Track current load against a fixed capacity
//! - Track health state (Active/Inactive)

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;

/// Server identifier for strong typing.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ServerId(pub u32);

impl From<u32> for ServerId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<ServerId> for u32 {
    fn from(id: ServerId) -> Self {
        id.0
    }
}

impl fmt::Display for ServerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Health state of a server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Active,
    Inactive,
}

/// Parameters for creating a server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSpec {
    pub id: ServerId,
    pub capacity: u32,
    pub latency: u32,
}

impl ServerSpec {
    pub fn new(id: ServerId, capacity: u32, latency: u32) -> Self {
        Self {
            id,
            capacity,
            latency,
        }
    }

    /// Server parameters with a latency drawn uniformly from `latency`.
    /// An empty range yields its start.
    pub fn generate<R: Rng + ?Sized>(
        id: ServerId,
        capacity: u32,
        latency: RangeInclusive<u32>,
        rng: &mut R,
    ) -> Self {
        let latency = if latency.is_empty() {
            *latency.start()
        } else {
            rng.gen_range(latency)
        };
        Self::new(id, capacity, latency)
    }
}

/// A single backend server.
///
/// Invariant: `0 <= load <= capacity`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Server {
    id: ServerId,
    load: u32,
    capacity: u32,
    latency: u32,
    health: HealthState,
}

impl Server {
    /// Create an idle, active server. `capacity` must be positive.
    pub fn new(spec: &ServerSpec) -> Self {
        Self {
            id: spec.id,
            load: 0,
            capacity: spec.capacity,
            latency: spec.latency,
            health: HealthState::Active,
        }
    }

    pub fn id(&self) -> ServerId {
        self.id
    }

    /// Current number of admitted requests.
    pub fn load(&self) -> u32 {
        self.load
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn latency(&self) -> u32 {
        self.latency
    }

    pub fn health(&self) -> HealthState {
        self.health
    }

    pub fn is_active(&self) -> bool {
        self.health == HealthState::Active
    }

    /// True when no further request can be admitted.
    pub fn is_overloaded(&self) -> bool {
        self.load >= self.capacity
    }

    /// Admit one request if below capacity.
    pub fn try_admit(&mut self) -> bool {
        if self.load < self.capacity {
            self.load += 1;
            true
        } else {
            false
        }
    }

    /// Release one request. Returns false when the server was idle.
    pub fn release(&mut self) -> bool {
        if self.load > 0 {
            self.load -= 1;
            true
        } else {
            false
        }
    }

    pub fn set_active(&mut self, active: bool) {
        self.health = if active {
            HealthState::Active
        } else {
            HealthState::Inactive
        };
    }
}
