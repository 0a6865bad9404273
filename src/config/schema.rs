//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the router.
//! All types derive Serde traits for deserialization from config files.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::load_balancer::policy::Policy;
use crate::load_balancer::server::{ServerId, ServerSpec};

/// Root configuration for the routing core.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RouterConfig {
    /// Backend pool definition.
    pub pool: PoolConfig,

    /// Policy and topology settings.
    pub routing: RoutingConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl RouterConfig {
    /// Server specs the router starts with.
    ///
    /// Explicit `pool.servers` win; otherwise `pool.initial_servers` servers are
    /// generated with ids `1..=n` and a random latency.
    pub fn initial_specs<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<ServerSpec> {
        if !self.pool.servers.is_empty() {
            return self
                .pool
                .servers
                .iter()
                .map(|s| ServerSpec::new(s.id, s.capacity, s.latency))
                .collect();
        }

        (1..=self.pool.initial_servers)
            .map(|id| {
                ServerSpec::generate(
                    ServerId(id),
                    self.pool.default_capacity,
                    self.pool.latency_range(),
                    rng,
                )
            })
            .collect()
    }
}

/// Backend pool configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Number of generated servers when `servers` is empty.
    pub initial_servers: u32,

    /// Capacity given to generated servers.
    pub default_capacity: u32,

    /// Lower bound (inclusive) of generated latencies.
    pub latency_min: u32,

    /// Upper bound (inclusive) of generated latencies.
    pub latency_max: u32,

    /// Explicit server definitions.
    pub servers: Vec<ServerConfig>,
}

impl PoolConfig {
    pub fn latency_range(&self) -> std::ops::RangeInclusive<u32> {
        self.latency_min..=self.latency_max
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            initial_servers: 3,
            default_capacity: 5,
            latency_min: 5,
            latency_max: 20,
            servers: Vec::new(),
        }
    }
}

/// A single backend server definition.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Unique server identifier.
    pub id: ServerId,

    /// Maximum concurrent requests (default: 5).
    #[serde(default = "default_capacity")]
    pub capacity: u32,

    /// Path cost used as the topology edge weight (default: 10).
    #[serde(default = "default_latency")]
    pub latency: u32,
}

fn default_capacity() -> u32 {
    5
}

fn default_latency() -> u32 {
    10
}

/// Routing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Policy used when a caller does not name one.
    pub default_policy: Policy,

    /// Seed for the router RNG. Random when unset.
    pub seed: Option<u64>,

    /// Connect scaled-up servers into the topology graph.
    pub wire_scale_up: bool,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            default_policy: Policy::LeastLoaded,
            seed: None,
            wire_scale_up: true,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
