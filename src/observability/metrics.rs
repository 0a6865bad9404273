//! Metrics collection.
//!
//! # Metrics
//! - `router_requests_total` (counter): routed requests by policy, outcome
//! - `router_server_load` (gauge): current load per server
//! - `router_server_active` (gauge): 1=active, 0=inactive
//! - `router_pool_size` (gauge): registered servers
//!
//! # Design Decisions
//! - Recorded through the `metrics` facade; no-op until the embedding
//!   application installs a recorder

use metrics::{counter, gauge};

use crate::load_balancer::policy::Policy;
use crate::load_balancer::server::Server;

/// Record one routing decision.
pub fn record_request(policy: Policy, accepted: bool) {
    let outcome = if accepted { "accepted" } else { "rejected" };
    counter!("router_requests_total", "policy" => policy.as_str(), "outcome" => outcome)
        .increment(1);
}

/// Record a server's current load.
pub fn record_server_load(server: &Server) {
    gauge!("router_server_load", "server" => server.id().to_string()).set(server.load() as f64);
}

/// Record a server's health flag.
pub fn record_server_health(server: &Server) {
    let value = if server.is_active() { 1.0 } else { 0.0 };
    gauge!("router_server_active", "server" => server.id().to_string()).set(value);
}

/// Record the number of registered servers.
pub fn record_pool_size(size: usize) {
    gauge!("router_pool_size").set(size as f64);
}
