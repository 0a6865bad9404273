//! Shared helpers for integration tests.

use load_router::config::RoutingConfig;
use load_router::{Router, ServerId, ServerSpec};

/// `n` servers with ids `1..=n`, equal capacity and latency 10.
pub fn uniform_pool(n: u32, capacity: u32) -> Vec<ServerSpec> {
    (1..=n)
        .map(|id| ServerSpec::new(ServerId(id), capacity, 10))
        .collect()
}

/// Servers with ids `1..` and the given `(capacity, latency)` pairs.
#[allow(dead_code)]
pub fn pool_with(params: &[(u32, u32)]) -> Vec<ServerSpec> {
    params
        .iter()
        .zip(1..)
        .map(|(&(capacity, latency), id)| ServerSpec::new(ServerId(id), capacity, latency))
        .collect()
}

/// Router with a fixed seed so latency-aware starts are reproducible.
pub fn seeded_router(specs: &[ServerSpec], seed: u64) -> Router {
    let routing = RoutingConfig {
        seed: Some(seed),
        ..RoutingConfig::default()
    };
    Router::with_config(specs, &routing).unwrap()
}

#[allow(dead_code)]
pub fn loads(router: &Router) -> Vec<u32> {
    router.servers().map(|s| s.load()).collect()
}
