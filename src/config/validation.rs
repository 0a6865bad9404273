//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (capacities > 0, latency bounds ordered)
//! - Detect duplicate server ids
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RouterConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use thiserror::Error;

use crate::config::schema::RouterConfig;
use crate::load_balancer::server::ServerId;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("pool.default_capacity must be greater than 0")]
    ZeroDefaultCapacity,

    #[error("server {0} has capacity 0")]
    ZeroCapacity(ServerId),

    #[error("server id {0} is defined more than once")]
    DuplicateServer(ServerId),

    #[error("latency range is empty: min {min} > max {max}")]
    LatencyRange { min: u32, max: u32 },
}

/// Check a parsed configuration.
pub fn validate_config(config: &RouterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let pool = &config.pool;

    if pool.default_capacity == 0 {
        errors.push(ValidationError::ZeroDefaultCapacity);
    }

    if pool.latency_min > pool.latency_max {
        errors.push(ValidationError::LatencyRange {
            min: pool.latency_min,
            max: pool.latency_max,
        });
    }

    let mut seen = HashSet::new();
    for server in &pool.servers {
        if server.capacity == 0 {
            errors.push(ValidationError::ZeroCapacity(server.id));
        }
        if !seen.insert(server.id) {
            errors.push(ValidationError::DuplicateServer(server.id));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
