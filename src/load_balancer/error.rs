//! Error definitions for the routing core.

use thiserror::Error;

use crate::config::validation::ValidationError;
use crate::load_balancer::server::ServerId;

/// Errors that can occur during routing or pool mutation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouterError {
    /// The load-priority index has no entries.
    #[error("priority index is empty")]
    EmptyIndex,

    /// The rotation sequence has no servers.
    #[error("rotation sequence is empty")]
    EmptySequence,

    /// Latency-aware routing needs at least one server to start from.
    #[error("server pool is empty")]
    EmptyPool,

    /// Session-affinity routing was requested without a session id.
    #[error("session-affinity routing requires a session id")]
    MissingSessionId,

    /// A selected server is no longer registered.
    #[error("server {0} is not registered")]
    UnknownServer(ServerId),

    /// A server with this id is already registered.
    #[error("server {0} already exists")]
    DuplicateServer(ServerId),

    /// Server capacity must be positive.
    #[error("server {0} must have a capacity greater than 0")]
    InvalidCapacity(ServerId),

    /// Every server id up to `u32::MAX` has been handed out.
    #[error("no server ids left to allocate")]
    IdsExhausted,

    /// The pool configuration failed validation.
    #[error("invalid configuration: {}", join_errors(.0))]
    InvalidConfig(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type for routing operations.
pub type RouterResult<T> = Result<T, RouterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(RouterError::EmptyIndex.to_string(), "priority index is empty");
        assert_eq!(
            RouterError::DuplicateServer(ServerId(3)).to_string(),
            "server 3 already exists"
        );
        assert_eq!(
            RouterError::InvalidConfig(vec![
                ValidationError::ZeroDefaultCapacity,
                ValidationError::LatencyRange { min: 9, max: 1 },
            ])
            .to_string(),
            "invalid configuration: pool.default_capacity must be greater than 0; \
             latency range is empty: min 9 > max 1"
        );
    }
}
