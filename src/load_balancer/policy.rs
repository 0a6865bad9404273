//! Routing policies.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Strategy used to pick a server for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Policy {
    #[serde(alias = "least")]
    LeastLoaded,
    #[serde(alias = "round_robin")]
    RoundRobin,
    #[serde(alias = "hash")]
    SessionAffinity,
    #[serde(alias = "latency")]
    LatencyAware,
}

impl Policy {
    pub const ALL: [Policy; 4] = [
        Policy::LeastLoaded,
        Policy::RoundRobin,
        Policy::SessionAffinity,
        Policy::LatencyAware,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Policy::LeastLoaded => "least-loaded",
            Policy::RoundRobin => "round-robin",
            Policy::SessionAffinity => "session-affinity",
            Policy::LatencyAware => "latency-aware",
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognised policy name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown routing policy '{0}' (expected least, round_robin, hash or latency)")]
pub struct UnknownPolicy(pub String);

impl FromStr for Policy {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "least" | "least-loaded" | "least_loaded" => Ok(Policy::LeastLoaded),
            "round_robin" | "round-robin" | "rr" => Ok(Policy::RoundRobin),
            "hash" | "session-affinity" | "session_affinity" | "affinity" => {
                Ok(Policy::SessionAffinity)
            }
            "latency" | "latency-aware" | "latency_aware" => Ok(Policy::LatencyAware),
            _ => Err(UnknownPolicy(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_menu_names() {
        assert_eq!("least".parse::<Policy>().unwrap(), Policy::LeastLoaded);
        assert_eq!("Round_Robin".parse::<Policy>().unwrap(), Policy::RoundRobin);
        assert_eq!("hash".parse::<Policy>().unwrap(), Policy::SessionAffinity);
        assert_eq!(" latency ".parse::<Policy>().unwrap(), Policy::LatencyAware);
        assert!("random".parse::<Policy>().is_err());
    }

    #[test]
    fn test_display_round_trips() {
        for policy in Policy::ALL {
            assert_eq!(policy.to_string().parse::<Policy>().unwrap(), policy);
        }
    }
}
