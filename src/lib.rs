//! Load balancer routing core.
//!
//! Picks a backend server per request under one of four policies and keeps
//! the supporting indexes consistent as load, membership and health change.

pub mod config;
pub mod console;
pub mod load_balancer;
pub mod observability;

pub use config::RouterConfig;
pub use load_balancer::{
    Admission, Assignment, Policy, Router, RouterError, ServerId, ServerSpec, SharedRouter,
};
